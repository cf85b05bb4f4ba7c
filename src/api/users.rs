use axum::{
    extract::{Path, State},
    Json,
};

use super::error::ApiResult;
use super::AppState;
use crate::models::User;

/// 公开的用户信息（不含密码哈希）
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth_service.find_user(&id).await?))
}
