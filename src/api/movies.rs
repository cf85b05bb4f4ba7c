use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::{AuthUser, MaybeAuthUser};
use super::error::{ApiError, ApiResult};
use super::movie_form::MovieForm;
use super::response::ApiResponse;
use super::AppState;
use crate::models::{FilterOptions, ListQuery, Movie, MoviePage};

const DEFAULT_SEED_COUNT: usize = 20;

/// 电影列表（筛选、排序、分页）
///
/// 参数格式错误时返回 400，不执行查询。
pub async fn list_movies(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<MoviePage>> {
    let params = ListQuery::from_query_str(query.as_deref().unwrap_or_default()).into_params()?;
    let page = state.movie_service.find_all(&params).await?;
    Ok(Json(page))
}

/// 目录中出现过的类型和分级
pub async fn get_filter_options(
    State(state): State<AppState>,
) -> ApiResult<Json<FilterOptions>> {
    Ok(Json(state.movie_service.filter_options().await?))
}

/// 电影详情
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> ApiResult<Json<Movie>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let movie = state.movie_service.find_one(&id, viewer_id).await?;
    Ok(Json(movie))
}

/// 创建电影
pub async fn create_movie(
    State(state): State<AppState>,
    user: AuthUser,
    form: MovieForm,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    let movie = state
        .movie_service
        .create(&user.id, form.input, form.images)
        .await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// 更新电影（仅创建者）
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    form: MovieForm,
) -> ApiResult<Json<Movie>> {
    let movie = state
        .movie_service
        .update(&id, &user.id, form.input, form.images)
        .await?;
    Ok(Json(movie))
}

/// 删除电影（仅创建者）
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    state.movie_service.remove(&id, &user.id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Movie deleted",
        "id": id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SeedQuery {
    pub count: Option<usize>,
}

/// 生成演示数据；已登录时归属于调用者
pub async fn seed_movies(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> ApiResult<impl IntoResponse> {
    if !state.config.enable_seed {
        return Err(ApiError::NotFound("Seeding is disabled".to_string()));
    }

    let count = query.count.unwrap_or(DEFAULT_SEED_COUNT);
    let inserted = state.movie_service.seed(count, user.map(|u| u.id)).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            json!({ "inserted": inserted }),
            format!("Seeded {} movies", inserted),
        ),
    ))
}
