use std::sync::Arc;
use sqlx::SqlitePool;

use super::error::{ServiceError, ServiceResult};
use super::jwt::{Claims, JwtManager};
use super::password::{temporary_password, PasswordHasher};
use crate::database::user_repository;
use crate::external::mail::Mailer;
use crate::models::user::normalize_email;
use crate::models::{AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, User};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// 注册、登录、找回密码
pub struct AuthService {
    pool: SqlitePool,
    jwt: JwtManager,
    hasher: PasswordHasher,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(pool: SqlitePool, jwt: JwtManager, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            jwt,
            hasher: PasswordHasher::new(),
            mailer,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        let (name, email) = request.validated()?;

        if user_repository::get_user_by_email(&self.pool, &email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".into()));
        }

        let password_hash = self.hasher.hash_password(&request.password)?;
        let user = User::new(name, email, password_hash);

        if let Err(e) = user_repository::insert_user(&self.pool, &user).await {
            return match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    Err(ServiceError::Conflict("Email already registered".into()))
                }
                other => Err(other.into()),
            };
        }

        tracing::info!("User registered: {}", user.id);
        let token = self.jwt.issue(&user)?;
        Ok(AuthResponse { user, token })
    }

    /// 邮箱不存在和密码错误返回同一提示
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = user_repository::get_user_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        if !self.hasher.verify_password(&request.password, &user.password_hash)? {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let token = self.jwt.issue(&user)?;
        Ok(AuthResponse { user, token })
    }

    /// 生成临时密码并通过邮件发送
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult<()> {
        let email = normalize_email(&request.email);
        let user = user_repository::get_user_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Email not found".into()))?;

        let temp_password = temporary_password();
        let password_hash = self.hasher.hash_password(&temp_password)?;

        let body = format!(
            "Olá {},\n\nSua senha temporária é: {}\n\nUse esta senha para entrar e depois troque sua senha.",
            user.name, temp_password
        );

        // 邮件发送成功后才替换密码，投递失败时旧密码仍然有效
        self.mailer
            .send(&user.email, "Recuperação de senha - Movies App", &body)
            .await
            .map_err(|e| {
                tracing::error!("Failed to send recovery mail to {}: {:#}", user.email, e);
                ServiceError::Mail(e.to_string())
            })?;

        user_repository::update_password_hash(&self.pool, &user.id, &password_hash).await?;
        tracing::info!("Temporary password issued for user {}", user.id);
        Ok(())
    }

    pub fn verify_token(&self, token: &str) -> ServiceResult<Claims> {
        Ok(self.jwt.verify(token)?)
    }

    pub async fn find_user(&self, id: &str) -> ServiceResult<User> {
        user_repository::get_user_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".into()))
    }
}
