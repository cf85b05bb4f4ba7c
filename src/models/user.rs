use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{StringValidator, ValidationError};

/// 用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// 校验后返回规范化的 (name, email)
    pub fn validated(&self) -> Result<(String, String), ValidationError> {
        StringValidator::validate_name(&self.name)?;
        StringValidator::validate_email(&self.email)?;
        StringValidator::validate_password(&self.password)?;
        Ok((
            self.name.trim().to_string(),
            normalize_email(&self.email),
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// 注册/登录结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// 邮箱按小写存储和比较
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_hash() {
        let user = User::new("Ana".into(), "ana@example.com".into(), "$argon2id$secret".into());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret"));
        assert_eq!(json["email"], "ana@example.com");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: " Ana ".into(),
            email: " Ana@Example.com ".into(),
            password: "secret1".into(),
        };
        assert_eq!(
            ok.validated().unwrap(),
            ("Ana".to_string(), "ana@example.com".to_string())
        );

        let weak = RegisterRequest {
            password: "123".into(),
            ..ok.clone()
        };
        assert_eq!(weak.validated(), Err(ValidationError::WeakPassword(6)));

        let no_name = RegisterRequest {
            name: "  ".into(),
            ..ok
        };
        assert_eq!(no_name.validated(), Err(ValidationError::EmptyName));
    }
}
