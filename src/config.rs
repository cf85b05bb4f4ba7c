// 应用配置
//
// 启动时从环境变量（可由 .env 提供）一次性读取，之后以只读方式共享。

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::PathBuf;

/// 上传文件的存储后端
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Local,
    Gcs {
        bucket: String,
        access_token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// starttls / tls / none
    pub encryption: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub storage_backend: StorageBackend,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    /// 详情接口是否仅对创建者开放
    pub owner_gated_reads: bool,
    pub enable_seed: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，未设置或为空的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str, default: bool| {
            get(key)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(default)
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = get("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000);

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using a random secret, tokens will not survive a restart");
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(48)
                .map(char::from)
                .collect()
        });

        let storage_backend = match get("STORAGE_BACKEND").as_deref() {
            Some("gcs") => match get("GCS_BUCKET_NAME") {
                Some(bucket) => StorageBackend::Gcs {
                    bucket,
                    access_token: get("GCS_ACCESS_TOKEN"),
                },
                None => {
                    tracing::warn!("STORAGE_BACKEND=gcs but GCS_BUCKET_NAME is not set; using local storage");
                    StorageBackend::Local
                }
            },
            _ => StorageBackend::Local,
        };

        let smtp = get("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: get("SMTP_PORT").and_then(|p| p.parse().ok()).unwrap_or(587),
            username: get("SMTP_USERNAME"),
            password: get("SMTP_PASSWORD"),
            encryption: get("SMTP_ENCRYPTION").unwrap_or_else(|| "starttls".to_string()),
        });

        Self {
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            host,
            port,
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./movies.db?mode=rwc".to_string()),
            jwt_secret,
            jwt_ttl_hours: get("JWT_TTL_HOURS").and_then(|h| h.parse().ok()).unwrap_or(24),
            storage_backend,
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            smtp,
            mail_from: get("MAIL_FROM")
                .unwrap_or_else(|| "Movies App <no-reply@moviesapp.com>".to_string()),
            owner_gated_reads: flag("OWNER_GATED_READS", false),
            enable_seed: flag("ENABLE_SEED", true),
        }
    }
}
