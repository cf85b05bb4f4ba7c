pub mod mail;
pub mod storage;

use std::sync::Arc;

pub use mail::{LogMailer, Mailer, SmtpMailer};
pub use storage::{
    GcsObjectStorage, LocalObjectStorage, ObjectStorage, StorageError, UploadedImage,
};

use crate::config::{AppConfig, StorageBackend};

/// 按配置创建对象存储后端
pub fn storage_from_config(config: &AppConfig) -> Arc<dyn ObjectStorage> {
    match config.storage_backend {
        StorageBackend::Gcs { ref bucket, ref access_token } => {
            tracing::info!("Using GCS bucket '{}' for uploads", bucket);
            Arc::new(GcsObjectStorage::new(bucket.clone(), access_token.clone()))
        }
        StorageBackend::Local => {
            tracing::info!("Storing uploads under {}", config.upload_dir.display());
            Arc::new(LocalObjectStorage::new(
                config.upload_dir.clone(),
                &config.public_base_url,
            ))
        }
    }
}

/// 按配置创建邮件发送器；SMTP 配置无效时退回日志模式
pub fn mailer_from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    let Some(ref smtp) = config.smtp else {
        tracing::warn!("SMTP_HOST not set; recovery mails will only be logged");
        return Arc::new(LogMailer);
    };

    match SmtpMailer::new(
        &smtp.host,
        smtp.port,
        smtp.username.as_deref(),
        smtp.password.as_deref(),
        &smtp.encryption,
        config.mail_from.clone(),
    ) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            tracing::error!("Invalid SMTP configuration, falling back to log mailer: {:#}", e);
            Arc::new(LogMailer)
        }
    }
}
