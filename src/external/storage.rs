// 对象存储
//
// 上传的封面/背景图先校验格式和大小，再交给存储后端保存，返回可公开访问的 URL。
// - GcsObjectStorage: Google Cloud Storage JSON API
// - LocalObjectStorage: 本地目录，配合 /uploads 静态路由

use async_trait::async_trait;
use image::ImageFormat;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

/// 单张图片上限
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex =
        Regex::new(r"[^A-Za-z0-9._-]+").expect("file name pattern is valid");
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Uploaded file '{0}' is empty")]
    Empty(String),

    #[error("Uploaded file '{name}' is too large ({size} bytes, max {max})")]
    TooLarge { name: String, size: usize, max: usize },

    #[error("Unsupported image format for '{0}' (expected PNG, JPEG, GIF or WebP)")]
    UnsupportedFormat(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StorageError {
    /// 由上传内容本身引起的错误（而非存储后端故障）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StorageError::Empty(_) | StorageError::TooLarge { .. } | StorageError::UnsupportedFormat(_)
        )
    }
}

/// 表单中上传的图片
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 对象存储接口
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// 保存对象并返回公开 URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}

/// 校验图片内容，返回 MIME 类型
pub fn validate_image(name: &str, bytes: &[u8]) -> Result<&'static str, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::Empty(name.to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge {
            name: name.to_string(),
            size: bytes.len(),
            max: MAX_IMAGE_BYTES,
        });
    }

    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(ImageFormat::Gif) => Ok("image/gif"),
        Ok(ImageFormat::WebP) => Ok("image/webp"),
        _ => Err(StorageError::UnsupportedFormat(name.to_string())),
    }
}

/// 生成对象键：`{uuid}-{安全文件名}`
pub fn object_key(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let sanitized = UNSAFE_NAME_CHARS.replace_all(base, "_");
    let sanitized = sanitized.trim_matches(|c: char| c == '.' || c == '_');
    let sanitized: String = sanitized.chars().take(100).collect();
    let name = if sanitized.is_empty() { "image".to_string() } else { sanitized };

    format!("{}-{}", uuid::Uuid::new_v4(), name)
}

/// 校验并上传一张图片
pub async fn upload_image(
    storage: &dyn ObjectStorage,
    image: UploadedImage,
) -> Result<String, StorageError> {
    let content_type = validate_image(&image.file_name, &image.bytes)?;
    let key = object_key(&image.file_name);
    let size = image.bytes.len();

    let url = storage.put(&key, image.bytes, content_type).await?;
    tracing::info!("Uploaded {} ({} bytes, {}) -> {}", image.file_name, size, content_type, url);
    Ok(url)
}

/// Google Cloud Storage 后端
pub struct GcsObjectStorage {
    client: reqwest::Client,
    bucket: String,
    access_token: Option<String>,
}

impl GcsObjectStorage {
    pub fn new(bucket: String, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket,
            access_token,
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStorage for GcsObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            urlencoding::encode(key)
        );

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(ref token) = self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("GCS upload of {} failed: {} {}", key, status, body);
            return Err(StorageError::Upload(format!("GCS returned {}", status)));
        }

        Ok(self.public_url(key))
    }
}

/// 本地目录后端
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(key);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Stored upload at {}", path.display());

        Ok(format!("{}/uploads/{}", self.public_base_url, key))
    }
}
