// 电影表单提取器
//
// 创建/更新接口同时接受 JSON 和 multipart/form-data。
// multipart 中 `capaFile`、`capaFundoFile` 为图片，其余为文本字段，
// `generos` 可以重复出现、用逗号分隔，或是一个 JSON 数组。

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};

use super::error::ApiError;
use crate::external::storage::UploadedImage;
use crate::models::{MovieInput, NumericInput};
use crate::services::MovieImages;

#[derive(Debug, Clone, Default)]
pub struct MovieForm {
    pub input: MovieInput,
    pub images: MovieImages,
}

#[async_trait]
impl<S> FromRequest<S> for MovieForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            parse_multipart(multipart).await
        } else {
            let Json(input) = Json::<MovieInput>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(MovieForm {
                input,
                images: MovieImages::default(),
            })
        }
    }
}

async fn parse_multipart(mut multipart: Multipart) -> Result<MovieForm, ApiError> {
    let mut form = MovieForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "capaFile" || name == "capaFundoFile" {
            let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;
            // 浏览器未选择文件时也会提交空的文件字段
            if bytes.is_empty() {
                continue;
            }
            let image = Some(UploadedImage {
                file_name,
                bytes: bytes.to_vec(),
            });
            if name == "capaFile" {
                form.images.cover = image;
            } else {
                form.images.backdrop = image;
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;
        apply_text_field(&mut form.input, &name, value);
    }

    Ok(form)
}

/// 必填字段为空时视为未提交，其余字段为空表示清除
fn apply_text_field(input: &mut MovieInput, name: &str, value: String) {
    let required_blank = value.trim().is_empty();
    match name {
        "titulo" if !required_blank => input.title = Some(value),
        "dataLancamento" if !required_blank => input.release_date = Some(value),
        "duracao" if !required_blank => input.duration = Some(NumericInput::Text(value)),
        "classificacaoIndicativa" if !required_blank => input.age_rating = Some(value),
        "titulo" | "dataLancamento" | "duracao" | "classificacaoIndicativa" => {}
        "tituloOriginal" => input.original_title = Some(value),
        "subtitulo" => input.tagline = Some(value),
        "sinopse" => input.synopsis = Some(value),
        "generos" | "generos[]" => {
            input.genres.get_or_insert_with(Vec::new).extend(parse_genres(&value));
        }
        "popularidade" => input.popularity = Some(NumericInput::Text(value)),
        "votos" => input.vote_count = Some(NumericInput::Text(value)),
        "idioma" => input.language = Some(value),
        "orcamento" => input.budget = Some(NumericInput::Text(value)),
        "receita" => input.revenue = Some(NumericInput::Text(value)),
        "lucro" => input.profit = Some(NumericInput::Text(value)),
        "capaUrl" => input.cover_url = Some(value),
        "capaFundo" => input.backdrop_url = Some(value),
        "trailerUrl" => input.trailer_url = Some(value),
        other => tracing::debug!("Ignoring unknown form field '{}'", other),
    }
}

fn parse_genres(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    trimmed
        .split(',')
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}
