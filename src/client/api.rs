use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{encode_query, FilterCriteria, Movie, MovieInput, MoviePage};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// 电影目录远程接口
///
/// store 只依赖这个 trait，测试中可以替换成内存实现。
#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn list(&self, criteria: &FilterCriteria) -> ClientResult<MoviePage>;

    async fn create(&self, input: &MovieInput, token: &str) -> ClientResult<Movie>;

    async fn update(&self, id: &str, input: &MovieInput, token: &str) -> ClientResult<Movie>;

    async fn delete(&self, id: &str, token: &str) -> ClientResult<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// 基于 reqwest 的实现
#[derive(Clone)]
pub struct HttpMovieApi {
    client: Client,
    base_url: String,
}

impl HttpMovieApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn movies_url(&self) -> String {
        format!("{}/movies", self.base_url)
    }

    /// 列表请求的完整 URL
    pub fn list_url(&self, criteria: &FilterCriteria) -> String {
        format!("{}?{}", self.movies_url(), encode_query(&criteria.to_query_pairs()))
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MovieApi for HttpMovieApi {
    async fn list(&self, criteria: &FilterCriteria) -> ClientResult<MoviePage> {
        let response = self.client.get(self.list_url(criteria)).send().await?;
        let page = Self::check(response).await?.json().await?;
        Ok(page)
    }

    async fn create(&self, input: &MovieInput, token: &str) -> ClientResult<Movie> {
        let response = self
            .client
            .post(self.movies_url())
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update(&self, id: &str, input: &MovieInput, token: &str) -> ClientResult<Movie> {
        let url = format!("{}/{}", self.movies_url(), urlencoding::encode(id));
        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete(&self, id: &str, token: &str) -> ClientResult<()> {
        let url = format!("{}/{}", self.movies_url(), urlencoding::encode(id));
        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
