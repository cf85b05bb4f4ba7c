use std::sync::Arc;
use sqlx::SqlitePool;

use super::error::{ServiceError, ServiceResult};
use crate::database::{user_repository, MovieRepository};
use crate::external::storage::{upload_image, ObjectStorage, UploadedImage};
use crate::models::{FilterOptions, FindAllParams, Movie, MovieFactory, MovieInput, MoviePage};

/// 单次生成演示数据的上限
pub const MAX_SEED_COUNT: usize = 500;

/// 请求中附带的图片
#[derive(Debug, Clone, Default)]
pub struct MovieImages {
    /// `capaFile`
    pub cover: Option<UploadedImage>,
    /// `capaFundoFile`
    pub backdrop: Option<UploadedImage>,
}

impl MovieImages {
    pub fn is_empty(&self) -> bool {
        self.cover.is_none() && self.backdrop.is_none()
    }
}

/// 电影服务层，封装业务逻辑与所有权校验
pub struct MovieService {
    repository: Arc<dyn MovieRepository>,
    pool: SqlitePool,
    storage: Arc<dyn ObjectStorage>,
    owner_gated_reads: bool,
}

impl MovieService {
    pub fn new(
        repository: Arc<dyn MovieRepository>,
        pool: SqlitePool,
        storage: Arc<dyn ObjectStorage>,
        owner_gated_reads: bool,
    ) -> Self {
        Self {
            repository,
            pool,
            storage,
            owner_gated_reads,
        }
    }

    /// 分页查询
    pub async fn find_all(&self, params: &FindAllParams) -> ServiceResult<MoviePage> {
        let (movies, total) = self.repository.find_all(params).await?;
        tracing::debug!(
            "Listed {} of {} movies (skip {}, take {})",
            movies.len(),
            total,
            params.criteria.skip,
            params.criteria.take
        );
        Ok(MoviePage { movies, total })
    }

    pub async fn filter_options(&self) -> ServiceResult<FilterOptions> {
        Ok(self.repository.filter_options().await?)
    }

    /// 获取电影详情；开启 `owner_gated_reads` 时仅创建者可见
    pub async fn find_one(&self, id: &str, viewer: Option<&str>) -> ServiceResult<Movie> {
        let movie = self.get_movie(id).await?;

        if self.owner_gated_reads {
            match viewer {
                None => return Err(ServiceError::Unauthorized("Authentication required".into())),
                Some(user_id) if !movie.is_owned_by(user_id) => {
                    return Err(ServiceError::Forbidden(
                        "You do not have permission to access this movie".into(),
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(movie)
    }

    /// 创建电影
    pub async fn create(
        &self,
        user_id: &str,
        input: MovieInput,
        images: MovieImages,
    ) -> ServiceResult<Movie> {
        if !user_repository::user_exists(&self.pool, user_id).await? {
            return Err(ServiceError::BadRequest("User not found".into()));
        }

        // 先校验字段，避免无效请求留下孤立的上传文件
        let mut movie = Movie::from_input(input, Some(user_id.to_string()))?;
        self.attach_images(&mut movie, images).await?;

        self.repository.insert(&movie).await?;
        tracing::info!("Movie created: {} ({}) by {}", movie.title, movie.id, user_id);
        Ok(movie)
    }

    /// 部分更新，仅创建者可操作
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: MovieInput,
        images: MovieImages,
    ) -> ServiceResult<Movie> {
        let mut movie = self.get_owned_movie(id, user_id).await?;

        movie.apply_input(input)?;
        self.attach_images(&mut movie, images).await?;

        self.repository.update(&movie).await?;
        tracing::info!("Movie updated: {} ({})", movie.title, movie.id);
        Ok(movie)
    }

    /// 删除，仅创建者可操作
    pub async fn remove(&self, id: &str, user_id: &str) -> ServiceResult<()> {
        self.get_owned_movie(id, user_id).await?;

        if !self.repository.delete(id).await? {
            return Err(ServiceError::NotFound("Movie not found".into()));
        }

        tracing::info!("Movie deleted: {}", id);
        Ok(())
    }

    /// 批量生成演示数据
    pub async fn seed(&self, count: usize, owner: Option<String>) -> ServiceResult<usize> {
        if count == 0 || count > MAX_SEED_COUNT {
            return Err(ServiceError::BadRequest(format!(
                "count must be between 1 and {}",
                MAX_SEED_COUNT
            )));
        }

        let movies = MovieFactory::random_batch(count, owner)?;
        self.repository.insert_many(&movies).await?;

        tracing::info!("Seeded {} movies", movies.len());
        Ok(movies.len())
    }

    async fn get_movie(&self, id: &str) -> ServiceResult<Movie> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Movie not found".into()))
    }

    async fn get_owned_movie(&self, id: &str, user_id: &str) -> ServiceResult<Movie> {
        let movie = self.get_movie(id).await?;
        if !movie.is_owned_by(user_id) {
            tracing::warn!("User {} attempted to modify movie {} owned by {:?}", user_id, id, movie.created_by);
            return Err(ServiceError::Forbidden(
                "You do not have permission to access this movie".into(),
            ));
        }
        Ok(movie)
    }

    async fn attach_images(&self, movie: &mut Movie, images: MovieImages) -> ServiceResult<()> {
        if let Some(cover) = images.cover {
            movie.cover_url = Some(upload_image(self.storage.as_ref(), cover).await?);
        }
        if let Some(backdrop) = images.backdrop {
            movie.backdrop_url = Some(upload_image(self.storage.as_ref(), backdrop).await?);
        }
        Ok(())
    }
}
