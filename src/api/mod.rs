pub mod auth;
pub mod error;
pub mod health;
pub mod movie_form;
pub mod movies;
pub mod response;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend};
use crate::database::Database;
use crate::external::{self, Mailer, ObjectStorage};
use crate::services::{AuthService, JwtManager, MovieService};

/// 请求体上限（两张图片加文本字段）
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub movie_service: Arc<MovieService>,
    pub auth_service: Arc<AuthService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 按配置创建存储和邮件后端
    pub fn new(database: Database, config: AppConfig) -> Self {
        let storage = external::storage_from_config(&config);
        let mailer = external::mailer_from_config(&config);
        Self::with_backends(database, config, storage, mailer)
    }

    pub fn with_backends(
        database: Database,
        config: AppConfig,
        storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let pool = database.pool().clone();

        let movie_service = MovieService::new(
            Arc::new(database.repository().clone()),
            pool.clone(),
            storage,
            config.owner_gated_reads,
        );
        let auth_service = AuthService::new(
            pool,
            JwtManager::new(&config.jwt_secret, config.jwt_ttl_hours),
            mailer,
        );

        Self {
            database,
            movie_service: Arc::new(movie_service),
            auth_service: Arc::new(auth_service),
            config: Arc::new(config),
        }
    }
}

/// 构建全部路由
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(|| async { "Movie Catalog API v1.0" }))
        .route("/health", get(health::health_check))
        // Movies
        .route("/movies", get(movies::list_movies).post(movies::create_movie))
        .route("/movies/filters", get(movies::get_filter_options))
        .route("/movies/seed", post(movies::seed_movies))
        .route(
            "/movies/:id",
            get(movies::get_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        )
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        // Users
        .route("/users/:id", get(users::get_user));

    // 本地存储时由服务自身提供上传文件
    if state.config.storage_backend == StorageBackend::Local {
        app = app.nest_service("/uploads", ServeDir::new(&state.config.upload_dir));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
