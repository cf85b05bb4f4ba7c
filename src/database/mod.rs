use sqlx::{sqlite::{SqlitePoolOptions, SqliteConnectOptions}, Pool, Sqlite};
use anyhow::Result;
use std::str::FromStr;

pub mod schema;
pub mod repository;
pub mod query_builder;
pub mod user_repository;

pub use repository::{MovieRepository, SqliteMovieRepository};
pub use query_builder::MovieQueryBuilder;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    repository: SqliteMovieRepository,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        // 配置 SQLite 连接选项
        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));  // 设置忙等待超时

        // SQLite 单写入者，限制为1个连接
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        schema::verify_schema(&pool).await?;

        let stats = schema::get_database_stats(&pool).await?;
        tracing::info!(
            "Database initialized - Movies: {}, Users: {}, Size: {:.2} MB",
            stats.movie_count,
            stats.user_count,
            stats.database_size_mb()
        );

        let repository = SqliteMovieRepository::new(pool.clone());

        Ok(Self { pool, repository })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn repository(&self) -> &SqliteMovieRepository {
        &self.repository
    }

    /// 获取数据库统计信息
    pub async fn get_stats(&self) -> Result<schema::DatabaseStats> {
        schema::get_database_stats(&self.pool).await
    }
}
