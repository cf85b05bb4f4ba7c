use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use anyhow::Result;

use super::query_builder::MovieQueryBuilder;
use crate::models::{AgeRating, FilterOptions, FindAllParams, Movie, MovieRow};

/// 电影仓库接口
#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// 按条件分页查询，同时返回不分页的匹配总数
    async fn find_all(&self, params: &FindAllParams) -> Result<(Vec<Movie>, i64)>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Movie>>;
    async fn insert(&self, movie: &Movie) -> Result<()>;
    async fn insert_many(&self, movies: &[Movie]) -> Result<()>;
    async fn update(&self, movie: &Movie) -> Result<()>;
    /// 返回是否确实删除了记录
    async fn delete(&self, id: &str) -> Result<bool>;
    async fn filter_options(&self) -> Result<FilterOptions>;
    async fn count(&self) -> Result<i64>;
}

/// SQLite 电影仓库实现
#[derive(Clone)]
pub struct SqliteMovieRepository {
    pool: Pool<Sqlite>,
}

impl SqliteMovieRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn into_movies(rows: Vec<MovieRow>) -> Result<Vec<Movie>> {
    rows.into_iter()
        .map(|row| Movie::try_from(row).map_err(anyhow::Error::from))
        .collect()
}

const INSERT_MOVIE: &str = r#"
    INSERT INTO movies (
        id, title, original_title, tagline, synopsis, release_date, duration,
        genres, popularity, vote_count, language, budget, revenue, profit,
        cover_url, backdrop_url, trailer_url, age_rating, created_by, created_at, updated_at,
        title_folded, original_title_folded
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// 搜索用的小写标题（完整 Unicode 折叠，SQLite 的 LIKE 只折叠 ASCII）
fn folded(title: Option<&str>) -> Option<String> {
    title.map(str::to_lowercase)
}

fn bind_insert<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    movie: &'q Movie,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&movie.id)
        .bind(&movie.title)
        .bind(&movie.original_title)
        .bind(&movie.tagline)
        .bind(&movie.synopsis)
        .bind(movie.release_date)
        .bind(i64::from(movie.duration))
        .bind(movie.genres_json())
        .bind(movie.popularity)
        .bind(movie.vote_count)
        .bind(&movie.language)
        .bind(movie.budget)
        .bind(movie.revenue)
        .bind(movie.profit)
        .bind(&movie.cover_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.trailer_url)
        .bind(movie.age_rating.as_str())
        .bind(&movie.created_by)
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .bind(movie.title.to_lowercase())
        .bind(folded(movie.original_title.as_deref()))
}

#[async_trait]
impl MovieRepository for SqliteMovieRepository {
    async fn find_all(&self, params: &FindAllParams) -> Result<(Vec<Movie>, i64)> {
        let mut count_query = MovieQueryBuilder::count().with_filters(params).build();
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select_query = MovieQueryBuilder::select()
            .with_filters(params)
            .with_sorting(&params.criteria)
            .with_pagination(&params.criteria)
            .build();
        let rows = select_query
            .build_query_as::<MovieRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((into_movies(rows)?, total))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>("SELECT * FROM movies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Movie::try_from(r).map_err(anyhow::Error::from))
            .transpose()
    }

    async fn insert(&self, movie: &Movie) -> Result<()> {
        bind_insert(sqlx::query(INSERT_MOVIE), movie)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_many(&self, movies: &[Movie]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for movie in movies {
            bind_insert(sqlx::query(INSERT_MOVIE), movie)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, movie: &Movie) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE movies SET
                title = ?, original_title = ?, tagline = ?, synopsis = ?, release_date = ?,
                duration = ?, genres = ?, popularity = ?, vote_count = ?, language = ?,
                budget = ?, revenue = ?, profit = ?, cover_url = ?, backdrop_url = ?,
                trailer_url = ?, age_rating = ?, updated_at = ?,
                title_folded = ?, original_title_folded = ?
            WHERE id = ?
            "#
        )
        .bind(&movie.title)
        .bind(&movie.original_title)
        .bind(&movie.tagline)
        .bind(&movie.synopsis)
        .bind(movie.release_date)
        .bind(i64::from(movie.duration))
        .bind(movie.genres_json())
        .bind(movie.popularity)
        .bind(movie.vote_count)
        .bind(&movie.language)
        .bind(movie.budget)
        .bind(movie.revenue)
        .bind(movie.profit)
        .bind(&movie.cover_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.trailer_url)
        .bind(movie.age_rating.as_str())
        .bind(movie.updated_at)
        .bind(movie.title.to_lowercase())
        .bind(folded(movie.original_title.as_deref()))
        .bind(&movie.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        let genres: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT json_each.value FROM movies, json_each(movies.genres) ORDER BY json_each.value COLLATE NOCASE"
        )
        .fetch_all(&self.pool)
        .await?;

        let ratings: Vec<String> = sqlx::query_scalar("SELECT DISTINCT age_rating FROM movies")
            .fetch_all(&self.pool)
            .await?;

        let mut age_ratings: Vec<AgeRating> = ratings
            .iter()
            .filter_map(|r| r.parse::<AgeRating>().ok())
            .collect();
        age_ratings.sort();

        Ok(FilterOptions { genres, age_ratings })
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
