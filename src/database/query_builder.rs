use crate::models::{FilterCriteria, FindAllParams, SortBy, SortOrder};
use sqlx::{QueryBuilder, Sqlite};

/// 动态查询构建器
///
/// 每个提供的条件追加一个 `AND` 谓词；未提供的条件不参与过滤。
/// 同一组条件分别用于 `select()` 和 `count()`，保证总数与分页结果一致。
pub struct MovieQueryBuilder {
    query: QueryBuilder<'static, Sqlite>,
    has_where: bool,
}

impl MovieQueryBuilder {
    pub fn select() -> Self {
        Self {
            query: QueryBuilder::new("SELECT * FROM movies"),
            has_where: false,
        }
    }

    pub fn count() -> Self {
        Self {
            query: QueryBuilder::new("SELECT COUNT(*) FROM movies"),
            has_where: false,
        }
    }

    pub fn with_filters(mut self, params: &FindAllParams) -> Self {
        let filters = &params.criteria;

        // 标题或原标题包含搜索词，两边都用小写副本比较
        if let Some(ref search) = filters.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", escape_like(&search.trim().to_lowercase()));
                self.add_where_clause();
                self.query.push("(title_folded LIKE ");
                self.query.push_bind(pattern.clone());
                self.query.push(" ESCAPE '\\' OR original_title_folded LIKE ");
                self.query.push_bind(pattern);
                self.query.push(" ESCAPE '\\')");
            }
        }

        // 类型：命中任一
        let genres: Vec<&String> = filters
            .genres
            .iter()
            .filter(|g| !g.trim().is_empty())
            .collect();
        if !genres.is_empty() {
            self.add_where_clause();
            self.query.push(
                "EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value IN (",
            );
            let mut separated = self.query.separated(", ");
            for genre in genres {
                separated.push_bind(genre.clone());
            }
            separated.push_unseparated("))");
        }

        // 分级：命中任一
        if !filters.age_ratings.is_empty() {
            self.add_where_clause();
            self.query.push("age_rating IN (");
            let mut separated = self.query.separated(", ");
            for rating in &filters.age_ratings {
                separated.push_bind(rating.as_str());
            }
            separated.push_unseparated(")");
        }

        // 时长范围（闭区间）
        if let Some(min) = filters.min_duration {
            self.add_where_clause();
            self.query.push("duration >= ");
            self.query.push_bind(i64::from(min));
        }
        if let Some(max) = filters.max_duration {
            self.add_where_clause();
            self.query.push("duration <= ");
            self.query.push_bind(i64::from(max));
        }

        // 上映日期范围（闭区间）
        if let Some(start) = filters.start_date {
            self.add_where_clause();
            self.query.push("release_date >= ");
            self.query.push_bind(start);
        }
        if let Some(end) = filters.end_date {
            self.add_where_clause();
            self.query.push("release_date <= ");
            self.query.push_bind(end);
        }

        if let Some(popularity) = filters.min_popularity {
            self.add_where_clause();
            self.query.push("popularity >= ");
            self.query.push_bind(popularity);
        }

        if let Some(ref owner_id) = params.owner_id {
            if !owner_id.trim().is_empty() {
                self.add_where_clause();
                self.query.push("created_by = ");
                self.query.push_bind(owner_id.clone());
            }
        }

        self
    }

    /// 排序键之后按 id 升序，保证相同键值的记录顺序稳定
    pub fn with_sorting(mut self, filters: &FilterCriteria) -> Self {
        self.query.push(" ORDER BY ");
        self.query.push(sort_column(filters.sort_by));

        match filters.order {
            SortOrder::Asc => { self.query.push(" ASC"); },
            SortOrder::Desc => { self.query.push(" DESC"); },
        }

        self.query.push(" NULLS LAST, id ASC");
        self
    }

    pub fn with_pagination(mut self, filters: &FilterCriteria) -> Self {
        self.query.push(" LIMIT ");
        self.query.push_bind(i64::from(filters.take));
        self.query.push(" OFFSET ");
        self.query.push_bind(i64::from(filters.skip));
        self
    }

    pub fn build(self) -> QueryBuilder<'static, Sqlite> {
        self.query
    }

    fn add_where_clause(&mut self) {
        if !self.has_where {
            self.query.push(" WHERE ");
            self.has_where = true;
        } else {
            self.query.push(" AND ");
        }
    }
}

fn sort_column(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::Title => "title COLLATE NOCASE",
        SortBy::ReleaseDate => "release_date",
        SortBy::Popularity => "popularity",
        SortBy::CreatedAt => "created_at",
    }
}

/// 转义 LIKE 通配符，用户输入按字面匹配
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
