use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::validation::DateValidator;
use super::AgeRating;

pub const DEFAULT_TAKE: u32 = 10;
pub const MAX_TAKE: u32 = 100;

/// 查询参数解析错误（在构建查询之前返回）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid number for '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid date for '{field}': {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid sort key: {0} (expected titulo, dataLancamento, popularidade or createdAt)")]
    InvalidSortBy(String),

    #[error("Invalid sort order: {0} (expected asc or desc)")]
    InvalidOrder(String),

    #[error("Invalid age rating: {0}")]
    InvalidAgeRating(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "titulo")]
    Title,
    #[serde(rename = "dataLancamento")]
    ReleaseDate,
    #[serde(rename = "popularidade")]
    Popularity,
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Title => "titulo",
            SortBy::ReleaseDate => "dataLancamento",
            SortBy::Popularity => "popularidade",
            SortBy::CreatedAt => "createdAt",
        }
    }
}

impl FromStr for SortBy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SortBy::Title,
            SortBy::ReleaseDate,
            SortBy::Popularity,
            SortBy::CreatedAt,
        ]
        .into_iter()
        .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| FilterError::InvalidSortBy(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(FilterError::InvalidOrder(s.to_string())),
        }
    }
}

/// 筛选/排序/分页条件
///
/// 客户端状态与服务端查询共用同一结构；列表字段为"命中任一"语义，
/// 空列表与 `None` 一样不参与过滤。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub genres: Vec<String>,
    pub age_ratings: Vec<AgeRating>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_popularity: Option<f64>,
    pub sort_by: SortBy,
    pub order: SortOrder,
    pub skip: u32,
    pub take: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: None,
            genres: Vec::new(),
            age_ratings: Vec::new(),
            min_duration: None,
            max_duration: None,
            start_date: None,
            end_date: None,
            min_popularity: None,
            sort_by: SortBy::default(),
            order: SortOrder::default(),
            skip: 0,
            take: DEFAULT_TAKE,
        }
    }
}

/// 对 [`FilterCriteria`] 的部分修改
///
/// 外层 `None` 表示不改动；标量字段的 `Some(None)` 表示清除。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub search: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
    pub age_ratings: Option<Vec<AgeRating>>,
    pub min_duration: Option<Option<u32>>,
    pub max_duration: Option<Option<u32>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub min_popularity: Option<Option<f64>>,
    pub sort_by: Option<SortBy>,
    pub order: Option<SortOrder>,
    pub take: Option<u32>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(Some(value.into()));
        self
    }

    pub fn clear_search(mut self) -> Self {
        self.search = Some(None);
        self
    }

    pub fn genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    pub fn age_ratings(mut self, ratings: impl IntoIterator<Item = AgeRating>) -> Self {
        self.age_ratings = Some(ratings.into_iter().collect());
        self
    }

    pub fn duration_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_duration = Some(min);
        self.max_duration = Some(max);
        self
    }

    pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn min_popularity(mut self, value: Option<f64>) -> Self {
        self.min_popularity = Some(value);
        self
    }

    pub fn sort(mut self, sort_by: SortBy, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by);
        self.order = Some(order);
        self
    }

    pub fn take(mut self, take: u32) -> Self {
        self.take = Some(take);
        self
    }
}

impl FilterCriteria {
    /// 当前页码（从 1 开始）
    pub fn page(&self) -> u32 {
        if self.take == 0 {
            1
        } else {
            self.skip / self.take + 1
        }
    }

    /// 跳到第 `page` 页，小于 1 按第 1 页处理
    pub fn go_to_page(&mut self, page: u32) {
        let page = page.max(1);
        self.skip = (page - 1).saturating_mul(self.take);
    }

    /// 合并修改并回到第一页
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
        if let Some(ratings) = patch.age_ratings {
            self.age_ratings = ratings;
        }
        if let Some(min) = patch.min_duration {
            self.min_duration = min;
        }
        if let Some(max) = patch.max_duration {
            self.max_duration = max;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        if let Some(popularity) = patch.min_popularity {
            self.min_popularity = popularity;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(take) = patch.take {
            self.take = take.min(MAX_TAKE);
        }

        self.skip = 0;
        self.normalize();
    }

    /// 去掉空白搜索词、空类型，列表去重
    pub fn normalize(&mut self) {
        self.search = self
            .search
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut genres: Vec<String> = Vec::with_capacity(self.genres.len());
        for genre in self.genres.drain(..) {
            let genre = genre.trim().to_string();
            if !genre.is_empty() && !genres.contains(&genre) {
                genres.push(genre);
            }
        }
        self.genres = genres;

        let mut ratings: Vec<AgeRating> = Vec::with_capacity(self.age_ratings.len());
        for rating in self.age_ratings.drain(..) {
            if !ratings.contains(&rating) {
                ratings.push(rating);
            }
        }
        self.age_ratings = ratings;
    }

    fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }
        if !self.genres.is_empty() {
            pairs.push(("generos", self.genres.join(",")));
        }
        if !self.age_ratings.is_empty() {
            let ratings: Vec<&str> = self.age_ratings.iter().map(|r| r.as_str()).collect();
            pairs.push(("classificacoesIndicativas", ratings.join(",")));
        }
        if let Some(min) = self.min_duration {
            pairs.push(("minDuration", min.to_string()));
        }
        if let Some(max) = self.max_duration {
            pairs.push(("maxDuration", max.to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(popularity) = self.min_popularity {
            pairs.push(("minPopularity", popularity.to_string()));
        }
        pairs
    }

    fn sort_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("sortBy", self.sort_by.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
        ]
    }

    /// 发给 `GET /movies` 的查询参数
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("take", self.take.to_string()),
        ];
        pairs.extend(self.filter_pairs());
        pairs.extend(self.sort_pairs());
        pairs
    }

    /// 镜像到页面 URL 的参数（用页码代替 skip）
    ///
    /// 只写出与默认值不同的部分，默认条件对应空查询串。
    pub fn to_url_params(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.filter_pairs();
        if self.sort_by != SortBy::default() || self.order != SortOrder::default() {
            pairs.extend(self.sort_pairs());
        }
        if self.take != DEFAULT_TAKE {
            pairs.push(("take", self.take.to_string()));
        }
        if self.page() > 1 {
            pairs.push(("page", self.page().to_string()));
        }
        pairs
    }

    /// 从页面 URL 的查询串恢复条件
    pub fn from_url_query(query: &str) -> Result<Self, FilterError> {
        ListQuery::from_query_str(query)
            .into_params()
            .map(|params| params.criteria)
    }
}

/// 拼接查询串（值做百分号编码）
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// 未经校验的原始查询参数
///
/// 在边界处一次性转换为 [`FindAllParams`]，格式错误直接拒绝。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
    pub page: Option<String>,
    pub search: Option<String>,
    pub generos: Option<String>,
    pub classificacoes_indicativas: Option<String>,
    pub min_duration: Option<String>,
    pub max_duration: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_popularity: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub user_id: Option<String>,
}

/// 服务端查询参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindAllParams {
    pub criteria: FilterCriteria,
    /// 仅返回该用户创建的电影
    pub owner_id: Option<String>,
}

impl From<FilterCriteria> for FindAllParams {
    fn from(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            owner_id: None,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u32(field: &'static str, value: Option<String>) -> Result<Option<u32>, FilterError> {
    clean(value)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| FilterError::InvalidNumber { field, value: v })
        })
        .transpose()
}

fn parse_f64(field: &'static str, value: Option<String>) -> Result<Option<f64>, FilterError> {
    clean(value)
        .map(|v| match v.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(FilterError::InvalidNumber { field, value: v }),
        })
        .transpose()
}

fn parse_date(field: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, FilterError> {
    clean(value)
        .map(|v| {
            DateValidator::parse_date(field, &v)
                .map_err(|_| FilterError::InvalidDate { field, value: v })
        })
        .transpose()
}

fn split_list(value: Option<String>) -> Vec<String> {
    clean(value)
        .map(|v| {
            v.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// 同名参数重复出现时拼接为逗号列表（`generos=a&generos=b`）
fn append_list(slot: &mut Option<String>, value: String) {
    match slot {
        Some(existing) if !existing.is_empty() => {
            existing.push(',');
            existing.push_str(&value);
        }
        _ => *slot = Some(value),
    }
}

impl ListQuery {
    /// 解析原始查询串，未知参数忽略
    pub fn from_query_str(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut raw = ListQuery::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "skip" => raw.skip = Some(value),
                "take" => raw.take = Some(value),
                "page" => raw.page = Some(value),
                "search" => raw.search = Some(value),
                "generos" => append_list(&mut raw.generos, value),
                "classificacoesIndicativas" | "classificacoes" => {
                    append_list(&mut raw.classificacoes_indicativas, value)
                }
                "minDuration" => raw.min_duration = Some(value),
                "maxDuration" => raw.max_duration = Some(value),
                "startDate" => raw.start_date = Some(value),
                "endDate" => raw.end_date = Some(value),
                "minPopularity" => raw.min_popularity = Some(value),
                "sortBy" => raw.sort_by = Some(value),
                "order" => raw.order = Some(value),
                "userId" => raw.user_id = Some(value),
                _ => {}
            }
        }

        raw
    }

    /// 校验并转换；任何字段格式错误都会使整个请求失败
    pub fn into_params(self) -> Result<FindAllParams, FilterError> {
        let take = parse_u32("take", self.take)?
            .unwrap_or(DEFAULT_TAKE)
            .min(MAX_TAKE);

        let skip = match parse_u32("skip", self.skip)? {
            Some(skip) => skip,
            None => {
                let page = parse_u32("page", self.page)?.unwrap_or(1).max(1);
                (page - 1).saturating_mul(take)
            }
        };

        let age_ratings = split_list(self.classificacoes_indicativas)
            .into_iter()
            .map(|r| {
                r.parse::<AgeRating>()
                    .map_err(|_| FilterError::InvalidAgeRating(r))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sort_by = clean(self.sort_by)
            .map(|s| s.parse::<SortBy>())
            .transpose()?
            .unwrap_or_default();
        let order = clean(self.order)
            .map(|s| s.parse::<SortOrder>())
            .transpose()?
            .unwrap_or_default();

        let mut criteria = FilterCriteria {
            search: clean(self.search),
            genres: split_list(self.generos),
            age_ratings,
            min_duration: parse_u32("minDuration", self.min_duration)?,
            max_duration: parse_u32("maxDuration", self.max_duration)?,
            start_date: parse_date("startDate", self.start_date)?,
            end_date: parse_date("endDate", self.end_date)?,
            min_popularity: parse_f64("minPopularity", self.min_popularity)?,
            sort_by,
            order,
            skip,
            take,
        };
        criteria.normalize();

        Ok(FindAllParams {
            criteria,
            owner_id: clean(self.user_id),
        })
    }
}
