use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::validation::{
    CollectionValidator, DateValidator, NumberValidator, StringValidator, ValidationError,
    Validator,
};

/// 分级（年龄限制）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeRating {
    #[serde(rename = "LIVRE")]
    Free,
    #[serde(rename = "DEZ")]
    Ten,
    #[serde(rename = "DOZE")]
    Twelve,
    #[serde(rename = "CATORZE")]
    Fourteen,
    #[serde(rename = "DEZESSEIS")]
    Sixteen,
    #[serde(rename = "DEZOITO")]
    Eighteen,
}

impl AgeRating {
    pub const ALL: [AgeRating; 6] = [
        AgeRating::Free,
        AgeRating::Ten,
        AgeRating::Twelve,
        AgeRating::Fourteen,
        AgeRating::Sixteen,
        AgeRating::Eighteen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::Free => "LIVRE",
            AgeRating::Ten => "DEZ",
            AgeRating::Twelve => "DOZE",
            AgeRating::Fourteen => "CATORZE",
            AgeRating::Sixteen => "DEZESSEIS",
            AgeRating::Eighteen => "DEZOITO",
        }
    }
}

impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgeRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AgeRating::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Invalid age rating: {}", s))
    }
}

/// 数值输入：JSON 里可能是数字，也可能是字符串（表单字段总是字符串）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Int(v) => write!(f, "{}", v),
            NumericInput::Float(v) => write!(f, "{}", v),
            NumericInput::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NumericInput {
    fn from(v: i64) -> Self {
        NumericInput::Int(v)
    }
}

impl From<u32> for NumericInput {
    fn from(v: u32) -> Self {
        NumericInput::Int(v as i64)
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        NumericInput::Float(v)
    }
}

/// 数据库行
#[derive(Debug, Clone, FromRow)]
pub struct MovieRow {
    pub id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub synopsis: Option<String>,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub genres: String, // JSON array as string
    pub popularity: Option<f64>,
    pub vote_count: Option<i64>,
    pub language: Option<String>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
    pub profit: Option<f64>,
    pub cover_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub age_rating: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 电影
///
/// 序列化字段名沿用前端约定（titulo、dataLancamento ...）。
/// `profit` 由调用方提供，不与 `revenue - budget` 做一致性校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "tituloOriginal")]
    pub original_title: Option<String>,
    #[serde(rename = "subtitulo")]
    pub tagline: Option<String>,
    #[serde(rename = "sinopse")]
    pub synopsis: Option<String>,
    #[serde(rename = "dataLancamento")]
    pub release_date: NaiveDate,
    #[serde(rename = "duracao")]
    pub duration: u32,
    #[serde(rename = "generos")]
    pub genres: Vec<String>,
    #[serde(rename = "popularidade")]
    pub popularity: Option<f64>,
    #[serde(rename = "votos")]
    pub vote_count: Option<i64>,
    #[serde(rename = "idioma")]
    pub language: Option<String>,
    #[serde(rename = "orcamento")]
    pub budget: Option<f64>,
    #[serde(rename = "receita")]
    pub revenue: Option<f64>,
    #[serde(rename = "lucro")]
    pub profit: Option<f64>,
    #[serde(rename = "capaUrl")]
    pub cover_url: Option<String>,
    #[serde(rename = "capaFundo")]
    pub backdrop_url: Option<String>,
    #[serde(rename = "trailerUrl")]
    pub trailer_url: Option<String>,
    #[serde(rename = "classificacaoIndicativa")]
    pub age_rating: AgeRating,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// 创建/更新请求体（JSON 或 multipart 表单解析而来）
///
/// 所有字段可选：创建时由 [`Movie::from_input`] 检查必填项，
/// 更新时只应用出现的字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieInput {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "tituloOriginal", skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(rename = "subtitulo", skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(rename = "sinopse", skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(rename = "dataLancamento", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(rename = "duracao", skip_serializing_if = "Option::is_none")]
    pub duration: Option<NumericInput>,
    #[serde(rename = "generos", skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(rename = "popularidade", skip_serializing_if = "Option::is_none")]
    pub popularity: Option<NumericInput>,
    #[serde(rename = "votos", skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<NumericInput>,
    #[serde(rename = "idioma", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "orcamento", skip_serializing_if = "Option::is_none")]
    pub budget: Option<NumericInput>,
    #[serde(rename = "receita", skip_serializing_if = "Option::is_none")]
    pub revenue: Option<NumericInput>,
    #[serde(rename = "lucro", skip_serializing_if = "Option::is_none")]
    pub profit: Option<NumericInput>,
    #[serde(rename = "capaUrl", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "capaFundo", skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(rename = "trailerUrl", skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(rename = "classificacaoIndicativa", skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<String>,
}

/// 列表查询结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    pub total: i64,
}

/// 筛选选项（目录中实际出现过的值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(rename = "generos")]
    pub genres: Vec<String>,
    #[serde(rename = "classificacoesIndicativas")]
    pub age_ratings: Vec<AgeRating>,
}

/// 空字符串视为未填写
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_age_rating(value: &str) -> Result<AgeRating, ValidationError> {
    value
        .parse::<AgeRating>()
        .map_err(|_| ValidationError::InvalidAgeRating(value.to_string()))
}

fn parse_optional_f64(
    field: &'static str,
    input: &Option<NumericInput>,
) -> Result<Option<f64>, ValidationError> {
    match input {
        None => Ok(None),
        Some(NumericInput::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => NumberValidator::parse_f64(field, value).map(Some),
    }
}

fn parse_optional_votes(input: &Option<NumericInput>) -> Result<Option<i64>, ValidationError> {
    match input {
        None => Ok(None),
        Some(NumericInput::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => NumberValidator::parse_vote_count(value).map(Some),
    }
}

impl Movie {
    /// 从创建请求构建完整的电影对象
    pub fn from_input(input: MovieInput, owner: Option<String>) -> Result<Self, ValidationError> {
        let title = non_empty(input.title).ok_or(ValidationError::EmptyTitle)?;
        StringValidator::validate_title(&title)?;

        let release_date = non_empty(input.release_date)
            .ok_or(ValidationError::MissingField("dataLancamento"))?;
        let release_date = DateValidator::parse_date("dataLancamento", &release_date)?;

        let duration = input
            .duration
            .as_ref()
            .filter(|d| !matches!(d, NumericInput::Text(s) if s.trim().is_empty()))
            .ok_or(ValidationError::MissingField("duracao"))?;
        let duration = NumberValidator::parse_duration(duration)?;

        let age_rating = non_empty(input.age_rating)
            .ok_or(ValidationError::MissingField("classificacaoIndicativa"))?;
        let age_rating = parse_age_rating(&age_rating)?;

        let genres = CollectionValidator::normalize_genres(&input.genres.unwrap_or_default())?;

        let now = Utc::now();
        let movie = Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            original_title: non_empty(input.original_title),
            tagline: non_empty(input.tagline),
            synopsis: non_empty(input.synopsis),
            release_date,
            duration,
            genres,
            popularity: parse_optional_f64("popularidade", &input.popularity)?,
            vote_count: parse_optional_votes(&input.vote_count)?,
            language: non_empty(input.language),
            budget: parse_optional_f64("orcamento", &input.budget)?,
            revenue: parse_optional_f64("receita", &input.revenue)?,
            profit: parse_optional_f64("lucro", &input.profit)?,
            cover_url: non_empty(input.cover_url),
            backdrop_url: non_empty(input.backdrop_url),
            trailer_url: non_empty(input.trailer_url),
            age_rating,
            created_by: owner,
            created_at: now,
            updated_at: now,
        };

        movie.validate()?;
        Ok(movie)
    }

    /// 应用部分更新；任一字段无效时整个更新不生效
    pub fn apply_input(&mut self, input: MovieInput) -> Result<(), ValidationError> {
        let mut next = self.clone();

        if let Some(title) = input.title {
            StringValidator::validate_title(&title)?;
            next.title = title.trim().to_string();
        }
        if input.original_title.is_some() {
            next.original_title = non_empty(input.original_title);
        }
        if input.tagline.is_some() {
            next.tagline = non_empty(input.tagline);
        }
        if input.synopsis.is_some() {
            next.synopsis = non_empty(input.synopsis);
        }
        if let Some(date) = input.release_date {
            next.release_date = DateValidator::parse_date("dataLancamento", &date)?;
        }
        if let Some(duration) = input.duration {
            next.duration = NumberValidator::parse_duration(&duration)?;
        }
        if let Some(genres) = input.genres {
            next.genres = CollectionValidator::normalize_genres(&genres)?;
        }
        if input.popularity.is_some() {
            next.popularity = parse_optional_f64("popularidade", &input.popularity)?;
        }
        if input.vote_count.is_some() {
            next.vote_count = parse_optional_votes(&input.vote_count)?;
        }
        if input.language.is_some() {
            next.language = non_empty(input.language);
        }
        if input.budget.is_some() {
            next.budget = parse_optional_f64("orcamento", &input.budget)?;
        }
        if input.revenue.is_some() {
            next.revenue = parse_optional_f64("receita", &input.revenue)?;
        }
        if input.profit.is_some() {
            next.profit = parse_optional_f64("lucro", &input.profit)?;
        }
        if input.cover_url.is_some() {
            next.cover_url = non_empty(input.cover_url);
        }
        if input.backdrop_url.is_some() {
            next.backdrop_url = non_empty(input.backdrop_url);
        }
        if input.trailer_url.is_some() {
            next.trailer_url = non_empty(input.trailer_url);
        }
        if let Some(rating) = input.age_rating {
            next.age_rating = parse_age_rating(&rating)?;
        }

        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by.as_deref() == Some(user_id)
    }

    /// genres 以 JSON 数组字符串入库
    pub fn genres_json(&self) -> String {
        serde_json::to_string(&self.genres).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Validator for Movie {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        StringValidator::validate_title(&self.title)?;
        StringValidator::validate_synopsis(&self.synopsis)?;
        StringValidator::validate_url(&self.cover_url)?;
        StringValidator::validate_url(&self.backdrop_url)?;
        StringValidator::validate_url(&self.trailer_url)?;
        CollectionValidator::normalize_genres(&self.genres)?;
        if matches!(self.vote_count, Some(v) if v < 0) {
            return Err(ValidationError::NegativeVoteCount);
        }
        Ok(())
    }
}

impl TryFrom<MovieRow> for Movie {
    type Error = ValidationError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        let genres: Vec<String> = serde_json::from_str(&row.genres).map_err(|e| {
            ValidationError::CorruptRecord(format!("movie {} genres: {}", row.id, e))
        })?;
        let age_rating = row.age_rating.parse::<AgeRating>().map_err(|e| {
            ValidationError::CorruptRecord(format!("movie {}: {}", row.id, e))
        })?;
        let duration = u32::try_from(row.duration).map_err(|_| {
            ValidationError::CorruptRecord(format!("movie {} duration {}", row.id, row.duration))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            original_title: row.original_title,
            tagline: row.tagline,
            synopsis: row.synopsis,
            release_date: row.release_date,
            duration,
            genres,
            popularity: row.popularity,
            vote_count: row.vote_count,
            language: row.language,
            budget: row.budget,
            revenue: row.revenue,
            profit: row.profit,
            cover_url: row.cover_url,
            backdrop_url: row.backdrop_url,
            trailer_url: row.trailer_url,
            age_rating,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
