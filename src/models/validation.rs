use chrono::{DateTime, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::NumericInput;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

/// 验证错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title is too long (max 500 characters)")]
    TitleTooLong,

    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Invalid number for '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid duration: {0} (must be a non-negative number of minutes)")]
    InvalidDuration(String),

    #[error("Invalid date for '{field}': {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid age rating: {0}")]
    InvalidAgeRating(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Synopsis is too long (max 5000 characters)")]
    SynopsisTooLong,

    #[error("Too many genres (max 20)")]
    TooManyGenres,

    #[error("Genre name is too long (max 50 characters)")]
    GenreNameTooLong,

    #[error("Vote count cannot be negative")]
    NegativeVoteCount,

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),

    #[error("Invalid stored data: {0}")]
    CorruptRecord(String),
}

/// 验证器trait
pub trait Validator {
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 字符串验证工具
pub struct StringValidator;

impl StringValidator {
    pub fn validate_title(title: &str) -> Result<(), ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        if title.chars().count() > 500 {
            return Err(ValidationError::TitleTooLong);
        }

        Ok(())
    }

    pub fn validate_synopsis(synopsis: &Option<String>) -> Result<(), ValidationError> {
        if let Some(text) = synopsis {
            if text.chars().count() > 5000 {
                return Err(ValidationError::SynopsisTooLong);
            }
        }
        Ok(())
    }

    /// 仅接受 http/https 绝对地址，空字符串视为未设置
    pub fn validate_url(url: &Option<String>) -> Result<(), ValidationError> {
        if let Some(url_str) = url {
            if url_str.is_empty() {
                return Ok(());
            }
            match url::Url::parse(url_str) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                _ => return Err(ValidationError::InvalidUrl(url_str.clone())),
            }
        }
        Ok(())
    }

    pub fn validate_email(email: &str) -> Result<(), ValidationError> {
        if !EMAIL_RE.is_match(email.trim()) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<(), ValidationError> {
        const MIN_LEN: usize = 6;
        if password.chars().count() < MIN_LEN {
            return Err(ValidationError::WeakPassword(MIN_LEN));
        }
        Ok(())
    }
}

/// 数值验证工具
pub struct NumberValidator;

impl NumberValidator {
    /// 时长必须是非负整数（分钟）
    pub fn parse_duration(input: &NumericInput) -> Result<u32, ValidationError> {
        let invalid = || ValidationError::InvalidDuration(input.to_string());
        match input {
            NumericInput::Int(v) => u32::try_from(*v).map_err(|_| invalid()),
            NumericInput::Float(v) => {
                if v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64 {
                    Ok(*v as u32)
                } else {
                    Err(invalid())
                }
            }
            NumericInput::Text(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
        }
    }

    pub fn parse_f64(field: &'static str, input: &NumericInput) -> Result<f64, ValidationError> {
        let value = match input {
            NumericInput::Int(v) => Some(*v as f64),
            NumericInput::Float(v) => Some(*v),
            NumericInput::Text(s) => s.trim().parse::<f64>().ok(),
        };
        match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(ValidationError::InvalidNumber {
                field,
                value: input.to_string(),
            }),
        }
    }

    pub fn parse_vote_count(input: &NumericInput) -> Result<i64, ValidationError> {
        let invalid = || ValidationError::InvalidNumber {
            field: "votos",
            value: input.to_string(),
        };
        let votes = match input {
            NumericInput::Int(v) => *v,
            NumericInput::Float(v) if v.fract() == 0.0 => *v as i64,
            NumericInput::Float(_) => return Err(invalid()),
            NumericInput::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        };
        if votes < 0 {
            return Err(ValidationError::NegativeVoteCount);
        }
        Ok(votes)
    }
}

/// 日期验证工具
pub struct DateValidator;

impl DateValidator {
    /// 接受 `YYYY-MM-DD`，也接受完整的 RFC 3339 时间戳（取日期部分）
    pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.date_naive())
            .map_err(|_| ValidationError::InvalidDate {
                field,
                value: value.to_string(),
            })
    }
}

/// 集合验证工具
pub struct CollectionValidator;

impl CollectionValidator {
    /// 规范化类型列表：去除首尾空白、丢弃空项、按首次出现去重
    pub fn normalize_genres(genres: &[String]) -> Result<Vec<String>, ValidationError> {
        let mut normalized: Vec<String> = Vec::with_capacity(genres.len());
        for genre in genres {
            let genre = genre.trim();
            if genre.is_empty() || normalized.iter().any(|g| g == genre) {
                continue;
            }
            if genre.chars().count() > 50 {
                return Err(ValidationError::GenreNameTooLong);
            }
            normalized.push(genre.to_string());
        }

        if normalized.len() > 20 {
            return Err(ValidationError::TooManyGenres);
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_validation() {
        assert!(StringValidator::validate_title("The Matrix").is_ok());
        assert_eq!(
            StringValidator::validate_title("   "),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            StringValidator::validate_title(&"x".repeat(501)),
            Err(ValidationError::TitleTooLong)
        );
    }

    #[test]
    fn test_url_validation() {
        assert!(StringValidator::validate_url(&Some("https://youtu.be/abc".into())).is_ok());
        assert!(StringValidator::validate_url(&Some(String::new())).is_ok());
        assert!(StringValidator::validate_url(&None).is_ok());
        assert!(StringValidator::validate_url(&Some("ftp://host/file".into())).is_err());
        assert!(StringValidator::validate_url(&Some("not a url".into())).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(StringValidator::validate_email("ana@example.com").is_ok());
        assert!(StringValidator::validate_email("ana@example").is_err());
        assert!(StringValidator::validate_email("no-at-sign").is_err());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(NumberValidator::parse_duration(&NumericInput::Int(120)), Ok(120));
        assert_eq!(NumberValidator::parse_duration(&NumericInput::Text(" 95 ".into())), Ok(95));
        assert_eq!(NumberValidator::parse_duration(&NumericInput::Float(90.0)), Ok(90));
        assert!(NumberValidator::parse_duration(&NumericInput::Int(-1)).is_err());
        assert!(NumberValidator::parse_duration(&NumericInput::Float(90.5)).is_err());
        assert!(NumberValidator::parse_duration(&NumericInput::Text("abc".into())).is_err());
    }

    #[test]
    fn test_date_parsing() {
        let expected = NaiveDate::from_ymd_opt(1999, 3, 31).unwrap();
        assert_eq!(DateValidator::parse_date("d", "1999-03-31"), Ok(expected));
        assert_eq!(
            DateValidator::parse_date("d", "1999-03-31T00:00:00.000Z"),
            Ok(expected)
        );
        assert!(DateValidator::parse_date("d", "31/03/1999").is_err());
        assert!(DateValidator::parse_date("d", "0000-00-00").is_err());
    }

    #[test]
    fn test_genre_normalization() {
        let genres = vec![
            " acao ".to_string(),
            "drama".to_string(),
            "acao".to_string(),
            "".to_string(),
        ];
        assert_eq!(
            CollectionValidator::normalize_genres(&genres).unwrap(),
            vec!["acao".to_string(), "drama".to_string()]
        );

        let too_long = vec!["g".repeat(51)];
        assert_eq!(
            CollectionValidator::normalize_genres(&too_long),
            Err(ValidationError::GenreNameTooLong)
        );
    }
}
