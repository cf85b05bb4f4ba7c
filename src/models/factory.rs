use chrono::{Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{AgeRating, Movie, MovieInput, NumericInput, ValidationError};

const TITLE_WORDS: &[&str] = &[
    "Sombra", "Horizonte", "Noite", "Cidade", "Tempo", "Fogo", "Silêncio", "Estrela", "Mar",
    "Destino", "Memória", "Vento", "Labirinto", "Eco", "Aurora", "Fronteira",
];

const GENRES: &[&str] = &[
    "Ação", "Aventura", "Animação", "Comédia", "Crime", "Documentário", "Drama", "Fantasia",
    "Ficção Científica", "Romance", "Suspense", "Terror",
];

const LANGUAGES: &[&str] = &["pt-BR", "en", "es", "fr", "ja", "ko"];

/// 电影工厂
pub struct MovieFactory;

impl MovieFactory {
    /// 从最小字段创建电影
    pub fn create_movie(
        title: &str,
        release_date: NaiveDate,
        duration: u32,
        age_rating: AgeRating,
        owner: Option<String>,
    ) -> Result<Movie, ValidationError> {
        let input = MovieInput {
            title: Some(title.to_string()),
            release_date: Some(release_date.format("%Y-%m-%d").to_string()),
            duration: Some(NumericInput::from(duration)),
            age_rating: Some(age_rating.as_str().to_string()),
            ..Default::default()
        };
        Movie::from_input(input, owner)
    }

    /// 生成一条随机的演示数据
    pub fn random_movie<R: Rng + ?Sized>(
        rng: &mut R,
        owner: Option<String>,
    ) -> Result<Movie, ValidationError> {
        let word_count = rng.gen_range(1..=3);
        let title = TITLE_WORDS
            .choose_multiple(rng, word_count)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let days_back = rng.gen_range(0..365 * 60);
        let release_date = (Utc::now() - Duration::days(days_back)).date_naive();

        let genre_count = rng.gen_range(1..=3);
        let genres = GENRES
            .choose_multiple(rng, genre_count)
            .map(|g| g.to_string())
            .collect();

        let budget = rng.gen_range(1..=200) as f64 * 1_000_000.0;
        let revenue = rng.gen_range(0..=800) as f64 * 1_000_000.0;
        let popularity = (rng.gen_range(0.0..100.0_f64) * 10.0).round() / 10.0;

        let age_rating = AgeRating::ALL
            .choose(rng)
            .copied()
            .unwrap_or(AgeRating::Free);

        let input = MovieInput {
            title: Some(title),
            synopsis: Some(format!("Filme de demonstração gerado em {}.", Utc::now().format("%Y-%m-%d"))),
            release_date: Some(release_date.format("%Y-%m-%d").to_string()),
            duration: Some(NumericInput::Int(rng.gen_range(70..=200))),
            genres: Some(genres),
            popularity: Some(NumericInput::Float(popularity)),
            vote_count: Some(NumericInput::Int(rng.gen_range(0..=50_000))),
            language: LANGUAGES.choose(rng).map(|l| l.to_string()),
            budget: Some(NumericInput::Float(budget)),
            revenue: Some(NumericInput::Float(revenue)),
            // 演示数据直接给出利润，用户录入的数据不会推导
            profit: Some(NumericInput::Float(revenue - budget)),
            age_rating: Some(age_rating.as_str().to_string()),
            ..Default::default()
        };

        Movie::from_input(input, owner)
    }

    /// 批量生成演示数据
    pub fn random_batch(count: usize, owner: Option<String>) -> Result<Vec<Movie>, ValidationError> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| Self::random_movie(&mut rng, owner.clone()))
            .collect()
    }
}
