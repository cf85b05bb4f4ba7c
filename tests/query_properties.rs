// 查询构建的性质测试
//
// 随机生成目录和筛选条件，写入临时 SQLite 后与内存中的参考筛选结果对比。

mod common;

use chrono::NaiveDate;
use proptest::prelude::*;
use proptest::sample::subsequence;

use movie_catalog_backend::database::MovieRepository;
use movie_catalog_backend::models::{
    AgeRating, FilterCriteria, FindAllParams, Movie, MovieFactory, SortBy, SortOrder,
};

const GENRES: [&str; 4] = ["Ação", "Drama", "Comédia", "Terror"];

#[derive(Debug, Clone)]
struct MovieSeed {
    title: String,
    duration: u32,
    genres: Vec<String>,
    rating: AgeRating,
    popularity: Option<u32>,
    release_day: i64,
}

/// 1990-01-01 之后的第 n 天
fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(offset)
}

fn movie_seed() -> impl Strategy<Value = MovieSeed> {
    (
        "[a-z]{1,8}",
        60u32..200,
        subsequence(GENRES.to_vec(), 0..=GENRES.len()),
        prop::sample::select(AgeRating::ALL.to_vec()),
        prop::option::of(0u32..100),
        0i64..12000,
    )
        .prop_map(|(title, duration, genres, rating, popularity, release_day)| MovieSeed {
            title,
            duration,
            genres: genres.into_iter().map(String::from).collect(),
            rating,
            popularity,
            release_day,
        })
}

fn criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        prop::option::of(subsequence(GENRES.to_vec(), 1..=2)),
        prop::option::of(subsequence(AgeRating::ALL.to_vec(), 1..=3)),
        prop::option::of(60u32..200),
        prop::option::of(60u32..200),
        prop::option::of(0u32..100),
        prop::option::of(0i64..12000),
        prop::option::of(0i64..12000),
        prop::sample::select(vec![SortBy::Title, SortBy::Popularity, SortBy::ReleaseDate]),
        prop::sample::select(vec![SortOrder::Asc, SortOrder::Desc]),
        0u32..25,
        1u32..15,
    )
        .prop_map(
            |(genres, ratings, min, max, popularity, start, end, sort_by, order, skip, take)| FilterCriteria {
                genres: genres
                    .unwrap_or_default()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                age_ratings: ratings.unwrap_or_default(),
                min_duration: min,
                max_duration: max,
                min_popularity: popularity.map(f64::from),
                start_date: start.map(day),
                end_date: end.map(day),
                sort_by,
                order,
                skip,
                take,
                ..FilterCriteria::default()
            },
        )
}

fn build_movie(seed: &MovieSeed) -> Movie {
    let date = day(seed.release_day);
    let mut movie =
        MovieFactory::create_movie(&seed.title, date, seed.duration, seed.rating, None).unwrap();
    movie.genres = seed.genres.clone();
    movie.popularity = seed.popularity.map(f64::from);
    movie
}

fn matches(movie: &Movie, c: &FilterCriteria) -> bool {
    (c.genres.is_empty() || movie.genres.iter().any(|g| c.genres.contains(g)))
        && (c.age_ratings.is_empty() || c.age_ratings.contains(&movie.age_rating))
        && c.min_duration.map_or(true, |min| movie.duration >= min)
        && c.max_duration.map_or(true, |max| movie.duration <= max)
        && c.start_date.map_or(true, |start| movie.release_date >= start)
        && c.end_date.map_or(true, |end| movie.release_date <= end)
        && c.min_popularity
            .map_or(true, |min| movie.popularity.map_or(false, |p| p >= min))
}

/// 参考排序：排序键为空的排在最后，键相同按 id 升序
fn reference_page(catalog: &[Movie], c: &FilterCriteria) -> (Vec<String>, i64) {
    let mut hits: Vec<&Movie> = catalog.iter().filter(|m| matches(m, c)).collect();
    hits.sort_by(|a, b| {
        let key = match c.sort_by {
            SortBy::Title => {
                let ord = a.title.to_lowercase().cmp(&b.title.to_lowercase());
                if c.order == SortOrder::Desc { ord.reverse() } else { ord }
            }
            SortBy::ReleaseDate => {
                let ord = a.release_date.cmp(&b.release_date);
                if c.order == SortOrder::Desc { ord.reverse() } else { ord }
            }
            _ => match (a.popularity, b.popularity) {
                (Some(x), Some(y)) => {
                    let ord = x.total_cmp(&y);
                    if c.order == SortOrder::Desc { ord.reverse() } else { ord }
                }
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            },
        };
        key.then_with(|| a.id.cmp(&b.id))
    });

    let total = hits.len() as i64;
    let page = hits
        .into_iter()
        .skip(c.skip as usize)
        .take(c.take as usize)
        .map(|m| m.id.clone())
        .collect();
    (page, total)
}

async fn run_query(catalog: &[Movie], queries: &[FilterCriteria]) -> Vec<(Vec<String>, i64)> {
    let dir = tempfile::tempdir().unwrap();
    let database = common::database(&dir).await;
    let repository = database.repository();
    repository.insert_many(catalog).await.unwrap();

    let mut results = Vec::new();
    for criteria in queries {
        let params = FindAllParams::from(criteria.clone());
        let (movies, total) = repository.find_all(&params).await.unwrap();
        results.push((movies.into_iter().map(|m| m.id).collect(), total));
    }
    results
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn listing_matches_reference_filter(
        seeds in prop::collection::vec(movie_seed(), 0..30),
        criteria in criteria(),
    ) {
        let catalog: Vec<Movie> = seeds.iter().map(build_movie).collect();
        let results = block_on(run_query(&catalog, &[criteria.clone()]));
        let (ids, total) = &results[0];

        let (expected_ids, expected_total) = reference_page(&catalog, &criteria);
        prop_assert_eq!(*total, expected_total);
        prop_assert_eq!(ids, &expected_ids);

        let expected_len = (criteria.take as i64).min((expected_total - criteria.skip as i64).max(0));
        prop_assert_eq!(ids.len() as i64, expected_len);
    }

    #[test]
    fn omitted_filters_never_narrow(
        seeds in prop::collection::vec(movie_seed(), 0..30),
        criteria in criteria(),
    ) {
        let catalog: Vec<Movie> = seeds.iter().map(build_movie).collect();
        let unpaged = FilterCriteria { skip: 0, take: 100, ..criteria.clone() };
        let relaxed = FilterCriteria { genres: Vec::new(), min_duration: None, ..unpaged.clone() };

        let results = block_on(run_query(&catalog, &[unpaged, relaxed]));
        let (strict_ids, strict_total) = &results[0];
        let (relaxed_ids, relaxed_total) = &results[1];

        prop_assert!(relaxed_total >= strict_total);
        for id in strict_ids {
            prop_assert!(relaxed_ids.contains(id));
        }
    }

    #[test]
    fn genre_filter_is_match_any(
        seeds in prop::collection::vec(movie_seed(), 1..30),
        wanted in subsequence(GENRES.to_vec(), 1..=3),
    ) {
        let catalog: Vec<Movie> = seeds.iter().map(build_movie).collect();
        let criteria = FilterCriteria {
            genres: wanted.iter().map(|g| g.to_string()).collect(),
            take: 100,
            ..FilterCriteria::default()
        };

        let results = block_on(run_query(&catalog, &[criteria]));
        let (ids, _) = &results[0];
        for movie in &catalog {
            let hit = movie.genres.iter().any(|g| wanted.contains(&g.as_str()));
            prop_assert_eq!(ids.contains(&movie.id), hit);
        }
    }
}

#[tokio::test]
async fn duration_bounds_are_inclusive() {
    let date = NaiveDate::from_ymd_opt(2010, 7, 16).unwrap();
    let catalog: Vec<Movie> = [85, 90, 105, 120, 130]
        .into_iter()
        .map(|d| {
            MovieFactory::create_movie(&format!("Film {}", d), date, d, AgeRating::Free, None)
                .unwrap()
        })
        .collect();

    let criteria = FilterCriteria {
        min_duration: Some(90),
        max_duration: Some(120),
        ..FilterCriteria::default()
    };
    let inverted = FilterCriteria {
        min_duration: Some(120),
        max_duration: Some(90),
        ..FilterCriteria::default()
    };

    let results = run_query(&catalog, &[criteria, inverted]).await;
    let (ids, total) = &results[0];
    assert_eq!(*total, 3);

    let mut durations: Vec<u32> = catalog
        .iter()
        .filter(|m| ids.contains(&m.id))
        .map(|m| m.duration)
        .collect();
    durations.sort();
    assert_eq!(durations, vec![90, 105, 120]);

    // 区间为空时返回空结果而不是报错
    assert_eq!(results[1].1, 0);
}

#[tokio::test]
async fn search_escapes_like_wildcards() {
    let date = NaiveDate::from_ymd_opt(2010, 7, 16).unwrap();
    let catalog: Vec<Movie> = ["100% Love", "1000 Years", "Under_score", "Underscore"]
        .into_iter()
        .map(|t| MovieFactory::create_movie(t, date, 100, AgeRating::Free, None).unwrap())
        .collect();

    let percent = FilterCriteria {
        search: Some("100%".into()),
        ..FilterCriteria::default()
    };
    let underscore = FilterCriteria {
        search: Some("_".into()),
        ..FilterCriteria::default()
    };

    let results = run_query(&catalog, &[percent, underscore]).await;
    assert_eq!(results[0].1, 1);
    assert_eq!(results[1].1, 1);
}

#[tokio::test]
async fn release_date_bounds_are_inclusive() {
    let dates = [
        (1998, 12, 31),
        (1999, 1, 1),
        (2001, 6, 15),
        (2003, 12, 31),
        (2004, 1, 1),
    ];
    let catalog: Vec<Movie> = dates
        .into_iter()
        .map(|(y, m, d)| {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            MovieFactory::create_movie(&format!("Film {}", y), date, 100, AgeRating::Free, None)
                .unwrap()
        })
        .collect();

    let between = FilterCriteria {
        start_date: NaiveDate::from_ymd_opt(1999, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2003, 12, 31),
        sort_by: SortBy::ReleaseDate,
        order: SortOrder::Asc,
        ..FilterCriteria::default()
    };
    let single_day = FilterCriteria {
        start_date: NaiveDate::from_ymd_opt(2001, 6, 15),
        end_date: NaiveDate::from_ymd_opt(2001, 6, 15),
        ..FilterCriteria::default()
    };
    let open_start = FilterCriteria {
        end_date: NaiveDate::from_ymd_opt(1999, 1, 1),
        ..FilterCriteria::default()
    };

    let results = run_query(&catalog, &[between, single_day, open_start]).await;
    let (ids, total) = &results[0];
    assert_eq!(*total, 3);
    let expected: Vec<String> = catalog[1..4].iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, &expected);

    assert_eq!(results[1].1, 1);
    assert_eq!(results[1].0, vec![catalog[2].id.clone()]);
    assert_eq!(results[2].1, 2);
}
