use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;

use crate::error::AppResult;

/// Placeholder shown when the provider has no plot for a title.
pub const NO_SYNOPSIS: &str = "Sin descripción.";

/// OMDb's explicit absence sentinel, used across every field.
const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRecord {
    pub title: String,
    pub year: Option<i32>,
    pub synopsis: String,
    pub poster_url: Option<String>,
    /// Raw comma-separated genre list in the provider's language.
    pub genres: Option<String>,
    pub rating: f64,
    pub runtime: Option<String>,
}

/// Provider-reported "no such title" is an expected outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataOutcome {
    Found(MetadataRecord),
    NotFound,
}

#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Title-keyed lookup. `Err` means transport trouble and the caller
    /// should skip the item, never abort the batch.
    async fn fetch(&self, title: &str) -> AppResult<MetadataOutcome>;
}

pub struct OmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        rps: u32,
        timeout: Duration,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no OMDB_API_KEY provided, metadata lookups will fail");
        }

        let limiter =
            Arc::new(RateLimiter::direct(Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap())));
        Self { client, api_key, base_url, timeout, limiter }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbClient {
    async fn fetch(&self, title: &str) -> AppResult<MetadataOutcome> {
        self.limiter.until_ready().await;

        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let resp: OmdbResponse = self
            .client
            .get(url)
            .query(&[("t", title), ("apikey", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(normalize(resp))
    }
}

fn normalize(raw: OmdbResponse) -> MetadataOutcome {
    if !raw.response.eq_ignore_ascii_case("true") {
        return MetadataOutcome::NotFound;
    }
    let Some(title) = raw.title.filter(|t| !t.trim().is_empty()) else {
        return MetadataOutcome::NotFound;
    };

    MetadataOutcome::Found(MetadataRecord {
        title,
        year: raw.year.as_deref().and_then(extract_year),
        synopsis: normalize_synopsis(raw.plot.as_deref()),
        poster_url: present(raw.poster),
        genres: present(raw.genre),
        rating: parse_rating(raw.imdb_rating.as_deref()),
        runtime: present(raw.runtime),
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| {
        let s = s.trim();
        !s.is_empty() && s != NOT_AVAILABLE
    })
}

/// First run of four consecutive digits, so ranges like "2019–" and
/// "2019-2021" both yield 2019.
pub fn extract_year(raw: &str) -> Option<i32> {
    raw.as_bytes()
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|i| raw[i..i + 4].parse().ok())
}

pub fn parse_rating(raw: Option<&str>) -> f64 {
    match raw {
        Some(s) if s.trim() != NOT_AVAILABLE => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn normalize_synopsis(plot: Option<&str>) -> String {
    match plot {
        Some(s) if !s.trim().is_empty() && s.trim() != NOT_AVAILABLE => s.trim().to_string(),
        _ => NO_SYNOPSIS.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_extraction_handles_ranges() {
        assert_eq!(extract_year("2019"), Some(2019));
        assert_eq!(extract_year("2019–"), Some(2019));
        assert_eq!(extract_year("2019-2021"), Some(2019));
        assert_eq!(extract_year("N/A"), None);
        assert_eq!(extract_year(""), None);
        assert_eq!(extract_year("far future"), None);
    }

    #[test]
    fn rating_sentinel_maps_to_zero() {
        assert_eq!(parse_rating(Some("8.8")), 8.8);
        assert_eq!(parse_rating(Some("N/A")), 0.0);
        assert_eq!(parse_rating(Some("garbage")), 0.0);
        assert_eq!(parse_rating(None), 0.0);
    }

    #[test]
    fn found_response_is_normalized() {
        let raw: OmdbResponse = serde_json::from_str(
            r#"{
                "Title": "Blade Runner",
                "Year": "1982",
                "Plot": "A blade runner must pursue replicants.",
                "Poster": "https://img.example/blade.jpg",
                "Genre": "Sci-Fi, Thriller",
                "imdbRating": "8.1",
                "Runtime": "117 min",
                "Response": "True"
            }"#,
        )
        .unwrap();

        let MetadataOutcome::Found(rec) = normalize(raw) else {
            panic!("expected a hit");
        };
        assert_eq!(rec.title, "Blade Runner");
        assert_eq!(rec.year, Some(1982));
        assert_eq!(rec.rating, 8.1);
        assert_eq!(rec.genres.as_deref(), Some("Sci-Fi, Thriller"));
        assert_eq!(rec.runtime.as_deref(), Some("117 min"));
    }

    #[test]
    fn provider_miss_is_not_found() {
        let raw: OmdbResponse =
            serde_json::from_str(r#"{"Response": "False", "Error": "Movie not found!"}"#).unwrap();
        assert_eq!(normalize(raw), MetadataOutcome::NotFound);
    }

    #[test]
    fn missing_plot_and_poster_use_sentinel_rules() {
        let raw: OmdbResponse = serde_json::from_str(
            r#"{
                "Title": "Obscure Film",
                "Year": "1971",
                "Plot": "N/A",
                "Poster": "N/A",
                "Genre": "N/A",
                "imdbRating": "N/A",
                "Response": "True"
            }"#,
        )
        .unwrap();

        let MetadataOutcome::Found(rec) = normalize(raw) else {
            panic!("expected a hit");
        };
        assert_eq!(rec.synopsis, NO_SYNOPSIS);
        assert!(rec.poster_url.is_none());
        assert!(rec.genres.is_none());
        assert_eq!(rec.rating, 0.0);
    }
}
