//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::types::{TmdbCandidate, TmdbMovie};
use super::{ExternalCatalogError, RecommendationGraph};
use crate::config::{SharedConnection, TmdbConfig};
use crate::metrics::EXTERNAL_REQUESTS;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB API client.
///
/// The API key is read from the shared connection settings on every request.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    connection: SharedConnection,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(
        config: &TmdbConfig,
        connection: SharedConnection,
    ) -> Result<Self, ExternalCatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let image_base_url = config
            .image_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            connection,
        })
    }

    async fn api_key(&self) -> Result<String, ExternalCatalogError> {
        let key = self.connection.read().await.tmdb_api_key.clone();
        if key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }
        Ok(key)
    }

    /// Full-size artwork URL for a poster path.
    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/original/{}",
            self.image_base_url,
            poster_path.trim_start_matches('/')
        )
    }
}

/// Map TMDB status codes onto catalog errors.
async fn check_status(response: Response, what: &str) -> Result<Response, ExternalCatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    EXTERNAL_REQUESTS
        .with_label_values(&["tmdb", "error"])
        .inc();

    match status.as_u16() {
        401 => Err(ExternalCatalogError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        )),
        404 => Err(ExternalCatalogError::NotFound(what.to_string())),
        429 => Err(ExternalCatalogError::RateLimitExceeded),
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(ExternalCatalogError::ApiError {
                status: code,
                message: body,
            })
        }
    }
}

#[async_trait]
impl RecommendationGraph for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        let url = format!("{}/search/movie", self.base_url);
        let api_key = self.api_key().await?;

        debug!("TMDB movie search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key.as_str()), ("query", query)])
            .send()
            .await?;
        let response = check_status(response, &format!("search '{}'", query)).await?;

        let search_result: TmdbPage<TmdbMovieResult> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!(
                "Failed to parse movie search response: {}",
                e
            ))
        })?;

        EXTERNAL_REQUESTS
            .with_label_values(&["tmdb", "success"])
            .inc();

        Ok(search_result
            .results
            .into_iter()
            .map(TmdbMovie::from)
            .collect())
    }

    async fn recommendations(
        &self,
        tmdb_id: u32,
    ) -> Result<Vec<TmdbCandidate>, ExternalCatalogError> {
        let url = format!("{}/movie/{}/recommendations", self.base_url, tmdb_id);
        let api_key = self.api_key().await?;

        debug!("TMDB recommendations: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key.as_str())])
            .send()
            .await?;
        let response = check_status(response, &format!("Movie ID {}", tmdb_id)).await?;

        let page: TmdbPage<TmdbRecommendationResult> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!(
                "Failed to parse recommendations response: {}",
                e
            ))
        })?;

        EXTERNAL_REQUESTS
            .with_label_values(&["tmdb", "success"])
            .inc();

        Ok(page
            .results
            .into_iter()
            .map(|r| r.into_candidate(self))
            .collect())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbRecommendationResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    original_language: Option<String>,
    genre_ids: Option<Vec<u32>>,
    popularity: Option<f64>,
    overview: Option<String>,
    poster_path: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbMovieResult> for TmdbMovie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            original_title: r.original_title,
            release_date: r.release_date,
        }
    }
}

impl TmdbRecommendationResult {
    fn into_candidate(self, client: &TmdbClient) -> TmdbCandidate {
        TmdbCandidate {
            id: self.id,
            title: self.title,
            original_title: self.original_title,
            release_date: self.release_date.filter(|d| !d.is_empty()),
            vote_average: self.vote_average.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            original_language: self.original_language.unwrap_or_else(|| "en".to_string()),
            genre_ids: self.genre_ids.unwrap_or_default(),
            popularity: self.popularity,
            overview: self.overview,
            poster_url: self
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|p| client.poster_url(&p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared_connection, ConnectionSettings};

    fn client() -> TmdbClient {
        TmdbClient::new(
            &TmdbConfig::default(),
            shared_connection(ConnectionSettings::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_movie_result_conversion() {
        let result = TmdbMovieResult {
            id: 603,
            title: "The Matrix".to_string(),
            original_title: Some("The Matrix".to_string()),
            release_date: Some("1999-03-30".to_string()),
        };

        let movie: TmdbMovie = result.into();
        assert_eq!(movie.id, 603);
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.release_year(), Some("1999"));
    }

    #[test]
    fn test_recommendation_conversion_fills_defaults() {
        let raw: TmdbRecommendationResult = serde_json::from_str(
            r#"{"id": 157336, "title": "Interstellar", "release_date": "", "poster_path": null}"#,
        )
        .unwrap();

        let candidate = raw.into_candidate(&client());
        assert_eq!(candidate.id, 157336);
        assert_eq!(candidate.vote_average, 0.0);
        assert_eq!(candidate.vote_count, 0);
        assert_eq!(candidate.original_language, "en");
        assert!(candidate.release_date.is_none());
        assert!(candidate.poster_url.is_none());
    }

    #[test]
    fn test_poster_url_is_absolute() {
        let raw: TmdbRecommendationResult = serde_json::from_str(
            r#"{"id": 1, "title": "Heat", "poster_path": "/abc.jpg", "vote_average": 8.3,
                "vote_count": 7000, "original_language": "en", "genre_ids": [28, 80]}"#,
        )
        .unwrap();

        let candidate = raw.into_candidate(&client());
        assert_eq!(
            candidate.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/original/abc.jpg")
        );
        assert_eq!(candidate.genre_ids, vec![28, 80]);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let result = client().search_movies("Inception").await;
        assert!(matches!(result, Err(ExternalCatalogError::NotConfigured(_))));
    }
}
