//! Recommendation graph integration (TMDB).
//!
//! The discovery engine only needs two operations from the graph: a free-text
//! movie search used to resolve library titles to TMDB ids, and the list of
//! movies TMDB recommends for a given id.

mod tmdb;
mod types;

pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with the recommendation graph.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Source of movie identities and related-title recommendations.
#[async_trait]
pub trait RecommendationGraph: Send + Sync {
    /// Search for movies by free text, in the order the service ranks them.
    async fn search_movies(&self, query: &str) -> Result<Vec<TmdbMovie>, ExternalCatalogError>;

    /// Movies related to the given TMDB id, unfiltered.
    async fn recommendations(
        &self,
        tmdb_id: u32,
    ) -> Result<Vec<TmdbCandidate>, ExternalCatalogError>;
}
