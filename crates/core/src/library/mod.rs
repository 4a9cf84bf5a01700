//! Library service integration (Radarr).
//!
//! The library is the user's existing movie collection. Discovery reads it to
//! pick seeds and to avoid recommending what is already there, and the add
//! workflow submits new movies to it.

mod radarr;
mod types;

pub use radarr::RadarrClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the library service. "Movie rejected" is not an error; it is
/// reported through [`AddMovieResponse`].
#[derive(Debug, Error)]
pub enum LibraryError {
    /// HTTP request failed (connection, timeout, ...).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service answered with an unexpected status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing URL or API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// The user's movie library.
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// List every movie currently in the library.
    async fn list_movies(&self) -> Result<Vec<LibraryMovie>, LibraryError>;

    /// Ask the library to add a movie.
    async fn add_movie(&self, request: &AddMovieRequest) -> Result<AddMovieResponse, LibraryError>;
}
