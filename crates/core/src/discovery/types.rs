//! Types for the discovery engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::{genre_name, language_name};
use crate::external_catalog::{ExternalCatalogError, TmdbCandidate};
use crate::library::LibraryError;

/// Artwork shown when TMDB has no poster for a movie.
pub const PLACEHOLDER_ARTWORK_URL: &str = "https://via.placeholder.com/300x200";

/// Year reported when TMDB has no release date.
pub const UNKNOWN_YEAR: &str = "0000";

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// None of the requested names are in the library.
    #[error("No library movies selected")]
    NoSeedsSelected,

    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    #[error("catalog error: {0}")]
    Catalog(#[from] ExternalCatalogError),
}

/// A movie in the library snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Normalized name (accents stripped, year suffix removed).
    pub name: String,
    /// Whether the movie is part of the current seed selection.
    pub checked: bool,
}

/// Where a recommendation stands with respect to the library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    #[default]
    None,
    Added,
    AlreadyInLibrary,
    InvalidPath,
    InvalidIdentity,
    Failed,
}

/// A movie suggested because it is related to one of the seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub year: String,
    pub genres: Vec<String>,
    pub status: RecommendationStatus,
    pub artwork_url: String,
    pub vote_count: u32,
    pub rating: f32,
    pub overview: String,
    /// ISO 639-1 code of the original language.
    pub language: String,
    /// Display name of `language`, e.g. "English".
    pub language_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    /// The library movie this was found through.
    pub seed_title: String,
    pub tmdb_id: u32,
}

impl Recommendation {
    /// Build a recommendation from an accepted candidate.
    pub fn from_candidate(candidate: &TmdbCandidate, seed_title: &str) -> Self {
        Self {
            name: candidate.title.clone(),
            year: candidate
                .release_year()
                .unwrap_or(UNKNOWN_YEAR)
                .to_string(),
            genres: candidate
                .genre_ids
                .iter()
                .map(|code| genre_name(*code).to_string())
                .collect(),
            status: RecommendationStatus::None,
            artwork_url: candidate
                .poster_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_ARTWORK_URL.to_string()),
            vote_count: candidate.vote_count,
            rating: candidate.vote_average,
            overview: candidate.overview.clone().unwrap_or_default(),
            language: candidate.original_language.clone(),
            language_name: language_name(&candidate.original_language),
            popularity: candidate.popularity,
            seed_title: seed_title.to_string(),
            tmdb_id: candidate.id,
        }
    }
}

/// Result of an add-to-library attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyInLibrary,
    InvalidPath,
    InvalidIdentity,
    Failed,
    /// No TMDB id could be found for the title.
    FailedNoMatch,
}

impl AddOutcome {
    /// Status recorded on the matching recommendation.
    pub fn status(self) -> RecommendationStatus {
        match self {
            AddOutcome::Added => RecommendationStatus::Added,
            AddOutcome::AlreadyInLibrary => RecommendationStatus::AlreadyInLibrary,
            AddOutcome::InvalidPath => RecommendationStatus::InvalidPath,
            AddOutcome::InvalidIdentity => RecommendationStatus::InvalidIdentity,
            AddOutcome::Failed | AddOutcome::FailedNoMatch => RecommendationStatus::Failed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddOutcome::Added => "added",
            AddOutcome::AlreadyInLibrary => "already_in_library",
            AddOutcome::InvalidPath => "invalid_path",
            AddOutcome::InvalidIdentity => "invalid_identity",
            AddOutcome::Failed => "failed",
            AddOutcome::FailedNoMatch => "failed_no_match",
        }
    }
}

/// Whether another pass is worth running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// Run started, no pass finished yet.
    #[default]
    NotStarted,
    /// The last pass found at least one new recommendation.
    Found,
    /// The last pass found nothing new.
    Exhausted,
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Not running, or another pass already in flight.
    Skipped,
    /// Stopped part way through.
    Cancelled { found: usize },
    Completed { found: usize },
    /// Nothing new was found.
    Exhausted,
}

impl PassOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassOutcome::Skipped => "skipped",
            PassOutcome::Cancelled { .. } => "cancelled",
            PassOutcome::Completed { .. } => "completed",
            PassOutcome::Exhausted => "exhausted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Error,
}

/// Library snapshot as reported to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryReport {
    pub status: ReportStatus,
    pub items: Vec<LibraryItem>,
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryStatus {
    pub running: bool,
    pub search_in_progress: bool,
    pub continuation: Continuation,
    pub seeds: usize,
    pub results: usize,
    pub library_items: usize,
    pub clients_connected: usize,
}
