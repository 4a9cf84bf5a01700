//! Accept/reject policy for recommendation candidates.

use std::fmt;

use super::mirror::CatalogMirror;
use super::types::Recommendation;
use crate::config::DiscoveryConfig;
use crate::external_catalog::TmdbCandidate;

/// Which original languages are acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFilter {
    All,
    Only(String),
}

impl LanguageFilter {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            LanguageFilter::All
        } else {
            LanguageFilter::Only(value.to_string())
        }
    }

    pub fn allows(&self, language: &str) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(code) => code == language,
        }
    }
}

/// Why a candidate was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    LowRating,
    TooFewVotes,
    Language,
    InLibrary,
    AlreadyRecommended,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::LowRating => "rating below minimum",
            Rejection::TooFewVotes => "too few votes",
            Rejection::Language => "language not allowed",
            Rejection::InLibrary => "already in library",
            Rejection::AlreadyRecommended => "already recommended",
        };
        f.write_str(reason)
    }
}

/// Minimum rating, minimum votes, language, and dedup against the library and
/// results already emitted in this run.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub minimum_rating: f32,
    pub minimum_votes: u32,
    pub language: LanguageFilter,
}

impl FilterPolicy {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            minimum_rating: config.minimum_rating,
            minimum_votes: config.minimum_votes,
            language: LanguageFilter::parse(&config.language),
        }
    }

    /// Check a candidate; `Ok(())` means accept.
    pub fn evaluate(
        &self,
        candidate: &TmdbCandidate,
        library: &CatalogMirror,
        accumulated: &[Recommendation],
    ) -> Result<(), Rejection> {
        if candidate.vote_average < self.minimum_rating {
            return Err(Rejection::LowRating);
        }
        if candidate.vote_count < self.minimum_votes {
            return Err(Rejection::TooFewVotes);
        }
        if !self.language.allows(&candidate.original_language) {
            return Err(Rejection::Language);
        }
        if library.contains(&candidate.title) {
            return Err(Rejection::InLibrary);
        }
        if accumulated.iter().any(|r| r.name == candidate.title) {
            return Err(Rejection::AlreadyRecommended);
        }
        Ok(())
    }

    pub fn accept(
        &self,
        candidate: &TmdbCandidate,
        library: &CatalogMirror,
        accumulated: &[Recommendation],
    ) -> bool {
        self.evaluate(candidate, library, accumulated).is_ok()
    }
}
