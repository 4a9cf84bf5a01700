//! Testing utilities and mock implementations.
//!
//! Mocks for both external services, so the engine and the server can be
//! exercised without a Radarr instance or a TMDB key.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinescout_core::testing::{fixtures, MockLibraryService, MockRecommendationGraph};
//!
//! let library = MockLibraryService::new();
//! library.set_movies(vec![fixtures::library_movie("Inception", 2010)]).await;
//!
//! let graph = MockRecommendationGraph::new();
//! graph.add_seed(fixtures::tmdb_movie(27205, "Inception", 2010), vec![]).await;
//! ```

mod mock_library;
mod mock_recommendation_graph;

pub use mock_library::MockLibraryService;
pub use mock_recommendation_graph::{MockRecommendationGraph, RecordedGraphQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::discovery::{Recommendation, RecommendationStatus};
    use crate::external_catalog::{TmdbCandidate, TmdbMovie};
    use crate::library::LibraryMovie;

    pub fn library_movie(title: &str, year: u32) -> LibraryMovie {
        LibraryMovie::new(title, Some(year))
    }

    /// Create a TMDB search hit.
    pub fn tmdb_movie(id: u32, title: &str, year: u32) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            original_title: None,
            release_date: Some(format!("{}-06-15", year)),
        }
    }

    /// Create a TMDB recommendation with the given score, in English.
    pub fn candidate(id: u32, title: &str, rating: f32, votes: u32) -> TmdbCandidate {
        TmdbCandidate {
            id,
            title: title.to_string(),
            original_title: None,
            release_date: Some("2016-11-11".to_string()),
            vote_average: rating,
            vote_count: votes,
            original_language: "en".to_string(),
            genre_ids: vec![18, 878],
            popularity: Some(42.0),
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            poster_url: None,
        }
    }

    /// Create a recommendation as the engine would have emitted it.
    pub fn recommendation(name: &str, year: &str) -> Recommendation {
        Recommendation {
            name: name.to_string(),
            year: year.to_string(),
            genres: vec!["Drama".to_string()],
            status: RecommendationStatus::None,
            artwork_url: crate::discovery::PLACEHOLDER_ARTWORK_URL.to_string(),
            vote_count: 1000,
            rating: 7.9,
            overview: String::new(),
            language: "en".to_string(),
            language_name: "English".to_string(),
            popularity: None,
            seed_title: "Inception".to_string(),
            tmdb_id: 1000 + name.len() as u32,
        }
    }
}
