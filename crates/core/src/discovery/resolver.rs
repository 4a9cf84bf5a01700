//! Resolve free-text titles to TMDB ids.

use tracing::debug;

use super::normalize::{similarity, title_key};
use crate::external_catalog::{ExternalCatalogError, RecommendationGraph, TmdbMovie};

/// Similarity a search hit must exceed to count as the same movie.
pub const MATCH_THRESHOLD: f64 = 90.0;

/// Picks the TMDB search hit that matches a title.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    fallback_to_top_result: bool,
}

impl IdentityResolver {
    pub fn new(fallback_to_top_result: bool) -> Self {
        Self {
            fallback_to_top_result,
        }
    }

    /// Search TMDB for `title` and pick a match.
    ///
    /// `Ok(None)` means nothing matched; errors are transport or service failures.
    pub async fn resolve(
        &self,
        graph: &dyn RecommendationGraph,
        title: &str,
        year: Option<&str>,
    ) -> Result<Option<u32>, ExternalCatalogError> {
        let results = graph.search_movies(title).await?;
        let picked = self.pick(title, year, &results);
        debug!(
            "Resolved '{}' ({:?}) to {:?} from {} results",
            title,
            year,
            picked,
            results.len()
        );
        Ok(picked)
    }

    /// First result, in service order, that is close enough to `title` and
    /// has the requested release year.
    pub fn pick(&self, title: &str, year: Option<&str>, results: &[TmdbMovie]) -> Option<u32> {
        let close_match = results
            .iter()
            .find(|movie| title_score(title, movie) > MATCH_THRESHOLD && year_matches(movie, year))
            .map(|movie| movie.id);

        if close_match.is_some() || !self.fallback_to_top_result {
            return close_match;
        }

        results
            .iter()
            .find(|movie| year_matches(movie, year))
            .map(|movie| movie.id)
    }
}

/// Best similarity between `title` and either the movie's title or original title.
pub fn title_score(title: &str, movie: &TmdbMovie) -> f64 {
    let query = title_key(title);
    let by_title = similarity(&query, &title_key(&movie.title));
    let by_original = movie
        .original_title
        .as_deref()
        .map(|original| similarity(&query, &title_key(original)))
        .unwrap_or(0.0);
    by_title.max(by_original)
}

fn year_matches(movie: &TmdbMovie, year: Option<&str>) -> bool {
    year.map_or(true, |y| movie.release_year() == Some(y))
}
