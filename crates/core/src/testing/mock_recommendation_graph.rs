//! Mock recommendation graph for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

use crate::external_catalog::{
    ExternalCatalogError, RecommendationGraph, TmdbCandidate, TmdbMovie,
};

/// A recorded graph query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedGraphQuery {
    SearchMovies { query: String },
    Recommendations { tmdb_id: u32 },
}

/// Mock implementation of the RecommendationGraph trait.
///
/// Provides controllable behavior for testing:
/// - Search results keyed by lowercase query
/// - Recommendation lists keyed by TMDB id
/// - Recorded queries for assertions
/// - Error injection, per call or per id
/// - A gate that holds recommendation calls until released
///
/// # Example
///
/// ```rust,ignore
/// use cinescout_core::testing::{MockRecommendationGraph, fixtures};
///
/// let graph = MockRecommendationGraph::new();
/// graph.add_seed(
///     fixtures::tmdb_movie(27205, "Inception", 2010),
///     vec![fixtures::candidate(157336, "Interstellar", 8.4, 30000)],
/// ).await;
/// ```
#[derive(Debug)]
pub struct MockRecommendationGraph {
    /// Search results by lowercase query.
    search_results: Arc<RwLock<HashMap<String, Vec<TmdbMovie>>>>,
    /// Recommendations by TMDB id.
    recommendations: Arc<RwLock<HashMap<u32, Vec<TmdbCandidate>>>>,
    /// Ids whose recommendations call fails.
    failing_ids: Arc<RwLock<HashSet<u32>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedGraphQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
    /// When set, recommendation calls wait for a permit.
    gate: Arc<RwLock<Option<Arc<Semaphore>>>>,
}

impl Default for MockRecommendationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecommendationGraph {
    pub fn new() -> Self {
        Self {
            search_results: Arc::new(RwLock::new(HashMap::new())),
            recommendations: Arc::new(RwLock::new(HashMap::new())),
            failing_ids: Arc::new(RwLock::new(HashSet::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            gate: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Make `movie` the search result for its own title.
    pub async fn add_search_result(&self, movie: TmdbMovie) {
        self.search_results
            .write()
            .await
            .entry(movie.title.to_lowercase())
            .or_default()
            .push(movie);
    }

    /// Replace the search results for a query.
    pub async fn set_search_results(&self, query: &str, results: Vec<TmdbMovie>) {
        self.search_results
            .write()
            .await
            .insert(query.to_lowercase(), results);
    }

    pub async fn set_recommendations(&self, tmdb_id: u32, candidates: Vec<TmdbCandidate>) {
        self.recommendations.write().await.insert(tmdb_id, candidates);
    }

    /// Register a searchable seed and its recommendations in one go.
    pub async fn add_seed(&self, movie: TmdbMovie, candidates: Vec<TmdbCandidate>) {
        self.set_recommendations(movie.id, candidates).await;
        self.add_search_result(movie).await;
    }

    /// Make every recommendations call for `tmdb_id` fail.
    pub async fn fail_recommendations_for(&self, tmdb_id: u32) {
        self.failing_ids.write().await.insert(tmdb_id);
    }

    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Hold recommendation calls until [`release`](Self::release) is called.
    pub async fn pause(&self) {
        *self.gate.write().await = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `calls` held recommendation calls proceed.
    pub async fn release(&self, calls: usize) {
        if let Some(gate) = self.gate.read().await.as_ref() {
            gate.add_permits(calls);
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub async fn recorded_queries(&self) -> Vec<RecordedGraphQuery> {
        self.queries.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedGraphQuery::SearchMovies { .. }))
            .count()
    }

    pub async fn recommendation_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedGraphQuery::Recommendations { .. }))
            .count()
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn take_error(&self) -> Option<ExternalCatalogError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedGraphQuery) {
        self.queries.write().await.push(query);
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.read().await.clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl RecommendationGraph for MockRecommendationGraph {
    async fn search_movies(&self, query: &str) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        self.record(RecordedGraphQuery::SearchMovies {
            query: query.to_string(),
        })
        .await;

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        Ok(self
            .search_results
            .read()
            .await
            .get(&query.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn recommendations(
        &self,
        tmdb_id: u32,
    ) -> Result<Vec<TmdbCandidate>, ExternalCatalogError> {
        self.record(RecordedGraphQuery::Recommendations { tmdb_id }).await;
        self.wait_for_gate().await;

        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        if self.failing_ids.read().await.contains(&tmdb_id) {
            return Err(ExternalCatalogError::ApiError {
                status: 500,
                message: "mock failure".to_string(),
            });
        }

        Ok(self
            .recommendations
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .unwrap_or_default())
    }
}
