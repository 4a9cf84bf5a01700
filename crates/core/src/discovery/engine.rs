//! The discovery run loop.
//!
//! A run starts from a seed selection and then proceeds in passes. Each pass
//! samples up to [`MAX_SEEDS_PER_PASS`] seeds, resolves them to TMDB ids,
//! fetches recommendations and emits every candidate the filter accepts.
//! Further passes are requested by observers ("load more").
//!
//! Only one pass body executes at a time (`pass_lock`). Cancellation is
//! cooperative: a pass checks the running flag and the run generation before
//! and after every external call and between candidates, so a stopped or
//! superseded run never emits another result.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::events::{DiscoveryEvent, EventBroadcaster};
use super::filter::FilterPolicy;
use super::mirror::CatalogMirror;
use super::resolver::IdentityResolver;
use super::types::{
    Continuation, DiscoveryError, DiscoveryStatus, LibraryItem, LibraryReport, PassOutcome,
    Recommendation, ReportStatus,
};
use crate::config::{Config, LibraryConfig, SharedConnection};
use crate::external_catalog::{RecommendationGraph, TmdbCandidate};
use crate::library::LibraryService;
use crate::metrics::{DISCOVERY_PASSES, RECOMMENDATIONS_EMITTED};

/// Seeds sampled per pass.
pub const MAX_SEEDS_PER_PASS: usize = 8;

/// Result set size handed to the first observer after nobody was watching.
pub const RESAMPLE_LIMIT: usize = 25;

const EXHAUSTED_TITLE: &str = "Search Exhausted";
const EXHAUSTED_MESSAGE: &str = "Try selecting more movies from your library";

/// Mutable state of the current run.
#[derive(Debug, Default)]
pub(super) struct RunState {
    pub(super) seeds: Vec<String>,
    pub(super) accumulated: Vec<Recommendation>,
    pub(super) continuation: Continuation,
}

/// Owns the library mirror and the run state.
///
/// Lock order is `state` then `mirror`; neither is held across an external call.
pub struct DiscoveryEngine {
    pub(super) library: Arc<dyn LibraryService>,
    pub(super) graph: Arc<dyn RecommendationGraph>,
    pub(super) connection: SharedConnection,
    pub(super) add_settings: LibraryConfig,
    pub(super) filter: FilterPolicy,
    pub(super) resolver: IdentityResolver,
    pub(super) events: EventBroadcaster,
    pub(super) mirror: RwLock<CatalogMirror>,
    pub(super) state: Mutex<RunState>,
    running: AtomicBool,
    generation: AtomicU64,
    pass_lock: Arc<Mutex<()>>,
    clients_connected: AtomicUsize,
}

impl DiscoveryEngine {
    pub fn new(
        config: &Config,
        library: Arc<dyn LibraryService>,
        graph: Arc<dyn RecommendationGraph>,
        connection: SharedConnection,
    ) -> Self {
        Self {
            library,
            graph,
            connection,
            add_settings: config.library.clone(),
            filter: FilterPolicy::from_config(&config.discovery),
            resolver: IdentityResolver::new(config.tmdb.fallback_to_top_result),
            events: EventBroadcaster::default(),
            mirror: RwLock::new(CatalogMirror::default()),
            state: Mutex::new(RunState::default()),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            pass_lock: Arc::new(Mutex::new(())),
            clients_connected: AtomicUsize::new(0),
        }
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Library mirror
    // =========================================================================

    /// Reload the library snapshot. The previous snapshot is kept on failure.
    ///
    /// Observers get a `library_refreshed` report either way.
    pub async fn refresh_library(&self, checked: bool) -> Result<usize, DiscoveryError> {
        info!("Refreshing library snapshot");

        match self.library.list_movies().await {
            Ok(movies) => {
                let mirror = CatalogMirror::from_movies(&movies, checked);
                let count = mirror.len();
                *self.mirror.write().await = mirror;
                info!("Library snapshot refreshed: {} movies", count);

                let report = self.report(ReportStatus::Success, None).await;
                self.events.emit(DiscoveryEvent::LibraryRefreshed(report));
                Ok(count)
            }
            Err(e) => {
                error!("Failed to refresh library: {}", e);
                let report = self.report(ReportStatus::Error, Some(e.to_string())).await;
                self.events.emit(DiscoveryEvent::LibraryRefreshed(report));
                Err(e.into())
            }
        }
    }

    /// Current snapshot, without contacting the library.
    pub async fn library_snapshot(&self) -> LibraryReport {
        self.report(ReportStatus::Success, None).await
    }

    pub async fn library_items(&self) -> Vec<LibraryItem> {
        self.mirror.read().await.items().to_vec()
    }

    async fn report(&self, status: ReportStatus, error: Option<String>) -> LibraryReport {
        let mirror = self.mirror.read().await;
        LibraryReport {
            status,
            items: mirror.items().to_vec(),
            running: self.is_running(),
            error,
            refreshed_at: mirror.refreshed_at(),
        }
    }

    // =========================================================================
    // Run lifecycle
    // =========================================================================

    /// Begin a run seeded by the library items named in `names`.
    ///
    /// Previous results are always cleared. Fails with
    /// [`DiscoveryError::NoSeedsSelected`] when none of the names are in the
    /// library; otherwise the first pass is spawned and its handle returned.
    pub async fn start(
        self: &Arc<Self>,
        names: &[String],
    ) -> Result<JoinHandle<PassOutcome>, DiscoveryError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let selected: HashSet<String> = names.iter().cloned().collect();

        let mut state = self.state.lock().await;
        state.accumulated.clear();
        state.continuation = Continuation::NotStarted;
        self.events.emit(DiscoveryEvent::ResultsCleared);

        let seeds = self.mirror.write().await.select(&selected);
        if seeds.is_empty() {
            state.seeds.clear();
            self.running.store(false, Ordering::SeqCst);
            drop(state);

            warn!(
                "Discovery start rejected: none of {} selected names are in the library",
                names.len()
            );
            self.events.emit(DiscoveryEvent::StartFailed {
                reason: DiscoveryError::NoSeedsSelected.to_string(),
                items: self.library_items().await,
                running: false,
            });
            return Err(DiscoveryError::NoSeedsSelected);
        }

        info!(
            "Starting discovery run {} with {} seeds",
            generation,
            seeds.len()
        );
        state.seeds = seeds;
        self.running.store(true, Ordering::SeqCst);
        drop(state);

        // Hold the pass slot before spawning; a load-more issued meanwhile is skipped.
        let claimed = Arc::clone(&self.pass_lock).try_lock_owned().ok();
        let engine = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _guard = match claimed {
                Some(guard) => guard,
                // A pass of the previous run is still finishing.
                None => Arc::clone(&engine.pass_lock).lock_owned().await,
            };
            if !engine.first_pass_pending().await {
                debug!("First pass of run {} already served", generation);
                return engine.skipped();
            }
            engine.record_pass(generation).await
        }))
    }

    /// Stop the current run. Accumulated results are kept.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Discovery stopped");
        } else {
            debug!("Discovery already stopped");
        }
    }

    /// Spawn another pass ("load more").
    pub fn load_more(self: &Arc<Self>) -> JoinHandle<PassOutcome> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_pass().await })
    }

    /// Run one pass of the current run.
    ///
    /// Returns [`PassOutcome::Skipped`] immediately when the engine is not
    /// running or another pass is in flight.
    pub async fn run_pass(&self) -> PassOutcome {
        if !self.is_running() {
            debug!("Pass skipped: discovery not running");
            return self.skipped();
        }
        let Ok(_guard) = self.pass_lock.try_lock() else {
            debug!("Pass skipped: another pass is in progress");
            return self.skipped();
        };
        let generation = self.generation.load(Ordering::SeqCst);
        self.record_pass(generation).await
    }

    /// Refresh the library with everything checked and start over all of it.
    pub async fn auto_start(self: &Arc<Self>) -> Result<JoinHandle<PassOutcome>, DiscoveryError> {
        self.refresh_library(true).await?;
        let names: Vec<String> = self
            .library_items()
            .await
            .into_iter()
            .map(|item| item.name)
            .collect();
        info!("Auto-starting discovery over {} library movies", names.len());
        self.start(&names).await
    }

    fn skipped(&self) -> PassOutcome {
        DISCOVERY_PASSES
            .with_label_values(&[PassOutcome::Skipped.as_str()])
            .inc();
        PassOutcome::Skipped
    }

    async fn first_pass_pending(&self) -> bool {
        self.state.lock().await.continuation == Continuation::NotStarted
    }

    /// Cancelled when stopped or superseded by a newer run.
    fn is_cancelled(&self, generation: u64) -> bool {
        !self.running.load(Ordering::SeqCst) || self.generation.load(Ordering::SeqCst) != generation
    }

    async fn record_pass(&self, generation: u64) -> PassOutcome {
        let outcome = if self.is_cancelled(generation) {
            PassOutcome::Skipped
        } else {
            self.pass(generation).await
        };
        DISCOVERY_PASSES.with_label_values(&[outcome.as_str()]).inc();
        outcome
    }

    async fn pass(&self, generation: u64) -> PassOutcome {
        let sample = {
            let state = self.state.lock().await;
            if state.continuation == Continuation::Exhausted {
                drop(state);
                self.report_exhausted();
                return PassOutcome::Exhausted;
            }
            sample_seeds(&state.seeds)
        };

        info!("Discovery pass over {} seeds", sample.len());
        let mut found = 0;
        for seed in &sample {
            if self.search_seed(seed, generation, &mut found).await.is_break() {
                info!("Discovery pass cancelled after {} new results", found);
                return PassOutcome::Cancelled { found };
            }
        }

        let mut state = self.state.lock().await;
        if self.is_cancelled(generation) {
            return PassOutcome::Cancelled { found };
        }
        if found > 0 {
            state.continuation = Continuation::Found;
            info!("Discovery pass completed with {} new results", found);
            PassOutcome::Completed { found }
        } else {
            state.continuation = Continuation::Exhausted;
            drop(state);
            info!("Discovery pass found nothing new");
            self.report_exhausted();
            PassOutcome::Exhausted
        }
    }

    /// Resolve one seed, fetch its recommendations and offer each to the filter.
    ///
    /// External failures only abandon this seed.
    async fn search_seed(&self, seed: &str, generation: u64, found: &mut usize) -> ControlFlow<()> {
        if self.is_cancelled(generation) {
            return ControlFlow::Break(());
        }

        let resolved = self.resolver.resolve(self.graph.as_ref(), seed, None).await;
        if self.is_cancelled(generation) {
            return ControlFlow::Break(());
        }
        let tmdb_id = match resolved {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!("No TMDB match for seed '{}'", seed);
                return ControlFlow::Continue(());
            }
            Err(e) => {
                warn!("Failed to resolve seed '{}': {}", seed, e);
                return ControlFlow::Continue(());
            }
        };

        let fetched = self.graph.recommendations(tmdb_id).await;
        if self.is_cancelled(generation) {
            return ControlFlow::Break(());
        }
        let candidates = match fetched {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    "Failed to fetch recommendations for seed '{}' ({}): {}",
                    seed, tmdb_id, e
                );
                return ControlFlow::Continue(());
            }
        };

        debug!(
            "Seed '{}' ({}) returned {} candidates",
            seed,
            tmdb_id,
            candidates.len()
        );
        for candidate in &candidates {
            if self.is_cancelled(generation) {
                return ControlFlow::Break(());
            }
            if self.accept_candidate(candidate, seed, generation).await {
                *found += 1;
            }
        }
        ControlFlow::Continue(())
    }

    /// Filter a candidate and, if accepted, append and emit it.
    ///
    /// Emission happens under the state lock so results reach observers in the
    /// order they were accepted and never after the run was superseded.
    async fn accept_candidate(&self, candidate: &TmdbCandidate, seed: &str, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if self.is_cancelled(generation) {
            return false;
        }

        let verdict = {
            let mirror = self.mirror.read().await;
            self.filter.evaluate(candidate, &mirror, &state.accumulated)
        };
        if let Err(reason) = verdict {
            debug!("Rejected '{}': {}", candidate.title, reason);
            return false;
        }

        let recommendation = Recommendation::from_candidate(candidate, seed);
        state.accumulated.push(recommendation.clone());
        RECOMMENDATIONS_EMITTED.inc();
        self.events
            .emit(DiscoveryEvent::ResultAdded { recommendation });
        true
    }

    fn report_exhausted(&self) {
        self.events.emit(DiscoveryEvent::SearchExhausted {
            title: EXHAUSTED_TITLE.to_string(),
            message: EXHAUSTED_MESSAGE.to_string(),
        });
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register an observer and return the results it should show.
    ///
    /// The first observer after nobody was watching gets a freshly shuffled
    /// set, resampled down to [`RESAMPLE_LIMIT`] items.
    pub async fn client_connected(&self) -> Vec<Recommendation> {
        let previous = self.clients_connected.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if previous == 0 && !state.accumulated.is_empty() {
            resample(&mut state.accumulated);
            debug!(
                "Resampled results to {} for first observer",
                state.accumulated.len()
            );
        }
        state.accumulated.clone()
    }

    pub fn client_disconnected(&self) {
        let _ = self
            .clients_connected
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });
    }

    pub fn clients_connected(&self) -> usize {
        self.clients_connected.load(Ordering::SeqCst)
    }

    pub async fn results(&self) -> Vec<Recommendation> {
        self.state.lock().await.accumulated.clone()
    }

    pub async fn status(&self) -> DiscoveryStatus {
        let (seeds, results, continuation) = {
            let state = self.state.lock().await;
            (state.seeds.len(), state.accumulated.len(), state.continuation)
        };
        let library_items = self.mirror.read().await.len();

        DiscoveryStatus {
            running: self.is_running(),
            search_in_progress: self.pass_lock.try_lock().is_err(),
            continuation,
            seeds,
            results,
            library_items,
            clients_connected: self.clients_connected(),
        }
    }
}

/// Up to [`MAX_SEEDS_PER_PASS`] distinct seeds in random order.
fn sample_seeds(seeds: &[String]) -> Vec<String> {
    let mut rng = rand::thread_rng();
    seeds
        .choose_multiple(&mut rng, MAX_SEEDS_PER_PASS)
        .cloned()
        .collect()
}

fn resample(results: &mut Vec<Recommendation>) {
    let mut rng = rand::thread_rng();
    results.shuffle(&mut rng);
    results.truncate(RESAMPLE_LIMIT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryMovie;
    use crate::testing::{fixtures, MockLibraryService, MockRecommendationGraph};

    fn engine(
        library: Arc<MockLibraryService>,
        graph: Arc<MockRecommendationGraph>,
    ) -> Arc<DiscoveryEngine> {
        let config = Config::default();
        let connection = crate::config::shared_connection(config.connection.clone());
        Arc::new(DiscoveryEngine::new(&config, library, graph, connection))
    }

    #[test]
    fn test_sample_seeds_bounded_and_distinct() {
        let seeds: Vec<String> = (0..20).map(|i| format!("Movie {}", i)).collect();
        let sample = sample_seeds(&seeds);
        assert_eq!(sample.len(), MAX_SEEDS_PER_PASS);
        let unique: HashSet<&String> = sample.iter().collect();
        assert_eq!(unique.len(), MAX_SEEDS_PER_PASS);

        let few = vec!["A".to_string(), "B".to_string()];
        assert_eq!(sample_seeds(&few).len(), 2);
    }

    #[test]
    fn test_resample_truncates() {
        let mut results: Vec<Recommendation> = (0..40)
            .map(|i| fixtures::recommendation(&format!("Movie {}", i), "2000"))
            .collect();
        resample(&mut results);
        assert_eq!(results.len(), RESAMPLE_LIMIT);
    }

    #[tokio::test]
    async fn test_run_pass_when_idle_is_skipped() {
        let engine = engine(
            Arc::new(MockLibraryService::new()),
            Arc::new(MockRecommendationGraph::new()),
        );
        assert_eq!(engine.run_pass().await, PassOutcome::Skipped);
        assert!(engine.results().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_snapshot() {
        let library = Arc::new(MockLibraryService::new());
        library
            .set_movies(vec![LibraryMovie::new("Inception", Some(2010))])
            .await;
        let engine = engine(library.clone(), Arc::new(MockRecommendationGraph::new()));
        assert_eq!(engine.refresh_library(false).await.unwrap(), 1);

        let mut events = engine.subscribe();
        library
            .set_next_error(crate::library::LibraryError::NotConfigured(
                "missing key".to_string(),
            ))
            .await;
        assert!(engine.refresh_library(false).await.is_err());

        assert_eq!(engine.library_items().await.len(), 1);
        match events.recv().await.unwrap() {
            DiscoveryEvent::LibraryRefreshed(report) => {
                assert_eq!(report.status, ReportStatus::Error);
                assert_eq!(report.items.len(), 1);
                assert!(report.error.is_some());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_counter_saturates() {
        let engine = engine(
            Arc::new(MockLibraryService::new()),
            Arc::new(MockRecommendationGraph::new()),
        );
        engine.client_disconnected();
        assert_eq!(engine.clients_connected(), 0);

        engine.client_connected().await;
        engine.client_connected().await;
        assert_eq!(engine.clients_connected(), 2);
        engine.client_disconnected();
        assert_eq!(engine.clients_connected(), 1);
    }
}
