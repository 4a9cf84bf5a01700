//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Discovery passes and emitted recommendations
//! - Add-to-library attempts
//! - External services (Radarr, TMDB)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Discovery
// =============================================================================

/// Discovery passes by outcome.
pub static DISCOVERY_PASSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinescout_discovery_passes_total", "Total discovery passes"),
        &["outcome"], // "completed", "exhausted", "cancelled", "skipped"
    )
    .expect("valid metric definition")
});

/// Recommendations accepted and emitted to observers.
pub static RECOMMENDATIONS_EMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinescout_recommendations_emitted_total",
        "Total recommendations emitted",
    )
    .expect("valid metric definition")
});

/// Add-to-library attempts by classification.
pub static ADD_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinescout_add_attempts_total", "Total add-to-library attempts"),
        &["result"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// External services
// =============================================================================

/// Requests to external services by result.
pub static EXTERNAL_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinescout_external_requests_total",
            "Total requests to external services",
        ),
        &["service", "result"], // service: "radarr", "tmdb"; result: "success", "rejected", "error"
    )
    .expect("valid metric definition")
});

/// Every core metric, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DISCOVERY_PASSES.clone()),
        Box::new(RECOMMENDATIONS_EMITTED.clone()),
        Box::new(ADD_ATTEMPTS.clone()),
        Box::new(EXTERNAL_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_registers_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        DISCOVERY_PASSES.with_label_values(&["completed"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"cinescout_discovery_passes_total".to_string()));
    }
}
