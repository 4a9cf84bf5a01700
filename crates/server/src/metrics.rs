//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Discovery engine status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tracing::error;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinescout_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinescout_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cinescout_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .expect("valid metric definition")
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinescout_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .expect("valid metric definition")
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinescout_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .expect("valid metric definition")
});

/// WebSocket commands received by type.
pub static WS_COMMANDS_RECEIVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinescout_ws_commands_received_total",
            "WebSocket commands received",
        ),
        &["command"],
    )
    .expect("valid metric definition")
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinescout_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Discovery Status
// =============================================================================

pub static DISCOVERY_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cinescout_discovery_running",
        "Whether a discovery run is active (1) or not (0)",
    )
    .expect("valid metric definition")
});

pub static DISCOVERY_RESULTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cinescout_discovery_results",
        "Recommendations accumulated in the current run",
    )
    .expect("valid metric definition")
});

pub static LIBRARY_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cinescout_library_items",
        "Movies in the library snapshot",
    )
    .expect("valid metric definition")
});

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(WS_CONNECTIONS_TOTAL.clone()),
        Box::new(WS_MESSAGES_SENT.clone()),
        Box::new(WS_COMMANDS_RECEIVED.clone()),
        Box::new(WS_LAG_EVENTS.clone()),
        Box::new(DISCOVERY_RUNNING.clone()),
        Box::new(DISCOVERY_RESULTS.clone()),
        Box::new(LIBRARY_ITEMS.clone()),
    ];

    // Core metrics (discovery passes, add attempts, external services)
    for metric in server_metrics
        .into_iter()
        .chain(cinescout_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Update gauges from the current engine state before encoding.
pub async fn collect_dynamic_metrics(state: &AppState) {
    let status = state.engine().status().await;
    DISCOVERY_RUNNING.set(i64::from(status.running));
    DISCOVERY_RESULTS.set(status.results as i64);
    LIBRARY_ITEMS.set(status.library_items as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        WS_CONNECTIONS_TOTAL.inc();
        let output = encode_metrics();
        assert!(output.contains("# HELP cinescout_ws_connections_total"));
        assert!(output.contains("# TYPE cinescout_ws_connections_total counter"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        cinescout_core::metrics::ADD_ATTEMPTS
            .with_label_values(&["added"])
            .inc();
        let names: Vec<String> = REGISTRY
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"cinescout_add_attempts_total".to_string()));
        assert!(names.contains(&"cinescout_library_items".to_string()));
    }
}
