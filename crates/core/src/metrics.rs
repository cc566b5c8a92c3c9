//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ordering engine calls (per operation, latency)
//! - Snapshot writes and throttling
//! - Lifecycle transitions
//!
//! The server registers these in its registry alongside HTTP metrics.

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ordering engine
// =============================================================================

/// Engine requests by operation and result.
pub static ENGINE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fixer_engine_requests_total",
            "Total requests sent to the ordering engine",
        ),
        &["operation", "result"], // result: "success", "not_found", "unavailable"
    )
    .unwrap()
});

/// Engine request latency in seconds.
pub static ENGINE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fixer_engine_request_duration_seconds",
            "Duration of ordering engine requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Snapshots
// =============================================================================

/// Snapshots persisted, by reason.
pub static SNAPSHOTS_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fixer_snapshots_written_total", "Total snapshots persisted"),
        &["reason"], // "baseline", "poll", "final"
    )
    .unwrap()
});

/// Polled observations skipped by the throttle.
pub static SNAPSHOTS_THROTTLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fixer_snapshots_throttled_total",
        "Polled observations not persisted because of the throttle window",
    )
    .unwrap()
});

/// Snapshot appends that failed.
pub static SNAPSHOT_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fixer_snapshot_write_failures_total",
        "Snapshot appends that failed",
    )
    .unwrap()
});

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle transitions by target state.
pub static LIFECYCLE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fixer_lifecycle_transitions_total",
            "Campaign lifecycle transitions",
        ),
        &["state"],
    )
    .unwrap()
});

/// Record one engine call.
pub fn record_engine_call(operation: &str, result: &str, elapsed: Duration) {
    ENGINE_REQUESTS
        .with_label_values(&[operation, result])
        .inc();
    ENGINE_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Engine
        Box::new(ENGINE_REQUESTS.clone()),
        Box::new(ENGINE_REQUEST_DURATION.clone()),
        // Snapshots
        Box::new(SNAPSHOTS_WRITTEN.clone()),
        Box::new(SNAPSHOTS_THROTTLED.clone()),
        Box::new(SNAPSHOT_WRITE_FAILURES.clone()),
        // Lifecycle
        Box::new(LIFECYCLE_TRANSITIONS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        record_engine_call("create", "success", Duration::from_millis(20));
        SNAPSHOTS_WRITTEN.with_label_values(&["baseline"]).inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"fixer_engine_requests_total".to_string()));
        assert!(names.contains(&"fixer_snapshots_written_total".to_string()));
    }
}
