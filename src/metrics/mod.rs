//! Prometheus metrics for the leaderboard engine
//!
//! This module provides metrics tracking for:
//! - Scheduler: runs by status, per-category outcomes, ranked entries, run duration
//! - Readers: cache loads, single-subject badge queries, API requests
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, register_histogram_vec,
    Counter, CounterVec, Encoder, GaugeVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for snapshot run metrics
struct RunMetrics {
    runs: CounterVec,
    category_outcomes: CounterVec,
    ranked_entries: GaugeVec,
    run_duration: HistogramVec,
}

/// Container for read-path metrics
struct ReadMetrics {
    cache_loads: Counter,
    cache_categories: Counter,
    badge_queries: Counter,
    api_requests: CounterVec,
}

static RUN_METRICS: OnceLock<RunMetrics> = OnceLock::new();

static READ_METRICS: OnceLock<ReadMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. If registration fails, errors are returned and
/// subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = podium::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let run = RunMetrics {
        runs: register_counter_vec!(
            "podium_snapshot_runs_total",
            "Total snapshot runs by outcome",
            &["status", "triggered_by"]
        )?,
        category_outcomes: register_counter_vec!(
            "podium_category_outcomes_total",
            "Per-category snapshot attempts by outcome",
            &["category", "outcome"]
        )?,
        ranked_entries: register_gauge_vec!(
            "podium_ranked_entries",
            "Number of ranked subjects in the last persisted snapshot",
            &["category"]
        )?,
        run_duration: register_histogram_vec!(
            "podium_snapshot_run_duration_seconds",
            "Wall time of a full snapshot run in seconds",
            &["status"],
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]
        )?,
    };

    let read = ReadMetrics {
        cache_loads: register_counter!(
            "podium_cache_loads_total",
            "Total snapshot cache loads"
        )?,
        cache_categories: register_counter!(
            "podium_cache_categories_loaded_total",
            "Total categories indexed by snapshot cache loads"
        )?,
        badge_queries: register_counter!(
            "podium_badge_queries_total",
            "Total single-subject badge queries"
        )?,
        api_requests: register_counter_vec!(
            "podium_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
    };

    RUN_METRICS
        .set(run)
        .map_err(|_| "Run metrics already initialized")?;
    READ_METRICS
        .set(read)
        .map_err(|_| "Read metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    RUN_METRICS.get().is_some() && READ_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished snapshot run
pub fn record_run(status: &str, triggered_by: &str, duration_secs: f64) {
    let Some(m) = RUN_METRICS.get() else {
        return;
    };

    m.runs.with_label_values(&[status, triggered_by]).inc();
    m.run_duration
        .with_label_values(&[status])
        .observe(duration_secs);
}

/// Record one category attempt ("persisted" or "failed")
pub fn record_category_outcome(category: &str, outcome: &str) {
    if let Some(m) = RUN_METRICS.get() {
        m.category_outcomes
            .with_label_values(&[category, outcome])
            .inc();
    }
}

/// Update the ranked-entry gauge for a category
pub fn set_ranked_entries(category: &str, count: usize) {
    if let Some(m) = RUN_METRICS.get() {
        m.ranked_entries
            .with_label_values(&[category])
            .set(count as f64);
    }
}

/// Record a snapshot cache load
pub fn record_cache_load(categories: usize) {
    let Some(m) = READ_METRICS.get() else {
        return;
    };

    m.cache_loads.inc();
    m.cache_categories.inc_by(categories as f64);
}

/// Record a single-subject badge query
pub fn record_badge_query() {
    if let Some(m) = READ_METRICS.get() {
        m.badge_queries.inc();
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16) {
    if let Some(m) = READ_METRICS.get() {
        let status_str = status.to_string();
        m.api_requests
            .with_label_values(&[endpoint, &status_str])
            .inc();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_encode_metrics() {
        ensure_metrics_initialized();
        record_run("success", "scheduler", 0.2);
        let text = encode_metrics().unwrap();
        assert!(text.contains("podium_") || text.is_empty());
    }

    #[test]
    fn test_run_metrics() {
        ensure_metrics_initialized();
        record_category_outcome("most_liked", "persisted");
        record_category_outcome("top_teachers", "failed");
        set_ranked_entries("most_liked", 42);
        record_run("partial", "admin:1", 1.5);
    }

    #[test]
    fn test_read_metrics() {
        ensure_metrics_initialized();
        record_cache_load(8);
        record_badge_query();
        record_api_request("/api/health", 200);
    }

    #[test]
    fn test_metrics_noop_without_init() {
        // Must not panic whether or not another test initialized first
        record_run("failed", "scheduler", 0.0);
        record_category_outcome("x", "failed");
        set_ranked_entries("x", 0);
        record_cache_load(0);
        record_badge_query();
        record_api_request("/test", 500);
    }
}
