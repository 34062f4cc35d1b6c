//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Pass outcomes and durations
//! - Page fetches and failures
//! - Upsert and prune volumes
//! - Live per-domain progress
//! - Service state
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `mirror_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)

use metrics::{counter, gauge, histogram};
use std::time::Duration;

use crate::domain::Domain;

/// Record the outcome of a sync pass ("converged", "skipped", "aborted", "error").
pub fn record_pass_outcome(domain: Domain, outcome: &str) {
    counter!("mirror_passes_total", "domain" => domain.as_str(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Record how long a pass took, end to end.
pub fn record_pass_duration(domain: Domain, duration: Duration) {
    histogram!("mirror_pass_duration_seconds", "domain" => domain.as_str())
        .record(duration.as_secs_f64());
}

/// Record a skipped pass and why ("fingerprint" or "in_flight").
pub fn record_skip(domain: Domain, reason: &str) {
    counter!("mirror_skips_total", "domain" => domain.as_str(), "reason" => reason.to_string())
        .increment(1);
}

/// Record pages fetched successfully during a pass.
pub fn record_pages_fetched(domain: Domain, count: usize) {
    counter!("mirror_pages_fetched_total", "domain" => domain.as_str()).increment(count as u64);
}

/// Record a non-mandatory page fetch failure (pass degrades, continues).
pub fn record_page_failure(domain: Domain) {
    counter!("mirror_page_failures_total", "domain" => domain.as_str()).increment(1);
}

/// Record items upserted into the local store.
pub fn record_items_upserted(domain: Domain, count: usize) {
    counter!("mirror_items_upserted_total", "domain" => domain.as_str()).increment(count as u64);
}

/// Record local records deleted by pruning.
pub fn record_pruned(domain: Domain, count: usize) {
    counter!("mirror_records_pruned_total", "domain" => domain.as_str()).increment(count as u64);
}

/// Record an unauthorized response (caller must re-authenticate).
pub fn record_unauthorized(domain: Domain) {
    counter!("mirror_unauthorized_total", "domain" => domain.as_str()).increment(1);
}

/// Gauge of live pass progress per domain.
pub fn set_progress(domain: Domain, synced: usize, total: usize) {
    gauge!("mirror_progress_synced", "domain" => domain.as_str()).set(synced as f64);
    gauge!("mirror_progress_total", "domain" => domain.as_str()).set(total as f64);
}

/// Gauge for service state.
pub fn set_service_state(state: &str) {
    // Encode state as numeric for alerting (0=created, 1=running, ...)
    let value = match state {
        "Created" => 0.0,
        "Running" => 1.0,
        "ShuttingDown" => 2.0,
        "Stopped" => 3.0,
        _ => -1.0,
    };
    gauge!("mirror_service_state").set(value);
}
