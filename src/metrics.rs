//! Prometheus metrics.
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder (unit and integration tests) every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the global Prometheus recorder and return a render handle.
pub fn init() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count a finished clip/preview request with its HTTP status.
pub fn record_request(operation: &'static str, status: u16) {
    counter!(
        "streamclip_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(operation: &'static str, start: Instant) {
    histogram!("streamclip_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("streamclip_cache_lookups_total", "result" => result).increment(1);
}

/// One extra pass through the resolver loop (stale or empty secondary playlist).
pub fn record_resolve_retry(reason: &'static str) {
    counter!("streamclip_resolve_retries_total", "reason" => reason).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("streamclip_upstream_errors_total", "kind" => kind).increment(1);
}
