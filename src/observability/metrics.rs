//! Metrics collection and exposition.
//!
//! # Metrics
//! - `segment_router_requests_total` (counter): requests by method, status, route reason
//! - `segment_router_request_duration_seconds` (histogram): end-to-end latency
//! - `segment_router_classifications_total` (counter): outcomes by classifier
//! - `segment_router_classify_errors_total` (counter): aborted runs by classifier
//! - `segment_router_config_reloads_total` (counter): applied reloads

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished proxied request.
pub fn record_request(method: &str, status: u16, reason: &'static str, start: Instant) {
    counter!(
        "segment_router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "reason" => reason
    )
    .increment(1);
    histogram!("segment_router_request_duration_seconds", "reason" => reason)
        .record(start.elapsed().as_secs_f64());
}

/// Record a classification outcome.
pub fn record_classification(classifier: &str, outcome: &'static str) {
    counter!(
        "segment_router_classifications_total",
        "classifier" => classifier.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record an aborted classification run.
pub fn record_classify_error(classifier: &str) {
    counter!(
        "segment_router_classify_errors_total",
        "classifier" => classifier.to_string()
    )
    .increment(1);
}

/// Record an applied configuration reload.
pub fn record_config_reload() {
    counter!("segment_router_config_reloads_total").increment(1);
}
