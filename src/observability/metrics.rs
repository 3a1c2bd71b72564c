//! Metrics collection and exposition.
//!
//! # Metrics
//! - `console_requests_total` (counter): requests by method and outcome
//! - `console_request_failures_total` (counter): failures by cause
//! - `console_request_duration_seconds` (histogram): round-trip latency
//! - `console_poll_ticks_skipped_total` (counter): ticks dropped while a poll was in flight
//! - `console_stale_responses_total` (counter): responses discarded by the sequence guard
//! - `console_connected` (gauge): 1=connected, 0=disconnected

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("console_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("console_request_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_failure(cause: &'static str) {
    metrics::counter!("console_request_failures_total", "cause" => cause).increment(1);
}

pub fn record_skipped_tick(resource: &str) {
    metrics::counter!("console_poll_ticks_skipped_total", "resource" => resource.to_string())
        .increment(1);
}

pub fn record_stale_response(resource: &str) {
    metrics::counter!("console_stale_responses_total", "resource" => resource.to_string())
        .increment(1);
}

pub fn record_connection(connected: bool) {
    metrics::gauge!("console_connected").set(if connected { 1.0 } else { 0.0 });
}
