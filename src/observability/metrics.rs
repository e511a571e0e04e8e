//! Metrics collection and exposition.
//!
//! # Metrics
//! - `conf_api_requests_total` (counter): update requests by status code
//! - `conf_api_request_duration_seconds` (histogram): end-to-end update latency
//! - `conf_api_reloads_total` (counter): reload attempts by result
//! - `conf_api_reload_duration_seconds` (histogram): reload command latency
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished update request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    counter!(
        "conf_api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("conf_api_request_duration_seconds", "method" => method.to_string())
        .record(duration);
}

/// Record one reload attempt.
pub fn record_reload(result: &'static str, start: Instant) {
    counter!("conf_api_reloads_total", "result" => result).increment(1);
    histogram!("conf_api_reload_duration_seconds").record(start.elapsed().as_secs_f64());
}
