//! Prometheus metrics for request and backend monitoring.
//!
//! This module provides metrics for:
//! - HTTP request counts and latency per route
//! - Backend search latency and failures
//! - Readiness probe outcomes
//! - Handler panics and timeouts

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::GatewayError;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Backend search latency metric name.
pub const METRIC_SEARCH_LATENCY: &str = "backend_search_latency_ms";
/// Backend search failures counter metric name.
pub const METRIC_SEARCH_FAILURES: &str = "backend_search_failures_total";
/// Readiness probes counter metric name.
pub const METRIC_READINESS_PROBES: &str = "readiness_probes_total";
/// Handler panics counter metric name.
pub const METRIC_HANDLER_PANICS: &str = "handler_panics_total";
/// Request timeouts counter metric name.
pub const METRIC_REQUEST_TIMEOUTS: &str = "request_timeouts_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_SEARCH_LATENCY,
        "Successful backend search latency in milliseconds"
    );
    describe_counter!(
        METRIC_SEARCH_FAILURES,
        "Total number of failed backend searches"
    );
    describe_counter!(
        METRIC_READINESS_PROBES,
        "Total number of startup readiness probes"
    );
    describe_counter!(
        METRIC_HANDLER_PANICS,
        "Total number of handler panics caught"
    );
    describe_counter!(
        METRIC_REQUEST_TIMEOUTS,
        "Total number of requests cut off by the request timeout"
    );

    debug!("Metrics initialized");
}

/// Serve `/metrics` in Prometheus text format on its own port.
pub fn install_exporter(port: u16) -> Result<(), GatewayError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GatewayError::Metrics(e.to_string()))?;

    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Record a served HTTP request.
pub fn record_http_request(start: Instant, path: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    counter!(METRIC_HTTP_REQUESTS, "path" => path.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "path" => path.to_string()).record(latency_ms);
}

/// Record successful backend search latency.
pub fn record_search_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_SEARCH_LATENCY).record(latency_ms);
}

/// Increment backend search failures counter.
pub fn inc_search_failures() {
    counter!(METRIC_SEARCH_FAILURES).increment(1);
}

/// Increment readiness probes counter.
pub fn inc_readiness_probe(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(METRIC_READINESS_PROBES, "outcome" => outcome).increment(1);
}

/// Increment handler panics counter.
pub fn inc_handler_panics() {
    counter!(METRIC_HANDLER_PANICS).increment(1);
}

/// Increment request timeouts counter.
pub fn inc_request_timeouts() {
    counter!(METRIC_REQUEST_TIMEOUTS).increment(1);
}
