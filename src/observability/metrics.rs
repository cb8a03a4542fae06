//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status, decision
//! - `router_request_duration_seconds` (histogram): latency by decision
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   embedders pay nothing
//! - Prometheus exposition via its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Request counted as forwarded upstream.
pub const DECISION_FORWARD: &str = "forward";
/// Request answered with the fallback page.
pub const DECISION_FALLBACK: &str = "fallback";
/// Forward attempted but the upstream could not be reached.
pub const DECISION_UPSTREAM_ERROR: &str = "upstream_error";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, decision: &'static str, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "decision" => decision,
    )
    .increment(1);

    metrics::histogram!("router_request_duration_seconds", "decision" => decision)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_request("GET", 200, DECISION_FORWARD, Instant::now());
        record_request("POST", 502, DECISION_UPSTREAM_ERROR, Instant::now());
    }
}
