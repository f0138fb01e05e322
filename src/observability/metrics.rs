//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): dispatched requests by bridge, operation, status
//! - `bridge_request_duration_seconds` (histogram): dispatch latency
//! - `bridge_client_calls_total` (counter): client calls by bridge, operation, outcome
//! - `bridge_client_call_duration_seconds` (histogram): client call latency
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exposition is opt-in through config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(bridge: &str, operation: &str, status: u16, start: Instant) {
    let labels = [
        ("bridge", bridge.to_string()),
        ("operation", operation.to_string()),
        ("status", status.to_string()),
    ];
    counter!("bridge_requests_total", &labels).increment(1);
    histogram!("bridge_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_client_call(bridge: &str, operation: &str, outcome: &str, start: Instant) {
    let labels = [
        ("bridge", bridge.to_string()),
        ("operation", operation.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("bridge_client_calls_total", &labels).increment(1);
    histogram!("bridge_client_call_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
