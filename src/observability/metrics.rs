//! Metrics collection and exposition.
//!
//! # Metrics
//! - `search_requests_total` (counter): searches by outcome
//! - `search_request_duration_seconds` (histogram): latency by outcome
//! - `search_rejections_total` (counter): requests refused before dispatch, by reason
//!
//! Recording is a no-op until an exporter is installed.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished search.
pub fn record_outcome(outcome: &'static str, start: Instant) {
    counter!("search_requests_total", "outcome" => outcome).increment(1);
    histogram!("search_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request refused before any outbound call.
pub fn record_rejection(reason: &'static str) {
    counter!("search_rejections_total", "reason" => reason).increment(1);
}
