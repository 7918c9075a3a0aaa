//! Metrics collection and exposition.
//!
//! # Metrics
//! - `responder_responses_total` (counter): responses by method, status, outcome
//! - `responder_response_duration_seconds` (histogram): time spent in the pipeline
//! - `responder_internal_inconsistency_total` (counter): requests that reached
//!   the responder with neither errors nor an upstream response

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one response sent to a client.
pub fn record_response(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "responder_responses_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("responder_response_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_internal_inconsistency() {
    counter!("responder_internal_inconsistency_total").increment(1);
}
