//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define controller metrics (requests, latency, in-flight, probes, batch runs)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `actor_requests_total` (counter): standby requests by method, status
//! - `actor_request_duration_seconds` (histogram): handler latency
//! - `actor_in_flight_requests` (gauge): requests currently being handled
//! - `actor_readiness_probes_total` (counter): answered readiness probes
//! - `actor_batch_runs_total` (counter): batch runs by exit code
//!
//! # Design Decisions
//! - Readiness probes are counted apart from task requests
//! - Without an installed recorder every call here is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record a finished standby request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "actor_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "actor_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn set_in_flight(count: u64) {
    metrics::gauge!("actor_in_flight_requests").set(count as f64);
}

pub fn record_readiness_probe() {
    metrics::counter!("actor_readiness_probes_total").increment(1);
}

pub fn record_batch_run(exit_code: u8) {
    metrics::counter!("actor_batch_runs_total", "exit_code" => exit_code.to_string()).increment(1);
}
