//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed calls by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): relay latency by method, outcome
//! - `history_records` (gauge): records currently held
//! - `history_evictions_total` (counter): records dropped at capacity

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one relayed call. `outcome` is `completed` or a failure kind.
pub fn record_relay_call(method: &str, status: u16, outcome: &str, elapsed: Duration) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "relay_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_history_size(len: usize) {
    gauge!("history_records").set(len as f64);
}

pub fn record_history_evictions(count: usize) {
    counter!("history_evictions_total").increment(count as u64);
}
