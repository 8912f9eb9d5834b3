//! Metrics collection and exposition.
//!
//! # Metrics
//! - `provider_reconciliations_total` (counter): reconciliation passes by outcome
//! - `provider_connect_failures_total` (counter): failed registry connection attempts
//! - `provider_events_total` (counter): registry events received
//! - `provider_backends` (gauge): backends in the last published configuration
//! - `provider_servers` (gauge): servers in the last published configuration

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Published,
    FetchFailed,
}

impl ReconcileOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ReconcileOutcome::Published => "published",
            ReconcileOutcome::FetchFailed => "fetch_failed",
        }
    }
}

pub fn record_reconciliation(outcome: ReconcileOutcome) {
    metrics::counter!("provider_reconciliations_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_connect_failure() {
    metrics::counter!("provider_connect_failures_total").increment(1);
}

pub fn record_event() {
    metrics::counter!("provider_events_total").increment(1);
}

pub fn record_configuration(backends: usize, servers: usize) {
    metrics::gauge!("provider_backends").set(backends as f64);
    metrics::gauge!("provider_servers").set(servers as f64);
}
