//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_resource_healthy` (gauge): 1=healthy, 0=unhealthy, per resource
//! - `lifecycle_probe_duration_seconds` (histogram): probe latency, per resource
//! - `lifecycle_shutdowns_total` (counter): shutdown attempts by result
//! - `lifecycle_release_failures_total` (counter): failed releases, per resource
//! - `lifecycle_shutdown_duration_seconds` (histogram): time from trigger to report
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op without an exporter
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Failure is logged; the service runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
