//! Metrics collection and exposition.
//!
//! # Metrics
//! - `badge_requests_total` (counter): requests by route, method, status
//! - `badge_request_duration_seconds` (histogram): latency by route
//! - `badge_views_total` (counter): counted views by configured service
//! - `badge_errors_total` (counter): failed badge requests by kind (count, rewrite, timeout, network)

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &'static str, method: &Method, status: u16, start: Instant) {
    counter!(
        "badge_requests_total",
        "route" => route,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("badge_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// `service` should be a configured identifier or `"other"` to bound label cardinality.
pub fn record_view(service: &str) {
    counter!("badge_views_total", "service" => service.to_string()).increment(1);
}

pub fn record_error(kind: &'static str) {
    counter!("badge_errors_total", "kind" => kind).increment(1);
}
