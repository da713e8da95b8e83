//! Prometheus metrics endpoint handler.
//!
//! `/metrics` is unauthenticated so Prometheus can scrape it. Labels carry
//! only bounded operational data: no subjects, tokens or receipt codes.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns 200 OK with Prometheus text format:
/// ```text
/// # TYPE receipts_http_requests_total counter
/// receipts_http_requests_total{method="GET",endpoint="/receipts",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "receipts.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
