//! Metrics definitions for the receipts service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `receipts_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP methods
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `status`: success, error, timeout
//! - `error_type`: bounded by `AuthError` variants plus `upstream_unavailable`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("receipts_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Validation includes a JWKS fetch on cache miss
        .set_buckets_for_metric(
            Matcher::Prefix("receipts_token_validation".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.050, 0.100, 0.500, 1.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `receipts_http_requests_total`, `receipts_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
///
/// Captures every response, including rejections from the auth middleware
/// and framework-level 404/405.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("receipts_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("receipts_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Receipt codes are replaced with `{code}`.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/receipts" | "/receipts/" => "/receipts",
        _ => match path.strip_prefix("/receipts/") {
            Some(code) if !code.is_empty() && !code.contains('/') => "/receipts/{code}",
            _ => "/other",
        },
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record the outcome of a bearer token validation
///
/// Metric: `receipts_token_validations_total`, `receipts_token_validation_duration_seconds`
/// Labels: `status`, `error_type`
pub fn record_token_validation(
    status: &'static str,
    error_type: Option<&'static str>,
    duration: Duration,
) {
    histogram!("receipts_token_validation_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("receipts_token_validations_total",
        "status" => status,
        "error_type" => error_type.unwrap_or("none")
    )
    .increment(1);
}

/// Record a JWKS fetch from the issuer
///
/// Metric: `receipts_jwks_fetches_total`
/// Labels: `status`
pub fn record_jwks_fetch(status: &'static str) {
    counter!("receipts_jwks_fetches_total",
        "status" => status
    )
    .increment(1);
}
