//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks that the issuer's keys can be loaded

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Loads the issuer's key set through the shared cache: a warm cache
/// answers immediately, a cold one performs the first fetch. Returns 200 if
/// keys are available, 503 otherwise.
///
/// The error message is generic; the cause is logged server-side.
#[tracing::instrument(skip_all, name = "receipts.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.jwks_client.get_keys().await {
        Ok(keys) if !keys.is_empty() => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                jwks: Some("available"),
                error: None,
            }),
        ),
        Ok(_) => {
            tracing::warn!("Readiness check failed: JWKS contains no usable keys");
            not_ready("empty")
        }
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            not_ready("unavailable")
        }
    }
}

fn not_ready(jwks: &'static str) -> (StatusCode, Json<ReadinessResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadinessResponse {
            status: "not_ready",
            jwks: Some(jwks),
            error: Some("Service dependencies unavailable".to_string()),
        }),
    )
}
