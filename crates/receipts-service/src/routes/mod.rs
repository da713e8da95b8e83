//! HTTP routes for the receipts service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::repositories::ReceiptRepository;
use axum::{http::HeaderValue, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Issuer key set cache, shared with the validator.
    pub jwks_client: Arc<JwksClient>,

    /// Bearer token validator.
    pub jwt_validator: Arc<JwtValidator>,

    /// Receipt storage.
    pub repository: Arc<dyn ReceiptRepository>,
}

impl AppState {
    /// Wire the JWKS cache and validator from configuration.
    pub fn new(config: Config, repository: Arc<dyn ReceiptRepository>) -> Self {
        let jwks_client = Arc::new(JwksClient::new(
            config.jwks_url.clone(),
            config.jwks_refresh_policy,
        ));
        let jwt_validator = Arc::new(JwtValidator::new(
            Arc::clone(&jwks_client),
            config.audience.clone(),
            config.issuer.clone(),
            config.jwt_clock_skew_seconds,
        ));

        Self {
            config,
            jwks_client,
            jwt_validator,
            repository,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public
/// - `/ready` - Readiness probe (issuer JWKS loadable) - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/receipts` - Caller's receipts - requires authentication
/// - `/receipts/{code}` - Single receipt, owner only - requires authentication
/// - CORS for the configured frontend origins
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        jwt_validator: Arc::clone(&state.jwt_validator),
    });
    let cors = cors_layer(&state.config.cors_allowed_origins);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/receipts", get(handlers::list_receipts))
        .route("/receipts/:code", get(handlers::get_receipt))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflights before routing
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Credentialed CORS for the given origins, mirroring requested methods and
/// headers.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
