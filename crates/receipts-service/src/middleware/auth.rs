//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, validates it
//! using the JWT validator, and injects the caller's [`Subject`](crate::auth::Subject) into
//! request extensions.

use crate::auth::JwtValidator;
use crate::errors::{AuthError, ReceiptsError};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// JWT validator with JWKS client.
    pub jwt_validator: Arc<JwtValidator>,
}

/// Extract the bearer token from request headers.
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` when the header is absent, not valid
/// ASCII, uses another scheme, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "receipts.middleware.auth", "Missing Authorization header");
            AuthError::MissingToken
        })?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "receipts.middleware.auth", "Invalid Authorization header format");
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        tracing::debug!(target: "receipts.middleware.auth", "Empty bearer token");
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Authentication middleware that validates JWT tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized with WWW-Authenticate header if the token is missing or invalid
/// - 503 Service Unavailable if the issuer's keys cannot be fetched
/// - Otherwise continues to the handler with [`Subject`](crate::auth::Subject) in extensions
#[instrument(skip(state, req, next), name = "receipts.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ReceiptsError> {
    let token = extract_bearer_token(req.headers())?;

    let subject = state
        .jwt_validator
        .authenticate(token)
        .await
        .inspect_err(|e| {
            tracing::debug!(target: "receipts.middleware.auth", error = %e, "Request rejected");
        })?;

    req.extensions_mut().insert(subject);

    Ok(next.run(req).await)
}
