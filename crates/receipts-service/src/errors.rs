//! Receipts service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Authentication failures keep a reason-specific message so API clients
//! can tell a missing token from an expired one. Upstream failures return a
//! generic message; the actual cause is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Reason a request failed authentication.
///
/// Every variant maps to 401 Unauthorized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header.
    #[error("Missing token")]
    MissingToken,

    /// Token header has no `kid`, or no published key matches it.
    #[error("Invalid key ID")]
    InvalidKeyId,

    /// The matching key cannot be used as an RS256 verification key.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Signature, structure, expiry, audience or issuer check failed.
    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// Verified token carries no subject.
    #[error("Invalid token payload")]
    InvalidPayload,
}

impl AuthError {
    /// Machine-readable error code returned in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidKeyId => "INVALID_KEY_ID",
            AuthError::InvalidKeyFormat(_) => "INVALID_KEY_FORMAT",
            AuthError::TokenInvalid(_) => "TOKEN_INVALID",
            AuthError::InvalidPayload => "INVALID_PAYLOAD",
        }
    }

    /// Bounded label for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidKeyId => "invalid_key_id",
            AuthError::InvalidKeyFormat(_) => "invalid_key_format",
            AuthError::TokenInvalid(_) => "token_invalid",
            AuthError::InvalidPayload => "invalid_payload",
        }
    }
}

/// Receipts service error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - Forbidden: 403 Forbidden
/// - NotFound: 404 Not Found
/// - UpstreamUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum ReceiptsError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl ReceiptsError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiptsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ReceiptsError::Forbidden(_) => StatusCode::FORBIDDEN,
            ReceiptsError::NotFound(_) => StatusCode::NOT_FOUND,
            ReceiptsError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ReceiptsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            ReceiptsError::Unauthorized(reason) => (reason.code(), reason.to_string()),
            ReceiptsError::Forbidden(reason) => ("FORBIDDEN", reason.clone()),
            ReceiptsError::NotFound(resource) => ("NOT_FOUND", resource.clone()),
            ReceiptsError::UpstreamUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "receipts.availability", reason = %reason, "Upstream unavailable");
                (
                    "UPSTREAM_UNAVAILABLE",
                    "Authentication service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // RFC 6750: no error attribute when the request carried no credentials
        if let ReceiptsError::Unauthorized(reason) = &self {
            let challenge = match reason {
                AuthError::MissingToken => "Bearer realm=\"receipts-api\"",
                _ => "Bearer realm=\"receipts-api\", error=\"invalid_token\"",
            };
            if let Ok(header_value) = challenge.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
