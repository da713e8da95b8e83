//! Receipts service models.
//!
//! Contains data types used across the receipts service.

use serde::{Deserialize, Serialize};

/// A stored receipt.
///
/// Receipts are addressed by a string code (`rct_1`, ...) that is not part
/// of the serialized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Numeric receipt identifier.
    pub id: i64,

    /// Total amount.
    pub amount: f64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Subject (`sub` claim) of the owning user.
    pub owner: String,
}

/// Response body of `GET /receipts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptListResponse {
    /// Subject of the authenticated caller.
    pub user: String,

    /// Receipts owned by the caller, ordered by code.
    pub receipts: Vec<Receipt>,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint (readiness probe).
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// Service readiness status ("ready" or "not_ready").
    pub status: &'static str,

    /// Issuer JWKS reachability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
