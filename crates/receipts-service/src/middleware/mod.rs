//! Middleware for the receipts service.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for receipt routes
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState};
pub use http_metrics::http_metrics_middleware;
