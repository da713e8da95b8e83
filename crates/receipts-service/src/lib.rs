//! Receipts API Service Library
//!
//! A read-only HTTP API that serves receipts to their owners. Callers
//! authenticate with RS256 bearer tokens issued by Auth0; signing keys are
//! fetched from the tenant's JWKS endpoint and cached.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//!                        |
//!                  auth/jwt.rs -> auth/jwks.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS cache, token validation, claims
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and metrics middleware
//! - `models` - Data models
//! - `observability` - Metrics
//! - `repositories` - Receipt storage
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
