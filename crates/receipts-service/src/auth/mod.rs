//! Authentication for the receipts API.
//!
//! - `jwks` - Issuer key set fetching and caching
//! - `jwt` - Bearer token validation
//! - `claims` - Verified token claims and the caller's subject

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::{Claims, Subject};
pub use jwks::{Jwk, JwksClient, KeySet, RefreshPolicy};
pub use jwt::JwtValidator;
