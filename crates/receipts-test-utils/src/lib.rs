//! # Receipts Test Utilities
//!
//! Shared test utilities for the receipts service.
//!
//! This crate provides:
//! - Deterministic RSA fixtures (fixed keys and their JWKs)
//! - `TestTokenBuilder` for signing RS256 access tokens
//! - `MockJwks`, a wiremock-backed JWKS endpoint
//! - `TestReceiptsServer`, a real server bound to a random port
//! - Fixed test identities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use receipts_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let jwks = MockJwks::start(&[&TestKeypair::primary()]).await;
//!     let server = TestReceiptsServer::spawn(&jwks.jwks_url()).await?;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_subject(OWNER_B)
//!         .sign(&TestKeypair::primary());
//!
//!     let response = server.get_with_token("/receipts", &token).await?;
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod mock_jwks;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use mock_jwks::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
