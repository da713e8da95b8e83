//! Fixed identities used across tests.

/// Audience the test server expects.
pub const TEST_AUDIENCE: &str = "https://api.localhost/receipts";

/// Issuer the test server expects.
pub const TEST_ISSUER: &str = "https://receipts-test.eu.auth0.com/";

/// Owner of `rct_1` and `rct_3` in the seeded store.
pub const OWNER_A: &str = "auth0|68dfb748e1faeb183927781e";

/// Owner of `rct_2` in the seeded store.
pub const OWNER_B: &str = "auth0|userB";

/// Subject that owns no receipts.
pub const NON_OWNER: &str = "auth0|no-receipts";

/// Subject used by [`crate::TestTokenBuilder::new`].
pub const DEFAULT_TEST_SUBJECT: &str = OWNER_A;
