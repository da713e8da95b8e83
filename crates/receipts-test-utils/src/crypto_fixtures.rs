//! Deterministic RSA fixtures for testing.
//!
//! Two fixed 2048-bit RSA keys are checked in under `fixtures/`. Their
//! public components are listed here in JWK form (base64url, no padding) so
//! tests can publish them from a mock JWKS endpoint.

use jsonwebtoken::EncodingKey;
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Invalid fixture key: {0}")]
    InvalidKey(String),
}

const PRIMARY_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_primary.pem");
const SECONDARY_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_secondary.pem");

const PRIMARY_MODULUS: &str = "rewW6KlfP6Lh-f0cQ-MBol3uRXmXlzmjc-iMkHsatabXlPkS61J3MKe_W3UBdj83j6VwbmeIT124kYbRLGEjdfwex9QUfDL1F1OHpk5YJgI7PQXXGmVbp4kGyzaS-NzyJyTtq2G8kF-xeix_tRJ_nVGV4OQ8WoBFnM3jytcdoxZK_ir6zLviCscgYXugBTXEZ1Kx-_VVieF89GOnk4S6DD9ajhgXeGPJb_Yxs3PvPaWGyreMy_-YTZ5eAkQgNvORTVTEjrRfQ6dzAMBs0ts63XifKqSowuAZEr14uqjSTR5ARAp9ANlbU3_ezzl2XZe-pVtmxkk2OrDcDRNAmqpeYQ";
const SECONDARY_MODULUS: &str = "2u_UPDXNqN7i_k7r1_seqDWiZ5IIthk8esE43ALnfgf2TMFnv5b7QMOZAijQGWhJlJrYZ1_Xcuyxgdm_UeddErAtgKDxFLlESPLsDS18-SnupDEdX8ByI3K4ZbmmdKmsS9hFSunw_2TU5Xfa2g7wdBdEFwrvO_zxhA4J336EvUYeIlOyssorIw3jQ2aDU3KAqh0nXut5Pg08tyNdMW301QrjUDZE0gXtq6oBbZq2SmqEioqIlO31DvEZePYtStkdcWOqTEOkd8KHV5TI26Mg4d8cf1WUWBftCCGVmLxDqiTcC5GUwZcGZOAbsXxngSfLBwAheZydObWZ32EXRN9mgw";

/// Public exponent 65537, base64url.
const RSA_EXPONENT: &str = "AQAB";

/// A fixed RSA keypair with its JWK components.
#[derive(Debug, Clone, Copy)]
pub struct TestKeypair {
    /// Key ID published in the JWKS and set in token headers.
    pub kid: &'static str,

    /// RSA modulus (base64url).
    pub n: &'static str,

    /// RSA public exponent (base64url).
    pub e: &'static str,

    private_key_pem: &'static str,
}

impl TestKeypair {
    /// The key the mock issuer normally publishes.
    pub fn primary() -> Self {
        Self {
            kid: "primary-key",
            n: PRIMARY_MODULUS,
            e: RSA_EXPONENT,
            private_key_pem: PRIMARY_PRIVATE_KEY_PEM,
        }
    }

    /// An unrelated key, for wrong-key and rotation tests.
    pub fn secondary() -> Self {
        Self {
            kid: "secondary-key",
            n: SECONDARY_MODULUS,
            e: RSA_EXPONENT,
            private_key_pem: SECONDARY_PRIVATE_KEY_PEM,
        }
    }

    /// Private key for signing.
    pub fn encoding_key(&self) -> Result<EncodingKey, FixtureError> {
        EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .map_err(|e| FixtureError::InvalidKey(e.to_string()))
    }

    /// Public key as a JWKS entry.
    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": self.kid,
            "use": "sig",
            "alg": "RS256",
            "n": self.n,
            "e": self.e
        })
    }
}

/// A JWKS document publishing the given keys.
pub fn jwks_json(keys: &[&TestKeypair]) -> serde_json::Value {
    serde_json::json!({
        "keys": keys.iter().map(|k| k.jwk_json()).collect::<Vec<_>>()
    })
}
