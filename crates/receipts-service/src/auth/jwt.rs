//! JWT validation for the receipts API.
//!
//! Validates incoming access tokens using RSA public keys fetched from the
//! issuer's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only RS256 is accepted; `none` and HMAC tokens fail verification
//! - Audience, issuer and expiry are required and checked
//! - Issued-at is checked with clock skew tolerance when present

use crate::auth::claims::{Claims, Subject};
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::{AuthError, ReceiptsError};
use crate::observability::metrics::record_token_validation;
use common::jwt::{extract_kid, validate_iat, JwtValidationError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Leeway applied to `exp`. Clock skew only relaxes the `iat` check.
const EXP_LEEWAY_SECONDS: u64 = 0;

/// JWT validator using the issuer's JWKS.
pub struct JwtValidator {
    /// JWKS client for fetching public keys.
    jwks_client: Arc<JwksClient>,

    /// Expected `aud` claim.
    audience: String,

    /// Expected `iss` claim.
    issuer: String,

    /// Clock skew tolerance in seconds for iat validation.
    clock_skew_seconds: i64,
}

impl JwtValidator {
    /// Create a new JWT validator.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Client for fetching public keys
    /// * `audience` - Required `aud` value
    /// * `issuer` - Required `iss` value
    /// * `clock_skew_seconds` - Clock skew tolerance for iat validation
    pub fn new(
        jwks_client: Arc<JwksClient>,
        audience: String,
        issuer: String,
        clock_skew_seconds: i64,
    ) -> Self {
        Self {
            jwks_client,
            audience,
            issuer,
            clock_skew_seconds,
        }
    }

    /// Validate a bearer token and return the caller's subject.
    ///
    /// Records the outcome in `receipts_token_validations_total`.
    ///
    /// # Errors
    ///
    /// - `ReceiptsError::Unauthorized` with the failing [`AuthError`] reason
    /// - `ReceiptsError::UpstreamUnavailable` if the JWKS cannot be fetched
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<Subject, ReceiptsError> {
        let start = Instant::now();
        let result = self.validate(token).await.and_then(|claims| {
            claims
                .subject()
                .map(Subject::new)
                .ok_or_else(|| {
                    tracing::debug!(target: "receipts.auth.jwt", "Verified token has no subject");
                    ReceiptsError::from(AuthError::InvalidPayload)
                })
        });

        match &result {
            Ok(_) => record_token_validation("success", None, start.elapsed()),
            Err(ReceiptsError::Unauthorized(reason)) => {
                record_token_validation("error", Some(reason.error_type()), start.elapsed());
            }
            Err(_) => record_token_validation("error", Some("upstream_unavailable"), start.elapsed()),
        }

        result
    }

    /// Validate a JWT and return the claims.
    ///
    /// # Checks, in order
    ///
    /// 1. Size check and `kid` extraction from the unverified header
    /// 2. Key lookup in the cached JWKS
    /// 3. RSA key construction from the JWK
    /// 4. RS256 signature, `exp`, `aud` and `iss`
    /// 5. `iat` with clock skew tolerance, if present
    ///
    /// # Errors
    ///
    /// Returns the first failing check as `ReceiptsError::Unauthorized`, or
    /// `ReceiptsError::UpstreamUnavailable` if keys cannot be fetched.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, ReceiptsError> {
        // 1. Extract kid from JWT header (includes size check via common::jwt)
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "receipts.auth.jwt", error = ?e, "Token kid extraction failed");
            match e {
                JwtValidationError::MissingKid => AuthError::InvalidKeyId,
                other => AuthError::TokenInvalid(other.to_string()),
            }
        })?;

        // 2. Fetch public key from JWKS
        let jwk = self.jwks_client.get_key(&kid).await?;

        // 3-4. Build the key, verify signature and standard claims
        let claims = verify_token(token, &jwk, &self.validation())?;

        // 5. Validate iat claim with clock skew tolerance
        if let Some(iat) = claims.iat {
            if let Err(e) = validate_iat(iat, self.clock_skew()) {
                tracing::debug!(target: "receipts.auth.jwt", error = ?e, "Token iat validation failed");
                return Err(AuthError::TokenInvalid(e.to_string()).into());
            }
        }

        tracing::debug!(target: "receipts.auth.jwt", "Token validated successfully");
        Ok(claims)
    }

    fn clock_skew(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.clock_skew_seconds).unwrap_or(0))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.leeway = EXP_LEEWAY_SECONDS;
        validation
    }
}

/// Build an RS256 decoding key from a JWK.
fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "receipts.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(AuthError::InvalidKeyFormat(format!(
            "unsupported key type {}",
            jwk.kty
        )));
    }
    if let Some(alg) = &jwk.alg {
        if alg != "RS256" {
            tracing::warn!(target: "receipts.auth.jwt", alg = %alg, "Unexpected JWK algorithm");
            return Err(AuthError::InvalidKeyFormat(format!(
                "unsupported algorithm {}",
                alg
            )));
        }
    }

    let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
        tracing::error!(target: "receipts.auth.jwt", kid = ?jwk.kid, "JWK missing modulus or exponent");
        return Err(AuthError::InvalidKeyFormat(
            "missing modulus or exponent".to_string(),
        ));
    };

    DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::error!(target: "receipts.auth.jwt", error = %e, "Invalid RSA key components");
        AuthError::InvalidKeyFormat(e.to_string())
    })
}

/// Verify JWT signature and extract claims.
///
/// Key problems are reported as `InvalidKeyFormat`; everything the decoder
/// rejects is reported as `TokenInvalid` with the decoder's reason.
fn verify_token(token: &str, jwk: &Jwk, validation: &Validation) -> Result<Claims, AuthError> {
    let key = decoding_key(jwk)?;

    let token_data = decode::<Claims>(token, &key, validation).map_err(|e| {
        tracing::debug!(target: "receipts.auth.jwt", error = %e, "Token verification failed");
        AuthError::TokenInvalid(e.to_string())
    })?;

    Ok(token_data.claims)
}
