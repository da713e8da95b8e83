//! Builder for signed test access tokens.

use crate::crypto_fixtures::TestKeypair;
use crate::test_ids::{DEFAULT_TEST_SUBJECT, TEST_AUDIENCE, TEST_ISSUER};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Map, Value};

/// How the `kid` header is set.
#[derive(Debug, Clone)]
enum KidHeader {
    /// The signing keypair's own kid.
    FromKeypair,
    Custom(String),
    Omitted,
}

/// Builder for RS256 access tokens as the mock issuer would mint them.
///
/// Defaults: subject [`DEFAULT_TEST_SUBJECT`], audience [`TEST_AUDIENCE`],
/// issuer [`TEST_ISSUER`], issued now, expiring in one hour.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("auth0|userB")
///     .expires_in(60)
///     .sign(&TestKeypair::primary());
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    sub: Option<String>,
    aud: Value,
    iss: Option<String>,
    exp: i64,
    iat: Option<i64>,
    kid: KidHeader,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some(DEFAULT_TEST_SUBJECT.to_string()),
            aud: json!(TEST_AUDIENCE),
            iss: Some(TEST_ISSUER.to_string()),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: Some(now.timestamp()),
            kid: KidHeader::FromKeypair,
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Drop the `sub` claim
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set a single audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = json!(audience);
        self
    }

    /// Set the audience as an array (as Auth0 does with userinfo)
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = json!(audiences);
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Drop the `iss` claim
    pub fn without_issuer(mut self) -> Self {
        self.iss = None;
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Expired an hour ago, well outside any clock skew
    pub fn expired(self) -> Self {
        self.expires_in(-3600).issued_at((Utc::now() - Duration::seconds(7200)).timestamp())
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Put a different `kid` in the header than the signing key's
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = KidHeader::Custom(kid.to_string());
        self
    }

    /// Leave `kid` out of the header
    pub fn without_kid(mut self) -> Self {
        self.kid = KidHeader::Omitted;
        self
    }

    /// Add an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        let mut claims = self.extra.clone();
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        if let Some(iss) = &self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), json!(iat));
        }
        claims.insert("aud".to_string(), self.aud.clone());
        claims.insert("exp".to_string(), json!(self.exp));
        Value::Object(claims)
    }

    /// Sign the claims with RS256.
    ///
    /// # Panics
    ///
    /// Panics if the fixture key cannot be loaded or signing fails.
    pub fn sign(&self, keypair: &TestKeypair) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = match &self.kid {
            KidHeader::FromKeypair => Some(keypair.kid.to_string()),
            KidHeader::Custom(kid) => Some(kid.clone()),
            KidHeader::Omitted => None,
        };

        let key = keypair.encoding_key().expect("fixture key should load");
        encode(&header, &self.build(), &key).expect("Failed to sign token")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
