//! JWKS client for fetching and caching the issuer's public signing keys.
//!
//! The JWKS (JSON Web Key Set) client fetches public keys from the issuer's
//! `/.well-known/jwks.json` endpoint on first use and keeps them according to
//! an injectable [`RefreshPolicy`].
//!
//! # Security
//!
//! - Keys are cached to avoid one issuer round-trip per request
//! - A TTL policy picks up issuer key rotations without a restart
//! - Fetch failures surface as 503, never as an authentication failure

use crate::errors::{AuthError, ReceiptsError};
use crate::observability::metrics::record_jwks_fetch;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Timeout for a single JWKS fetch.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// When a fetched key set stops being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Keep the first fetched key set until [`JwksClient::invalidate`] is called.
    Never,
    /// Re-fetch once the key set is older than the given duration.
    Ttl(Duration),
}

impl RefreshPolicy {
    fn expiry_from(&self, fetched_at: Instant) -> Option<Instant> {
        match self {
            RefreshPolicy::Never => None,
            RefreshPolicy::Ttl(ttl) => Some(fetched_at + *ttl),
        }
    }
}

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "RSA" for RS256).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm (should be "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

/// JWKS document as published by the issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Published keys indexed by key ID.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Jwk>,
}

impl KeySet {
    /// Index a JWKS document. Keys without a `kid` cannot be selected by a
    /// token header and are skipped.
    pub fn from_response(response: JwksResponse) -> Self {
        let keys = response
            .keys
            .into_iter()
            .filter_map(|key| match key.kid.clone() {
                Some(kid) if !kid.is_empty() => Some((kid, key)),
                _ => {
                    tracing::debug!(target: "receipts.auth.jwks", kty = %key.kty, "Skipping JWK without kid");
                    None
                }
            })
            .collect();

        Self { keys }
    }

    /// Look up a key by ID.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Cached key set with its expiry.
struct CachedKeySet {
    keys: Arc<KeySet>,

    /// `None` when the refresh policy never expires entries.
    expires_at: Option<Instant>,
}

impl CachedKeySet {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| at > Instant::now())
    }
}

/// JWKS client for fetching and caching public keys.
///
/// Owned by the application state and shared through `Arc`. Fetches are
/// serialized: concurrent callers that find the cache empty wait for the
/// single in-flight fetch instead of issuing their own.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached key set.
    cache: RwLock<Option<CachedKeySet>>,

    /// Held for the duration of a fetch.
    refresh_lock: Mutex<()>,

    /// When cached keys expire.
    policy: RefreshPolicy,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    /// * `policy` - How long a fetched key set is trusted
    pub fn new(jwks_url: String, policy: RefreshPolicy) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "receipts.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            policy,
        }
    }

    /// URL the key set is fetched from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get the issuer's key set.
    ///
    /// Returns the cached set while it is fresh, otherwise fetches it.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptsError::UpstreamUnavailable` if the JWKS cannot be fetched.
    #[instrument(skip(self))]
    pub async fn get_keys(&self) -> Result<Arc<KeySet>, ReceiptsError> {
        if let Some(keys) = self.cached_keys().await {
            tracing::debug!(target: "receipts.auth.jwks", "JWKS cache hit");
            return Ok(keys);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have completed the fetch while we waited
        if let Some(keys) = self.cached_keys().await {
            return Ok(keys);
        }

        self.refresh_cache().await
    }

    /// Get a JWK by key ID.
    ///
    /// An unknown key ID does not trigger a re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptsError::UpstreamUnavailable` if JWKS cannot be fetched.
    /// Returns `ReceiptsError::Unauthorized(InvalidKeyId)` if key ID is not found.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, ReceiptsError> {
        let keys = self.get_keys().await?;

        keys.find(kid).cloned().ok_or_else(|| {
            tracing::debug!(target: "receipts.auth.jwks", kid = %kid, "Key not found in JWKS");
            ReceiptsError::from(AuthError::InvalidKeyId)
        })
    }

    /// Drop the cached key set so the next lookup fetches it again.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
        tracing::info!(target: "receipts.auth.jwks", "JWKS cache invalidated");
    }

    /// Fetch the key set now, replacing whatever is cached.
    pub async fn force_refresh(&self) -> Result<Arc<KeySet>, ReceiptsError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_cache().await
    }

    async fn cached_keys(&self) -> Option<Arc<KeySet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.is_fresh())
            .map(|cached| Arc::clone(&cached.keys))
    }

    /// Refresh the cache by fetching from the issuer.
    ///
    /// Callers must hold `refresh_lock`.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<Arc<KeySet>, ReceiptsError> {
        tracing::debug!(target: "receipts.auth.jwks", url = %self.jwks_url, "Fetching JWKS from issuer");

        let keys = match self.fetch().await {
            Ok(keys) => {
                record_jwks_fetch("success");
                keys
            }
            Err(e) => {
                record_jwks_fetch("error");
                return Err(e);
            }
        };

        tracing::info!(
            target: "receipts.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let keys = Arc::new(keys);
        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            expires_at: self.policy.expiry_from(Instant::now()),
        });

        Ok(keys)
    }

    async fn fetch(&self) -> Result<KeySet, ReceiptsError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "receipts.auth.jwks", error = %e, "Failed to fetch JWKS");
                ReceiptsError::UpstreamUnavailable(format!("JWKS request failed: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "receipts.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(ReceiptsError::UpstreamUnavailable(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "receipts.auth.jwks", error = %e, "Failed to parse JWKS response");
            ReceiptsError::UpstreamUnavailable(format!("JWKS response unparseable: {}", e))
        })?;

        Ok(KeySet::from_response(jwks))
    }
}
