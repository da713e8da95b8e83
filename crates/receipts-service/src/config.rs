//! Receipts service configuration.
//!
//! Configuration is loaded from environment variables. Every setting has a
//! default pointing at the development Auth0 tenant, so the service starts
//! with no environment at all.

use crate::auth::RefreshPolicy;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::observability::ObservabilityConfig;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default Auth0 tenant domain.
pub const DEFAULT_AUTH0_DOMAIN: &str = "dev-ioniacov.eu.auth0.com";

/// Default expected `aud` claim.
pub const DEFAULT_AUTH0_AUDIENCE: &str = "https://api.localhost/receipts";

/// Default expected `iss` claim.
pub const DEFAULT_AUTH0_ISSUER: &str = "https://dev-ioniacov.eu.auth0.com/";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Frontend origins allowed by default.
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &[&str] =
    &["http://localhost:8000", "http://127.0.0.1:8001"];

/// Receipts service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Auth0 tenant domain, used to derive the JWKS URL.
    pub auth0_domain: String,

    /// Expected `aud` claim of incoming tokens.
    pub audience: String,

    /// Expected `iss` claim of incoming tokens.
    pub issuer: String,

    /// URL of the issuer's JWKS document.
    /// Defaults to `https://{auth0_domain}/.well-known/jwks.json`.
    pub jwks_url: String,

    /// Server bind address (default: "127.0.0.1:8000").
    pub bind_address: String,

    /// JWT clock skew tolerance in seconds for `iat` validation.
    pub jwt_clock_skew_seconds: i64,

    /// How long a fetched key set is trusted before it is fetched again.
    pub jwks_refresh_policy: RefreshPolicy,

    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_allowed_origins: Vec<String>,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,

    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must not be empty")]
    EmptyValue(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidJwksCacheTtl(String),

    #[error("Invalid CORS origin configuration: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth0_domain = non_empty_or(vars, "AUTH0_DOMAIN", DEFAULT_AUTH0_DOMAIN)?;
        let audience = non_empty_or(vars, "AUTH0_AUDIENCE", DEFAULT_AUTH0_AUDIENCE)?;
        let issuer = non_empty_or(vars, "AUTH0_ISSUER", DEFAULT_AUTH0_ISSUER)?;

        let jwks_url = match vars.get("JWKS_URL") {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("JWKS_URL".to_string()))
            }
            Some(url) => url.clone(),
            None => format!("https://{}/.well-known/jwks.json", auth0_domain),
        };

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        };

        // "never" keeps the first fetched key set for the process lifetime
        let jwks_refresh_policy = match vars.get("JWKS_CACHE_TTL_SECONDS") {
            Some(value_str) if value_str.eq_ignore_ascii_case("never") => RefreshPolicy::Never,
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksCacheTtl(format!(
                        "JWKS_CACHE_TTL_SECONDS must be a positive integer or 'never', got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidJwksCacheTtl(
                        "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                RefreshPolicy::Ttl(Duration::from_secs(value))
            }
            None => RefreshPolicy::Ttl(Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECONDS)),
        };

        let cors_allowed_origins = match vars.get("CORS_ALLOWED_ORIGINS") {
            Some(list) => {
                let origins: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect();

                if let Some(bad) = origins
                    .iter()
                    .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
                {
                    return Err(ConfigError::InvalidCorsOrigin(format!(
                        "CORS_ALLOWED_ORIGINS entries must start with http:// or https://, got '{}'",
                        bad
                    )));
                }

                origins
            }
            None => DEFAULT_CORS_ALLOWED_ORIGINS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        };

        let drain_seconds = match vars.get("RECEIPTS_DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "RECEIPTS_DRAIN_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        Ok(Config {
            auth0_domain,
            audience,
            issuer,
            jwks_url,
            bind_address,
            jwt_clock_skew_seconds,
            jwks_refresh_policy,
            cors_allowed_origins,
            drain_seconds,
            observability: ObservabilityConfig::from_vars(vars),
        })
    }
}

fn non_empty_or(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(name.to_string())),
        Some(value) => Ok(value.clone()),
        None => Ok(default.to_string()),
    }
}
