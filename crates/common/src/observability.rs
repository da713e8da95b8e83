//! Tracing subscriber setup shared by Receipts API binaries.

use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines (development).
    Pretty,
    /// One JSON object per event (log shipping).
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives (from `RUST_LOG`); `None` uses the caller's default.
    pub log_filter: Option<String>,
    /// Output format (from `LOG_FORMAT`: `pretty` or `json`).
    pub log_format: LogFormat,
}

impl ObservabilityConfig {
    /// Read `RUST_LOG` and `LOG_FORMAT` from a variable map.
    ///
    /// Unknown `LOG_FORMAT` values fall back to [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_filter = vars
            .get("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .cloned();

        let log_format = match vars.get("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            log_filter,
            log_format,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `default_filter` is used when no filter is configured or the configured
/// one does not parse.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(
    config: &ObservabilityConfig,
    default_filter: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .try_init()
}
