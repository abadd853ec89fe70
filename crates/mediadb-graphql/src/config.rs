//! Environment-driven client settings.

use std::time::Duration;

use thiserror::Error;

/// Public GraphQL endpoint used when nothing is configured.
pub const DEFAULT_ENDPOINT: &str = "https://graphql.anilist.co";
/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Endpoint override.
pub const ENV_ENDPOINT: &str = "MEDIADB_GRAPHQL_URL";
/// Debug logging toggle.
pub const ENV_DEBUG: &str = "MEDIADB_DEBUG";
/// Default request timeout in milliseconds (`0` disables it).
pub const ENV_TIMEOUT_MS: &str = "MEDIADB_REQUEST_TIMEOUT_MS";

/// Settings error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable holds something we cannot interpret.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Externally configurable client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Emit debug-level logs.
    pub debug: bool,
    /// Default request timeout; `None` disables it.
    pub timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debug: false,
            timeout: Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
        }
    }
}

impl ClientSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or blank variables use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut settings = Self::default();
        if let Some(endpoint) = read(ENV_ENDPOINT) {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: ENV_ENDPOINT,
                    value: endpoint,
                    reason: "expected an http(s) URL",
                });
            }
            settings.endpoint = endpoint;
        }
        if let Some(debug) = read(ENV_DEBUG) {
            settings.debug = parse_flag(ENV_DEBUG, &debug)?;
        }
        if let Some(timeout) = read(ENV_TIMEOUT_MS) {
            let millis: u64 = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS,
                value: timeout.clone(),
                reason: "expected milliseconds",
            })?;
            settings.timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        Ok(settings)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}
