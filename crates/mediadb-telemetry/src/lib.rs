//! mediadb telemetry - Logging setup for the media catalog binaries.
//!
//! - **Structured logging**: JSON or human-readable output on stderr
//! - **Filtering**: `RUST_LOG` wins over the configured level
//! - **Redaction**: sensitive keys are scrubbed from logged payloads
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mediadb_telemetry::{TelemetryConfig, init_telemetry};
//!
//! init_telemetry(TelemetryConfig::from_debug_flag("mediadb", settings.debug))?;
//! tracing::info!(endpoint = %settings.endpoint, "starting");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod logging;

pub use logging::*;

use std::sync::OnceLock;

/// Configuration installed by the first successful [`init_telemetry`].
static TELEMETRY: OnceLock<TelemetryConfig> = OnceLock::new();

/// Configuration for telemetry initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event.
    pub service_name: String,

    /// Log level filter (e.g., "info", "debug", "mediadb_graphql=trace").
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Keys scrubbed from logged payloads (case-insensitive substring match).
    pub redact_fields: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "mediadb".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            redact_fields: vec![
                "password".to_string(),
                "api_key".to_string(),
                "secret".to_string(),
                "token".to_string(),
                "authorization".to_string(),
            ],
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// `debug` level when the debug flag is on, `info` otherwise.
    #[must_use]
    pub fn from_debug_flag(service_name: impl Into<String>, debug: bool) -> Self {
        Self::new(service_name).with_log_level(if debug { "debug" } else { "info" })
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable JSON logs.
    #[must_use]
    pub const fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Add fields to redact from logs.
    #[must_use]
    pub fn with_redact_fields(mut self, fields: Vec<String>) -> Self {
        self.redact_fields.extend(fields);
        self
    }
}

/// Initialize logging.
///
/// Call once at startup; a second call fails with
/// [`TelemetryError::LoggingInit`] because the global subscriber is taken.
///
/// # Errors
///
/// Returns an error if the level filter is invalid or a subscriber is
/// already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(&config)?;
    tracing::debug!(service = %config.service_name, level = %config.log_level, "telemetry initialized");
    let _ = TELEMETRY.set(config);
    Ok(())
}

/// Redaction keys of the installed configuration, or the defaults.
#[must_use]
pub fn redact_fields() -> Vec<String> {
    TELEMETRY.get().map_or_else(
        || TelemetryConfig::default().redact_fields,
        |config| config.redact_fields.clone(),
    )
}

/// Telemetry error type.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
