//! Structured logging with JSON output and sensitive data redaction.

use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber. Output goes to stderr so stdout stays
/// reserved for rendered results.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::Config(format!("{}: {e}", config.log_level)))?,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);

        subscriber
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let pretty_layer = fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr);

        subscriber
            .with(pretty_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Redact sensitive fields from a JSON value.
#[must_use]
pub fn redact_sensitive(value: &serde_json::Value, fields: &[String]) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (key, val) in map {
                let lowered = key.to_lowercase();
                if fields.iter().any(|f| lowered.contains(&f.to_lowercase())) {
                    result.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    result.insert(key.clone(), redact_sensitive(val, fields));
                }
            }
            serde_json::Value::Object(result)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(|v| redact_sensitive(v, fields)).collect())
        }
        other => other.clone(),
    }
}

/// Log one finished upstream operation with its redacted variables.
pub fn log_operation(
    operation: &str,
    variables: &serde_json::Value,
    elapsed: Duration,
    error: Option<&str>,
) {
    let variables = redact_sensitive(variables, &crate::redact_fields());
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => tracing::debug!(
            operation,
            variables = %variables,
            duration_ms,
            "operation completed"
        ),
        Some(error) => tracing::warn!(
            operation,
            variables = %variables,
            duration_ms,
            error,
            "operation failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_sensitive() {
        let value = json!({
            "id": 21,
            "accessToken": "tok-xyz",
            "filter": {
                "api_key": "key-abc",
                "search": "frieren"
            }
        });

        let redacted = redact_sensitive(&value, &["token".to_string(), "api_key".to_string()]);

        assert_eq!(redacted["id"], 21);
        assert_eq!(redacted["accessToken"], "[REDACTED]");
        assert_eq!(redacted["filter"]["api_key"], "[REDACTED]");
        assert_eq!(redacted["filter"]["search"], "frieren");
    }

    #[test]
    fn test_redact_nested_array() {
        let value = json!({
            "users": [
                {"name": "john", "password": "pass1"},
                {"name": "jane", "password": "pass2"}
            ]
        });

        let redacted = redact_sensitive(&value, &["password".to_string()]);

        assert_eq!(redacted["users"][0]["name"], "john");
        assert_eq!(redacted["users"][0]["password"], "[REDACTED]");
        assert_eq!(redacted["users"][1]["password"], "[REDACTED]");
    }

    #[test]
    fn test_redact_case_insensitive() {
        let value = json!({
            "PASSWORD": "secret1",
            "user_Password": "secret2",
            "page": 2
        });

        let redacted = redact_sensitive(&value, &["password".to_string()]);

        assert_eq!(redacted["PASSWORD"], "[REDACTED]");
        assert_eq!(redacted["user_Password"], "[REDACTED]");
        assert_eq!(redacted["page"], 2);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(redact_sensitive(&json!("token"), &["token".to_string()]), json!("token"));
    }
}
