//! Retry policy helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::{GraphqlClientError, GraphqlError};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Lower bound for a computed backoff.
    pub min_delay: Duration,
    /// Upper bound for a computed backoff.
    pub max_delay: Duration,
    /// Scale each backoff by a random factor in `[0.5, 1.5)`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(300),
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    #[must_use]
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Override the backoff bounds.
    #[must_use]
    pub const fn with_delays(mut self, base: Duration, min: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.min_delay = min;
        self.max_delay = max;
        self
    }

    /// Backoff before retry number `retry_index` (zero-based).
    ///
    /// `base * 2^retry_index`, jittered, clamped to `[min_delay, max_delay]`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn backoff_delay(&self, retry_index: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let mut delay_ms = base_ms * 2_f64.powi(retry_index.min(30) as i32);
        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..1.5);
            delay_ms *= factor;
        }
        let min_ms = self.min_delay.as_millis() as f64;
        let max_ms = (self.max_delay.as_millis() as f64).max(min_ms);
        Duration::from_millis(delay_ms.clamp(min_ms, max_ms).round() as u64)
    }

    /// Delay before retrying `error`: the server's `Retry-After` when present,
    /// otherwise backoff.
    #[must_use]
    pub fn delay_for(&self, error: &GraphqlClientError, retry_index: u32) -> Duration {
        error
            .retry_after()
            .unwrap_or_else(|| self.backoff_delay(retry_index))
    }
}

/// Decides whether GraphQL error payloads signal rate limiting.
///
/// Upstreams disagree on how they report this inside a 200 response, so the
/// markers are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitMatcher {
    statuses: Vec<u16>,
    patterns: Vec<String>,
}

impl Default for RateLimitMatcher {
    fn default() -> Self {
        Self {
            statuses: vec![429],
            patterns: vec!["too many requests".to_string()],
        }
    }
}

impl RateLimitMatcher {
    /// Match on the given statuses and message substrings (case-insensitive).
    #[must_use]
    pub fn new(statuses: Vec<u16>, patterns: Vec<String>) -> Self {
        Self {
            statuses,
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Never treat GraphQL errors as rate limiting.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            statuses: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Add a message substring.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl AsRef<str>) -> Self {
        self.patterns.push(pattern.as_ref().to_lowercase());
        self
    }

    /// Returns `true` if this error reports rate limiting.
    #[must_use]
    pub fn is_rate_limited(&self, error: &GraphqlError) -> bool {
        if error
            .status
            .is_some_and(|status| self.statuses.contains(&status))
        {
            return true;
        }
        if let Some(extensions) = &error.extensions {
            for key in ["status", "statusCode", "code"] {
                if let Some(code) = extensions.get(key).and_then(status_from_json) {
                    if self.statuses.contains(&code) {
                        return true;
                    }
                }
            }
        }
        let message = error.message.to_lowercase();
        self.patterns.iter().any(|pattern| message.contains(pattern))
    }

    /// Returns `true` if any error reports rate limiting.
    #[must_use]
    pub fn any_rate_limited(&self, errors: &[GraphqlError]) -> bool {
        errors.iter().any(|error| self.is_rate_limited(error))
    }
}

fn status_from_json(value: &serde_json::Value) -> Option<u16> {
    match value {
        serde_json::Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `Retry-After` as delay-seconds or an HTTP-date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after_value(value, Utc::now())
}

fn parse_retry_after_value(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    if let Ok(seconds) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(seconds.max(0.0)).ok();
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&Utc) - now;
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}
