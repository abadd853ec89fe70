//! Failure classification into stable, user-facing messages.

use serde::Serialize;

use crate::error::GraphqlClientError;

/// Shown when a request deadline elapsed.
pub const MSG_TIMEOUT: &str = "Request timed out — please try again.";
/// Shown when the upstream rate limited us.
pub const MSG_RATE_LIMITED: &str = "Too many actions at once — please wait a bit and try again.";
/// Shown when the upstream is temporarily unavailable.
pub const MSG_SERVICE_BUSY: &str = "Service is busy — please try again later.";
/// Shown for transport faults.
pub const MSG_NETWORK: &str = "Network issue — please check your connection and try again.";
/// Fallback.
pub const MSG_GENERIC: &str = "Something went wrong — please try again.";

const TIMEOUT_PATTERNS: &[&str] = &["timeout", "timed out"];
const RATE_LIMIT_PATTERNS: &[&str] = &["429", "too many"];
const BUSY_PATTERNS: &[&str] = &["503", "504", "unavailable", "temporar"];
const NETWORK_PATTERNS: &[&str] = &[
    "network",
    "failed to fetch",
    "offline",
    "econnrefused",
    "connection refused",
    "error sending request",
];

/// A failure reduced to what a view needs to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    /// `true` for intentional teardown; never shown to the user.
    pub is_cancellation: bool,
    /// The failure text as produced by the pipeline.
    pub raw_message: String,
    /// Stable user-facing message; empty for cancellations.
    pub user_message: String,
}

impl ClassifiedError {
    fn cancellation(raw_message: String) -> Self {
        Self {
            is_cancellation: true,
            raw_message,
            user_message: String::new(),
        }
    }

    fn failure(raw_message: String, user_message: &str) -> Self {
        Self {
            is_cancellation: false,
            raw_message,
            user_message: user_message.to_string(),
        }
    }
}

/// Classify a client failure.
///
/// Typed causes win over text: external cancellation is never a user-facing
/// failure, deadlines map to the timeout message and transport faults to the
/// network message. Everything else goes through [`user_message_for`].
pub fn classify(error: &GraphqlClientError) -> ClassifiedError {
    let raw = error.to_string();
    if error.is_cancellation() {
        return ClassifiedError::cancellation(raw);
    }
    if error.is_timeout() {
        return ClassifiedError::failure(raw, MSG_TIMEOUT);
    }
    if let GraphqlClientError::Http(info) = error {
        if info.is_connect || info.is_request {
            return ClassifiedError::failure(raw, MSG_NETWORK);
        }
    }
    let user_message = user_message_for(&raw);
    ClassifiedError::failure(raw, user_message)
}

/// Classify untyped failure text.
///
/// Text mentioning "aborted" (any case) is treated as a cancellation.
pub fn classify_message(raw: &str) -> ClassifiedError {
    if raw.to_lowercase().contains("aborted") {
        return ClassifiedError::cancellation(raw.to_string());
    }
    ClassifiedError::failure(raw.to_string(), user_message_for(raw))
}

/// Map failure text to a user message. First match wins.
pub fn user_message_for(raw: &str) -> &'static str {
    let lowered = raw.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|pattern| lowered.contains(pattern));

    if matches(TIMEOUT_PATTERNS) {
        MSG_TIMEOUT
    } else if matches(RATE_LIMIT_PATTERNS) {
        MSG_RATE_LIMITED
    } else if matches(BUSY_PATTERNS) {
        MSG_SERVICE_BUSY
    } else if matches(NETWORK_PATTERNS) {
        MSG_NETWORK
    } else {
        MSG_GENERIC
    }
}
