//! mediadb GraphQL - Request pipeline for the media catalog.
//!
//! This crate provides:
//! - A process-wide request limiter that caps in-flight upstream calls.
//! - Cancellation signals that tell a timeout apart from caller teardown.
//! - A GraphQL client with bounded retries, backoff and `Retry-After` support.
//! - Error classification into stable, user-facing messages.
//! - Environment-driven client settings.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

mod cancel;
mod classify;
mod client;
mod config;
mod error;
mod limiter;
mod operation;
mod retry;

pub use cancel::{CancelReason, CancellationSignal, EffectiveSignal, sleep_with_signal};
pub use classify::{
    ClassifiedError, MSG_GENERIC, MSG_NETWORK, MSG_RATE_LIMITED, MSG_SERVICE_BUSY, MSG_TIMEOUT,
    classify, classify_message, user_message_for,
};
pub use client::{
    GraphqlClient, GraphqlClientBuilder, GraphqlClientConfig, GraphqlClientMetrics,
    GraphqlClientMetricsSnapshot, RequestOptions,
};
pub use config::{
    ClientSettings, ConfigError, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, ENV_DEBUG, ENV_ENDPOINT,
    ENV_TIMEOUT_MS,
};
pub use error::{
    GraphqlClientError, GraphqlError, GraphqlErrorLocation, GraphqlPathSegment, HttpErrorInfo,
};
pub use limiter::{MAX_CONCURRENCY, RequestLimiter, RequestSlot};
pub use operation::{GraphqlOperation, GraphqlQuery, GraphqlRequest, GraphqlResponse};
pub use retry::{RateLimitMatcher, RetryPolicy, parse_retry_after};
