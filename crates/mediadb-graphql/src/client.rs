//! GraphQL HTTP client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cancel::{CancellationSignal, EffectiveSignal, sleep_with_signal};
use crate::config::ClientSettings;
use crate::error::GraphqlClientError;
use crate::limiter::RequestLimiter;
use crate::operation::{GraphqlOperation, GraphqlQuery, GraphqlRequest, GraphqlResponse};
use crate::retry::{RateLimitMatcher, RetryPolicy, parse_retry_after};

/// Longest response-body snippet kept in an error.
const MAX_BODY_SNIPPET: usize = 200;

/// GraphQL client metrics.
#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    requests_retried: AtomicU64,
}

impl GraphqlClientMetrics {
    /// Snapshot current metrics.
    #[must_use]
    pub fn snapshot(&self) -> GraphqlClientMetricsSnapshot {
        GraphqlClientMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            requests_retried: self.requests_retried.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetricsSnapshot {
    /// Logical requests issued.
    pub requests_total: u64,
    /// Requests that returned data.
    pub requests_success: u64,
    /// Requests that failed (cancellations excluded).
    pub requests_error: u64,
    /// Retries performed.
    pub requests_retried: u64,
}

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Service name used in logs.
    pub service_name: String,
    /// Default headers applied to every request.
    pub headers: HeaderMap,
    /// Default request timeout; `None` disables it.
    pub timeout: Option<Duration>,
    /// Retry policy.
    pub retry: RetryPolicy,
    /// Rate-limit detection for GraphQL error payloads.
    pub rate_limit: RateLimitMatcher,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            service_name: "graphql".to_string(),
            headers,
            timeout: Some(Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS)),
            retry: RetryPolicy::default(),
            rate_limit: RateLimitMatcher::default(),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Caller cancellation.
    pub signal: Option<CancellationSignal>,
    /// Retry budget; defaults to the client's policy.
    pub retries: Option<u32>,
    /// Timeout; defaults to the client's. `Duration::ZERO` disables it.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options bound to a caller signal.
    #[must_use]
    pub fn with_signal(signal: CancellationSignal) -> Self {
        Self {
            signal: Some(signal),
            ..Self::default()
        }
    }

    /// Override the retry budget.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Override the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// GraphQL client builder.
#[derive(Debug, Clone)]
pub struct GraphqlClientBuilder {
    endpoint: String,
    config: GraphqlClientConfig,
    limiter: Option<RequestLimiter>,
}

impl GraphqlClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: GraphqlClientConfig::default(),
            limiter: None,
        }
    }

    /// Start from environment settings.
    #[must_use]
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.endpoint.clone()).with_timeout(settings.timeout)
    }

    /// Set the service name used in logs.
    #[must_use]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Set the default timeout; `None` disables it.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set rate-limit detection for GraphQL error payloads.
    #[must_use]
    pub fn with_rate_limit_matcher(mut self, matcher: RateLimitMatcher) -> Self {
        self.config.rate_limit = matcher;
        self
    }

    /// Share an existing limiter instead of creating a private one.
    #[must_use]
    pub fn with_limiter(mut self, limiter: RequestLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GraphqlClient, GraphqlClientError> {
        let http = reqwest::Client::builder()
            .default_headers(self.config.headers.clone())
            .build()?;
        Ok(GraphqlClient::new_with_client(
            self.endpoint,
            http,
            self.config,
            self.limiter.unwrap_or_default(),
        ))
    }
}

/// GraphQL client.
///
/// Clones share the HTTP pool, the limiter and the metrics.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
    config: GraphqlClientConfig,
    limiter: RequestLimiter,
    metrics: Arc<GraphqlClientMetrics>,
}

impl GraphqlClient {
    /// Create a new client with default configuration.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GraphqlClientError> {
        GraphqlClientBuilder::new(endpoint).build()
    }

    fn new_with_client(
        endpoint: impl Into<String>,
        http: reqwest::Client,
        config: GraphqlClientConfig,
        limiter: RequestLimiter,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
            config,
            limiter,
            metrics: Arc::new(GraphqlClientMetrics::default()),
        }
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The shared limiter.
    #[must_use]
    pub const fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    /// Return client metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> GraphqlClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Execute a typed operation and return its data.
    pub async fn execute<O: GraphqlOperation>(
        &self,
        variables: O::Variables,
        options: RequestOptions,
    ) -> Result<O::ResponseData, GraphqlClientError> {
        let request = GraphqlRequest::new(GraphqlQuery::from_static(O::QUERY), variables)
            .with_operation_name(O::OPERATION_NAME);
        self.send(&request, options).await
    }

    /// Execute raw query text and return its data.
    pub async fn request<V, R>(
        &self,
        query: &str,
        variables: V,
        options: RequestOptions,
    ) -> Result<R, GraphqlClientError>
    where
        V: Serialize,
        R: DeserializeOwned,
    {
        let request = GraphqlRequest::new(GraphqlQuery::new(query), variables);
        self.send(&request, options).await
    }

    /// Execute a prepared request and return its data.
    ///
    /// Each attempt holds a limiter slot only while the call is on the wire.
    /// Transient failures are retried up to the budget; a timeout surfaces as
    /// `Cancelled { reason: Timeout }` and a caller cancellation as
    /// `Cancelled { reason: External }`.
    pub async fn send<V, R>(
        &self,
        request: &GraphqlRequest<V>,
        options: RequestOptions,
    ) -> Result<R, GraphqlClientError>
    where
        V: Serialize,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        self.metrics.requests_total.fetch_add(1, Ordering::Relaxed);

        let operation = request.operation_name.as_deref().unwrap_or("anonymous");
        let retries = options.retries.unwrap_or(self.config.retry.retries);
        let timeout = options.timeout.or(self.config.timeout);
        let effective = EffectiveSignal::new(options.signal.as_ref(), timeout);

        let result = self
            .send_with_retry(&body, effective.signal(), retries, operation)
            .await;
        drop(effective);

        match &result {
            Ok(_) => {
                self.metrics
                    .requests_success
                    .fetch_add(1, Ordering::Relaxed);
            }
            Err(err) if err.is_cancellation() => {
                debug!(service = %self.config.service_name, operation, "GraphQL request cancelled");
            }
            Err(err) => {
                self.metrics.requests_error.fetch_add(1, Ordering::Relaxed);
                warn!(
                    service = %self.config.service_name,
                    operation,
                    error = %err,
                    "GraphQL request failed"
                );
            }
        }
        result
    }

    async fn send_with_retry<R: DeserializeOwned>(
        &self,
        body: &[u8],
        signal: &CancellationSignal,
        retries: u32,
        operation: &str,
    ) -> Result<R, GraphqlClientError> {
        let mut attempt = 0;
        loop {
            let err = match self.attempt_once(body, signal).await {
                Ok(data) => return Ok(data),
                Err(err) => err,
            };
            if attempt >= retries || !self.should_retry(&err) {
                return Err(err);
            }

            let delay = self.config.retry.delay_for(&err, attempt);
            self.metrics
                .requests_retried
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "retrying GraphQL request"
            );
            sleep_with_signal(delay, signal).await?;
            attempt += 1;
        }
    }

    async fn attempt_once<R: DeserializeOwned>(
        &self,
        body: &[u8],
        signal: &CancellationSignal,
    ) -> Result<R, GraphqlClientError> {
        let slot = self.limiter.acquire(signal).await?;
        let result = tokio::select! {
            biased;
            reason = signal.cancelled() => Err(GraphqlClientError::Cancelled { reason }),
            result = self.send_once(body) => result,
        };
        slot.release();
        decode_data(&result?)
    }

    async fn send_once(&self, body: &[u8]) -> Result<Vec<u8>, GraphqlClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .body(body.to_vec())
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(GraphqlClientError::HttpStatus {
                status,
                body: truncate_body(&bytes),
                retry_after,
            });
        }

        Ok(bytes.to_vec())
    }

    fn should_retry(&self, err: &GraphqlClientError) -> bool {
        match err {
            GraphqlClientError::GraphqlErrors { errors } => {
                self.config.rate_limit.any_rate_limited(errors)
            }
            other => other.is_retryable(),
        }
    }
}

fn decode_data<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, GraphqlClientError> {
    let response: GraphqlResponse<serde_json::Value> = serde_json::from_slice(bytes)?;
    if !response.errors.is_empty() {
        return Err(GraphqlClientError::GraphqlErrors {
            errors: response.errors,
        });
    }
    match response.data {
        Some(data) if !data.is_null() => Ok(serde_json::from_value(data)?),
        _ => Err(GraphqlClientError::Protocol {
            message: "No data returned".to_string(),
        }),
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(MAX_BODY_SNIPPET)
        .collect()
}
