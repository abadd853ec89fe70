//! Mock GraphQL endpoint for client and loader tests.
//!
//! Every helper answers `POST /`, the only route a GraphQL client uses.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// A mock GraphQL server.
pub struct MockGraphqlServer {
    server: MockServer,
}

impl MockGraphqlServer {
    /// Start a new mock server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint URL to hand to a client.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Underlying wiremock server for custom mocks.
    #[must_use]
    pub const fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Answer every request with `{"data": data}`.
    pub async fn expect_data(&self, data: serde_json::Value) {
        self.respond_with(json_response(200, serde_json::json!({ "data": data })))
            .await;
    }

    /// Answer requests whose variables contain `variables` with `{"data": data}`.
    pub async fn expect_data_for(&self, variables: serde_json::Value, data: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({ "variables": variables })))
            .respond_with(json_response(200, serde_json::json!({ "data": data })))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with a raw body and status.
    pub async fn expect_status(&self, status: u16, body: serde_json::Value) {
        self.respond_with(json_response(status, body)).await;
    }

    /// Answer every request after `delay`.
    pub async fn expect_delayed(&self, delay: Duration, data: serde_json::Value) {
        self.respond_with(
            json_response(200, serde_json::json!({ "data": data })).set_delay(delay),
        )
        .await;
    }

    /// Answer requests with `responses` in order, repeating the last one.
    ///
    /// Returns the shared hit counter.
    pub async fn expect_sequence(&self, responses: Vec<ResponseTemplate>) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        self.respond_with(SequenceResponder {
            counter: Arc::clone(&counter),
            responses,
        })
        .await;
        counter
    }

    async fn respond_with<R: Respond + 'static>(&self, responder: R) {
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(responder)
            .mount(&self.server)
            .await;
    }

    /// Parsed JSON bodies of every received request.
    pub async fn received_bodies(&self) -> Vec<serde_json::Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    /// Verify that a specific number of requests were received.
    ///
    /// # Panics
    ///
    /// Panics if the count doesn't match.
    pub async fn assert_request_count(&self, expected: usize) {
        let received = self.server.received_requests().await.unwrap_or_default();
        assert_eq!(
            received.len(),
            expected,
            "expected {expected} requests but received {}",
            received.len()
        );
    }
}

/// JSON response with the right content type.
#[must_use]
pub fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_json(body)
        .insert_header("content-type", "application/json")
}

struct SequenceResponder {
    counter: Arc<AtomicUsize>,
    responses: Vec<ResponseTemplate>,
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let attempt = self.counter.fetch_add(1, Ordering::SeqCst);
        let index = attempt.min(self.responses.len().saturating_sub(1));
        self.responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| ResponseTemplate::new(500))
    }
}
