//! Test kit for the media catalog crates.
//!
//! - [`MockGraphqlServer`] - wiremock-backed GraphQL endpoint with scripted replies
//! - [`fixtures`] - JSON builders for catalog payloads
//! - Tracing configuration for test output
//!
//! # Example
//!
//! ```rust,ignore
//! use mediadb_testkit::{MockGraphqlServer, fixtures, init_test_tracing};
//!
//! #[tokio::test]
//! async fn loads_first_page() {
//!     init_test_tracing();
//!     let server = MockGraphqlServer::start().await;
//!     server.expect_data(fixtures::page_data(&[1, 2], false)).await;
//!     // point a client at server.url() ...
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
mod mock_server;
mod tracing_config;

pub use mock_server::*;
pub use tracing_config::*;
