//! Tracing configuration for test output.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing for tests.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Honors `RUST_LOG`, otherwise logs the catalog crates at debug.
pub fn init_test_tracing() {
    init_test_tracing_with_filter(
        "info,mediadb_graphql=debug,mediadb_loader=debug,mediadb_catalog=debug",
    );
}

/// Initialize tracing with an explicit fallback filter.
pub fn init_test_tracing_with_filter(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_ansi(false)
                    .compact(),
            )
            .try_init();
    });
}
