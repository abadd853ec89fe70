//! The page-fetch contract between a loader and its data source.

use std::future::Future;

use futures_util::future::BoxFuture;
use mediadb_graphql::{CancellationSignal, GraphqlClientError};

/// One page to fetch.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Fires when the loader no longer wants the result.
    pub signal: CancellationSignal,
}

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    /// Items in upstream order.
    pub items: Vec<T>,
    /// Upstream says another page exists.
    pub has_next_page: bool,
}

impl<T> PageResult<T> {
    /// A page with an explicit continuation flag.
    #[must_use]
    pub const fn new(items: Vec<T>, has_next_page: bool) -> Self {
        Self {
            items,
            has_next_page,
        }
    }
}

/// Source of pages for a loader.
///
/// Implemented for any `Fn(PageRequest) -> impl Future` closure, so callers
/// usually pass an async closure over a client.
pub trait PageFetch<T>: Send + Sync {
    /// Fetch one page, honoring `request.signal`.
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResult<T>, GraphqlClientError>>;
}

impl<T, F, Fut> PageFetch<T> for F
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResult<T>, GraphqlClientError>> + Send + 'static,
{
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResult<T>, GraphqlClientError>> {
        Box::pin(self(request))
    }
}
