//! Admission control for upstream calls.
//!
//! One [`RequestLimiter`] is shared by every clone of a client, so the cap is
//! global to the process no matter how many lists load at once. Waiters are
//! admitted strictly in arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::error::GraphqlClientError;

/// Default cap on concurrently in-flight upstream calls.
pub const MAX_CONCURRENCY: usize = 2;

/// Permission to have one upstream call in flight.
///
/// Released exactly once: by [`RequestSlot::release`] or on drop.
#[derive(Debug)]
#[must_use = "dropping a slot releases it immediately"]
pub struct RequestSlot {
    _permit: OwnedSemaphorePermit,
}

impl RequestSlot {
    /// Give the slot back and admit the next waiter.
    pub fn release(self) {
        drop(self);
    }
}

#[derive(Debug)]
struct LimiterState {
    semaphore: Arc<Semaphore>,
    max: usize,
    queued: AtomicUsize,
}

/// FIFO concurrency limiter with cancellable waits.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    state: Arc<LimiterState>,
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::new(MAX_CONCURRENCY)
    }
}

impl RequestLimiter {
    /// Create a limiter; a cap of zero is raised to one.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        let max = max_concurrent.max(1);
        Self {
            state: Arc::new(LimiterState {
                semaphore: Arc::new(Semaphore::new(max)),
                max,
                queued: AtomicUsize::new(0),
            }),
        }
    }

    /// Configured cap.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.state.max
    }

    /// Slots currently granted.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state
            .max
            .saturating_sub(self.state.semaphore.available_permits())
    }

    /// Callers currently waiting for a slot.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.state.queued.load(Ordering::SeqCst)
    }

    /// Wait for a slot.
    ///
    /// Fails with [`GraphqlClientError::Cancelled`] if `signal` has already
    /// fired or fires while queued; a cancelled waiter leaves the queue and is
    /// never granted.
    pub async fn acquire(
        &self,
        signal: &CancellationSignal,
    ) -> Result<RequestSlot, GraphqlClientError> {
        signal.check()?;

        if let Ok(permit) = Arc::clone(&self.state.semaphore).try_acquire_owned() {
            return Ok(RequestSlot { _permit: permit });
        }

        let _waiting = QueueGuard::enter(&self.state.queued);
        debug!(
            in_flight = self.in_flight(),
            queued = self.queued(),
            "waiting for request slot"
        );

        tokio::select! {
            biased;
            reason = signal.cancelled() => Err(GraphqlClientError::Cancelled { reason }),
            permit = Arc::clone(&self.state.semaphore).acquire_owned() => permit
                .map(|permit| RequestSlot { _permit: permit })
                .map_err(|_| GraphqlClientError::Protocol {
                    message: "request limiter closed".to_string(),
                }),
        }
    }
}

struct QueueGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> QueueGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for QueueGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
