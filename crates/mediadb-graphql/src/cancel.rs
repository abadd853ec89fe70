//! Cancellation signals shared between callers, the limiter and the client.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::GraphqlClientError;

/// Why a signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The caller tore down the work (navigation, unmount, superseded generation).
    External,
    /// The request deadline elapsed.
    Timeout,
}

impl CancelReason {
    /// Failure text surfaced for this reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::External => "The operation was aborted.",
            Self::Timeout => "Request timed out",
        }
    }
}

/// Shared, inspectable cancellation flag.
///
/// Clones observe the same flag. The first trigger wins and fixes the
/// [`CancelReason`]; later triggers are ignored.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    state: Arc<watch::Sender<Option<CancelReason>>>,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    /// Create a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Trigger with [`CancelReason::External`].
    ///
    /// Returns `true` if this call fired the signal.
    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelReason::External)
    }

    /// Trigger with an explicit reason.
    ///
    /// Returns `true` if this call fired the signal.
    pub fn cancel_with(&self, reason: CancelReason) -> bool {
        self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    /// Returns `true` once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The reason the signal fired, if it has.
    pub fn reason(&self) -> Option<CancelReason> {
        *self.state.borrow()
    }

    /// Fail fast with [`GraphqlClientError::Cancelled`] if the signal has fired.
    pub fn check(&self) -> Result<(), GraphqlClientError> {
        match self.reason() {
            Some(reason) => Err(GraphqlClientError::Cancelled { reason }),
            None => Ok(()),
        }
    }

    /// Resolve once the signal fires.
    pub async fn cancelled(&self) -> CancelReason {
        let mut rx = self.state.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Unreachable: `self` owns the sender.
                return std::future::pending().await;
            }
        }
    }
}

/// Per-request signal composed from the caller's signal and a deadline.
///
/// The deadline timer is aborted when this value is dropped, so every exit
/// path of a request clears it.
#[derive(Debug)]
pub struct EffectiveSignal {
    signal: CancellationSignal,
    timer: Option<JoinHandle<()>>,
}

impl EffectiveSignal {
    /// Link `parent` (if any) and a `timeout` (if any and non-zero).
    ///
    /// Must be called from within a tokio runtime when either input is set.
    pub fn new(parent: Option<&CancellationSignal>, timeout: Option<Duration>) -> Self {
        let signal = CancellationSignal::new();
        let timeout = timeout.filter(|duration| !duration.is_zero());

        if let Some(reason) = parent.and_then(CancellationSignal::reason) {
            signal.cancel_with(reason);
            return Self {
                signal,
                timer: None,
            };
        }

        let parent = parent.cloned();
        if parent.is_none() && timeout.is_none() {
            return Self {
                signal,
                timer: None,
            };
        }

        let child = signal.clone();
        let timer = tokio::spawn(async move {
            let reason = match (parent, timeout) {
                (Some(parent), Some(timeout)) => {
                    tokio::select! {
                        reason = parent.cancelled() => reason,
                        () = tokio::time::sleep(timeout) => CancelReason::Timeout,
                    }
                }
                (Some(parent), None) => parent.cancelled().await,
                (None, Some(timeout)) => {
                    tokio::time::sleep(timeout).await;
                    CancelReason::Timeout
                }
                (None, None) => return,
            };
            child.cancel_with(reason);
        });

        Self {
            signal,
            timer: Some(timer),
        }
    }

    /// The composed signal.
    pub const fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// Returns `true` if the deadline (not the caller) fired the signal.
    pub fn timed_out(&self) -> bool {
        self.signal.reason() == Some(CancelReason::Timeout)
    }
}

impl Drop for EffectiveSignal {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Sleep for `duration` unless `signal` fires first.
pub async fn sleep_with_signal(
    duration: Duration,
    signal: &CancellationSignal,
) -> Result<(), GraphqlClientError> {
    signal.check()?;
    tokio::select! {
        () = tokio::time::sleep(duration) => Ok(()),
        reason = signal.cancelled() => Err(GraphqlClientError::Cancelled { reason }),
    }
}
