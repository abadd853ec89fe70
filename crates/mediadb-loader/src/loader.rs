//! Per-list pagination state machine.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mediadb_graphql::{CancellationSignal, ClassifiedError, GraphqlClientError, classify};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::page::{PageFetch, PageRequest, PageResult};

/// Loader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// First page requested on mount and after a reset.
    pub initial_page: u32,
    /// Page size passed to every fetch.
    pub per_page: u32,
    /// Hard cap on accumulated items.
    pub max_items: Option<usize>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            initial_page: 1,
            per_page: 10,
            max_items: None,
        }
    }
}

impl LoaderOptions {
    /// Set the page size.
    #[must_use]
    pub const fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Cap the number of items.
    #[must_use]
    pub const fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Start from another page.
    #[must_use]
    pub const fn with_initial_page(mut self, initial_page: u32) -> Self {
        self.initial_page = initial_page;
        self
    }
}

/// Coarse loader phase, derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    /// Never mounted.
    Idle,
    /// First page in flight.
    LoadingInitial,
    /// Items shown, more may follow.
    Ready,
    /// A follow-up page is in flight.
    LoadingMore,
    /// The last load failed.
    Error,
    /// No more pages (or the cap is reached).
    Ended,
    /// Torn down; no further updates.
    Unmounted,
}

/// Observable loader state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderSnapshot<T> {
    /// Accumulated items.
    pub items: Vec<T>,
    /// Next page to request.
    pub page: u32,
    /// No more pages will be requested.
    pub ended: bool,
    /// The first page is loading.
    pub loading_initial: bool,
    /// A follow-up page is loading.
    pub loading_more: bool,
    /// Last failure, already classified.
    pub error: Option<ClassifiedError>,
    /// Incremented by every [`IncrementalLoader::reset`].
    pub reset_tick: u64,
    /// `show_more` would fetch something.
    pub has_more: bool,
    /// Derived phase.
    pub phase: LoaderPhase,
}

struct LoaderState<T> {
    items: Vec<T>,
    page: u32,
    ended: bool,
    loading_initial: bool,
    loading_more: bool,
    error: Option<ClassifiedError>,
    in_flight: bool,
    reset_tick: u64,
    generation: u64,
    signal: Option<CancellationSignal>,
    mounted: bool,
    unmounted: bool,
    deps_hash: Option<u64>,
}

impl<T: Clone> LoaderState<T> {
    fn new(options: &LoaderOptions) -> Self {
        Self {
            items: Vec::new(),
            page: options.initial_page,
            ended: false,
            loading_initial: false,
            loading_more: false,
            error: None,
            in_flight: false,
            reset_tick: 0,
            generation: 0,
            signal: None,
            mounted: false,
            unmounted: false,
            deps_hash: None,
        }
    }

    fn cap_reached(&self, options: &LoaderOptions) -> bool {
        options.max_items.is_some_and(|cap| self.items.len() >= cap)
    }

    fn has_more(&self, options: &LoaderOptions) -> bool {
        !self.ended && !self.cap_reached(options)
    }

    fn phase(&self, options: &LoaderOptions) -> LoaderPhase {
        if self.unmounted {
            LoaderPhase::Unmounted
        } else if !self.mounted {
            LoaderPhase::Idle
        } else if self.loading_initial {
            LoaderPhase::LoadingInitial
        } else if self.loading_more {
            LoaderPhase::LoadingMore
        } else if self.error.is_some() {
            LoaderPhase::Error
        } else if !self.has_more(options) {
            LoaderPhase::Ended
        } else {
            LoaderPhase::Ready
        }
    }

    fn snapshot(&self, options: &LoaderOptions) -> LoaderSnapshot<T> {
        LoaderSnapshot {
            items: self.items.clone(),
            page: self.page,
            ended: self.ended,
            loading_initial: self.loading_initial,
            loading_more: self.loading_more,
            error: self.error.clone(),
            reset_tick: self.reset_tick,
            has_more: self.has_more(options),
            phase: self.phase(options),
        }
    }

    /// Store a fetched page and advance the cursor.
    fn apply_page(&mut self, requested: u32, result: PageResult<T>, options: &LoaderOptions) {
        let fetched = result.items.len();
        self.items.extend(result.items);
        if let Some(cap) = options.max_items {
            self.items.truncate(cap);
        }
        self.page = requested.saturating_add(1);
        let short_page = u32::try_from(fetched).is_ok_and(|n| n < options.per_page);
        if !result.has_next_page || short_page || self.cap_reached(options) {
            self.ended = true;
        }
    }

    /// Record a failure unless it is a cancellation.
    fn apply_error(&mut self, error: &GraphqlClientError) {
        let classified = classify(error);
        if classified.is_cancellation {
            return;
        }
        warn!(error = %classified.raw_message, "page load failed");
        self.error = Some(classified);
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.unmounted && self.generation == generation
    }
}

/// Incremental, race-safe page loader for one list.
///
/// All methods take `&self`; overlapping calls are resolved by the loader's
/// own flags and generation counter, so a view may fire `show_more` from
/// several places without coordinating.
pub struct IncrementalLoader<T> {
    fetch: Arc<dyn PageFetch<T>>,
    options: LoaderOptions,
    state: Mutex<LoaderState<T>>,
    updates: watch::Sender<LoaderSnapshot<T>>,
}

impl<T> IncrementalLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an unmounted loader. Nothing is fetched until
    /// [`load_initial`](Self::load_initial) or
    /// [`set_dependencies`](Self::set_dependencies).
    pub fn new(fetch: impl PageFetch<T> + 'static, options: LoaderOptions) -> Self {
        let state = LoaderState::new(&options);
        let (updates, _) = watch::channel(state.snapshot(&options));
        Self {
            fetch: Arc::new(fetch),
            options,
            state: Mutex::new(state),
            updates,
        }
    }

    /// Loader configuration.
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Current state.
    pub fn snapshot(&self) -> LoaderSnapshot<T> {
        self.state.lock().snapshot(&self.options)
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot<T>> {
        self.updates.subscribe()
    }

    /// `show_more` would fetch something.
    pub fn has_more(&self) -> bool {
        self.state.lock().has_more(&self.options)
    }

    /// Start a new generation and fetch the initial page.
    ///
    /// Any load of the previous generation is cancelled and its result
    /// discarded. Items from before stay visible until the new page lands.
    pub async fn load_initial(&self) {
        let (generation, signal) = {
            let mut state = self.state.lock();
            if state.unmounted {
                return;
            }
            if let Some(previous) = state.signal.take() {
                previous.cancel();
            }
            state.generation += 1;
            let signal = CancellationSignal::new();
            state.signal = Some(signal.clone());
            state.mounted = true;
            state.loading_initial = true;
            state.loading_more = false;
            state.error = None;
            state.page = self.options.initial_page;
            state.ended = false;
            state.in_flight = true;
            self.publish(&state);
            (state.generation, signal)
        };

        let page = self.options.initial_page;
        debug!(generation, page, "loading initial page");
        let outcome = self.fetch_page(page, signal).await;

        let mut state = self.state.lock();
        if !state.is_current(generation) {
            debug!(generation, "discarding superseded initial page");
            return;
        }
        state.in_flight = false;
        state.loading_initial = false;
        match outcome {
            Ok(result) => {
                state.items.clear();
                state.apply_page(page, result, &self.options);
            }
            Err(err) => {
                state.items.clear();
                state.apply_error(&err);
            }
        }
        self.publish(&state);
    }

    /// Reload when `deps` differ from the last call (the first call always
    /// loads).
    pub async fn set_dependencies<D: Hash + ?Sized>(&self, deps: &D) {
        let mut hasher = DefaultHasher::new();
        deps.hash(&mut hasher);
        let hash = hasher.finish();
        {
            let mut state = self.state.lock();
            if state.unmounted || state.deps_hash == Some(hash) {
                return;
            }
            state.deps_hash = Some(hash);
        }
        self.load_initial().await;
    }

    /// Fetch and append the next page.
    ///
    /// No-op while anything is loading, after the end of data, once the cap
    /// is met, before mount and after unmount.
    pub async fn show_more(&self) {
        let (generation, signal, page) = {
            let mut state = self.state.lock();
            if !state.mounted
                || state.unmounted
                || state.loading_initial
                || state.loading_more
                || state.in_flight
                || !state.has_more(&self.options)
            {
                return;
            }
            let Some(signal) = state.signal.clone() else {
                return;
            };
            state.loading_more = true;
            state.in_flight = true;
            state.error = None;
            self.publish(&state);
            (state.generation, signal, state.page)
        };

        debug!(generation, page, "loading more");
        let outcome = self.fetch_page(page, signal).await;

        let mut state = self.state.lock();
        if !state.is_current(generation) {
            debug!(generation, page, "discarding superseded page");
            return;
        }
        state.in_flight = false;
        state.loading_more = false;
        match outcome {
            Ok(result) => state.apply_page(page, result, &self.options),
            Err(err) => state.apply_error(&err),
        }
        self.publish(&state);
    }

    /// Clear everything, cancel in-flight work and load the initial page again.
    pub async fn reset(&self) {
        {
            let mut state = self.state.lock();
            if state.unmounted {
                return;
            }
            if let Some(previous) = state.signal.take() {
                previous.cancel();
            }
            // Results still in flight belong to a dead generation.
            state.generation += 1;
            state.items.clear();
            state.error = None;
            state.loading_more = false;
            state.in_flight = false;
            state.page = self.options.initial_page;
            state.ended = false;
            state.reset_tick += 1;
            debug!(reset_tick = state.reset_tick, "loader reset");
        }
        self.load_initial().await;
    }

    /// Cancel in-flight work and stop publishing.
    pub fn unmount(&self) {
        let mut state = self.state.lock();
        if state.unmounted {
            return;
        }
        if let Some(signal) = state.signal.take() {
            signal.cancel();
        }
        state.unmounted = true;
        state.in_flight = false;
        state.loading_initial = false;
        state.loading_more = false;
        self.publish(&state);
    }

    async fn fetch_page(
        &self,
        page: u32,
        signal: CancellationSignal,
    ) -> Result<PageResult<T>, GraphqlClientError> {
        let fetch = Arc::clone(&self.fetch);
        fetch
            .fetch(PageRequest {
                page,
                per_page: self.options.per_page,
                signal,
            })
            .await
    }

    fn publish(&self, state: &LoaderState<T>) {
        self.updates.send_replace(state.snapshot(&self.options));
    }
}

impl<T> Drop for IncrementalLoader<T> {
    fn drop(&mut self) {
        if let Some(signal) = self.state.get_mut().signal.take() {
            signal.cancel();
        }
    }
}

impl<T> std::fmt::Debug for IncrementalLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalLoader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
