//! Paginated list controller.
//!
//! One controller backs one list on one screen. It owns the accumulated
//! items and the page cursor, and guarantees:
//!
//! - at most one fetch is outstanding at a time;
//! - an item identity appears at most once, in first-seen order;
//! - a failed fetch leaves items and cursor exactly as they were;
//! - a response that arrives after [`ListController::invalidate`] or a
//!   newer fetch is discarded.
//!
//! Scrolling loads automatically for the first few pages, after which the
//! screen shows an explicit "load more" control.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, instrument, warn};

use bazaar_core::{ErrorKind, Keyed, PageSource, Result};

use crate::collection::ItemCollection;
use crate::scroll::{LoadMode, ScrollMetrics};

/// Items requested per page unless a screen overrides it.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pages reachable by scrolling before "load more" takes over.
pub const DEFAULT_AUTO_SCROLL_PAGE_LIMIT: u32 = 5;

/// Distance from the bottom, in pixels, that counts as "near the bottom".
pub const DEFAULT_NEAR_BOTTOM_THRESHOLD: f64 = 300.0;

/// Per-screen tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListConfig {
    pub page_size: u32,
    pub auto_scroll_page_limit: u32,
    pub near_bottom_threshold: f64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            auto_scroll_page_limit: DEFAULT_AUTO_SCROLL_PAGE_LIMIT,
            near_bottom_threshold: DEFAULT_NEAR_BOTTOM_THRESHOLD,
        }
    }
}

impl ListConfig {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_auto_scroll_page_limit(mut self, limit: u32) -> Self {
        self.auto_scroll_page_limit = limit;
        self
    }

    pub fn with_near_bottom_threshold(mut self, threshold: f64) -> Self {
        self.near_bottom_threshold = threshold;
        self
    }
}

/// Position of the list within the server-side sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    /// Last page merged into the collection; 1 before anything is loaded.
    pub current_page: u32,
    /// Extent reported by the most recent successful fetch; 0 until then.
    pub total_pages: u32,
    pub is_fetching: bool,
}

impl CursorState {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// The last fetch failure, kept for display until the next success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&bazaar_core::Error> for FetchFailure {
    fn from(err: &bazaar_core::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Why a load request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is outstanding.
    Busy,
    /// The last page has been reached.
    Exhausted,
    /// The viewport is not close enough to the end of the content.
    NotNearBottom,
    /// Automatic loading is capped; the user has to ask for more.
    ManualMode,
}

/// Result of a load request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// `page` was fetched and merged, adding `added` new items.
    Loaded { page: u32, added: usize },
    /// Nothing was fetched.
    Skipped(SkipReason),
    /// The response arrived for a superseded fetch and was dropped.
    Superseded,
}

/// Everything a screen needs to render the list.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub cursor: CursorState,
    pub mode: LoadMode,
    pub has_more: bool,
    /// True when the screen should render a "load more" control.
    pub show_load_more: bool,
    pub last_error: Option<FetchFailure>,
}

struct ListState<T: Keyed, F> {
    items: ItemCollection<T>,
    current_page: u32,
    total_pages: u32,
    fetching: bool,
    generation: u64,
    filters: F,
    last_error: Option<FetchFailure>,
}

impl<T: Keyed, F: Default> ListState<T, F> {
    fn new() -> Self {
        Self {
            items: ItemCollection::new(),
            current_page: 1,
            total_pages: 0,
            fetching: false,
            generation: 0,
            filters: F::default(),
            last_error: None,
        }
    }
}

impl<T: Keyed, F> ListState<T, F> {
    fn cursor(&self) -> CursorState {
        CursorState {
            current_page: self.current_page,
            total_pages: self.total_pages,
            is_fetching: self.fetching,
        }
    }

    fn mode(&self, config: &ListConfig) -> LoadMode {
        if self.current_page <= config.auto_scroll_page_limit {
            LoadMode::Auto
        } else {
            LoadMode::Manual
        }
    }

    /// Claim the fetch slot, returning the new generation.
    fn begin_fetch(&mut self) -> u64 {
        self.fetching = true;
        self.generation += 1;
        self.generation
    }
}

/// Releases the fetch slot if the fetch is dropped before it settles.
struct FetchSlot<'a, T: Keyed, F> {
    state: &'a Mutex<ListState<T, F>>,
    generation: u64,
}

impl<T: Keyed, F> Drop for FetchSlot<'_, T, F> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.generation == self.generation {
            state.fetching = false;
        }
    }
}

fn lock<T: Keyed, F>(state: &Mutex<ListState<T, F>>) -> MutexGuard<'_, ListState<T, F>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drives one paginated list.
pub struct ListController<S: PageSource> {
    source: S,
    config: ListConfig,
    state: Mutex<ListState<S::Item, S::Filters>>,
}

impl<S: PageSource> ListController<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ListConfig::default())
    }

    pub fn with_config(source: S, config: ListConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(ListState::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Fetch page 1 with `filters` and replace the collection.
    ///
    /// The filters become the list's active filters only once the fetch
    /// succeeds. Does nothing while another fetch is outstanding.
    #[instrument(skip_all, fields(page = 1))]
    pub async fn refresh(&self, filters: S::Filters) -> Result<LoadOutcome> {
        let generation = {
            let mut state = lock(&self.state);
            if state.fetching {
                debug!("refresh skipped, fetch in progress");
                return Ok(LoadOutcome::Skipped(SkipReason::Busy));
            }
            state.begin_fetch()
        };
        let _slot = FetchSlot {
            state: &self.state,
            generation,
        };

        let result = self
            .source
            .fetch_page(1, self.config.page_size, &filters)
            .await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(generation, "discarding superseded refresh");
            return Ok(LoadOutcome::Superseded);
        }
        state.fetching = false;

        match result {
            Ok(page) => {
                let added = state.items.replace(page.items);
                state.current_page = 1;
                state.total_pages = page.total_pages;
                state.filters = filters;
                state.last_error = None;
                debug!(added, total_pages = page.total_pages, "list refreshed");
                Ok(LoadOutcome::Loaded { page: 1, added })
            }
            Err(err) => {
                warn!(error = %err, "refresh failed");
                state.last_error = Some(FetchFailure::from(&err));
                Err(err)
            }
        }
    }

    /// Fetch the page after the current one and append its new items.
    ///
    /// Does nothing while another fetch is outstanding or once the last page
    /// has been merged. This is the "load more" action and is not subject to
    /// the automatic-loading cap.
    #[instrument(skip_all)]
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (generation, next, filters) = {
            let mut state = lock(&self.state);
            if state.fetching {
                debug!("load more skipped, fetch in progress");
                return Ok(LoadOutcome::Skipped(SkipReason::Busy));
            }
            if state.current_page >= state.total_pages {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            let next = state.current_page + 1;
            (state.begin_fetch(), next, state.filters.clone())
        };
        let _slot = FetchSlot {
            state: &self.state,
            generation,
        };

        let result = self
            .source
            .fetch_page(next, self.config.page_size, &filters)
            .await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(page = next, generation, "discarding superseded page");
            return Ok(LoadOutcome::Superseded);
        }
        state.fetching = false;

        match result {
            Ok(page) => {
                let added = state.items.append(page.items);
                state.current_page = next;
                state.total_pages = page.total_pages;
                state.last_error = None;
                debug!(page = next, added, "page appended");
                Ok(LoadOutcome::Loaded { page: next, added })
            }
            Err(err) => {
                warn!(page = next, error = %err, "load more failed");
                state.last_error = Some(FetchFailure::from(&err));
                Err(err)
            }
        }
    }

    /// React to a scroll position.
    ///
    /// Loads the next page when the viewport is near the bottom and the list
    /// is still in automatic mode.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Result<LoadOutcome> {
        if !metrics.is_near_bottom(self.config.near_bottom_threshold) {
            return Ok(LoadOutcome::Skipped(SkipReason::NotNearBottom));
        }
        if self.load_mode() == LoadMode::Manual {
            return Ok(LoadOutcome::Skipped(SkipReason::ManualMode));
        }
        self.load_more().await
    }

    /// Abandon any outstanding fetch.
    ///
    /// Its response will be dropped when it arrives, and a new fetch may
    /// start immediately. Items and cursor are left alone.
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.fetching = false;
    }

    /// Invalidate and return to the initial, empty state.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        let generation = state.generation + 1;
        *state = ListState::new();
        state.generation = generation;
    }

    pub fn load_mode(&self) -> LoadMode {
        lock(&self.state).mode(&self.config)
    }

    pub fn cursor(&self) -> CursorState {
        lock(&self.state).cursor()
    }

    pub fn filters(&self) -> S::Filters {
        lock(&self.state).filters.clone()
    }

    pub fn items(&self) -> Vec<S::Item> {
        lock(&self.state).items.as_slice().to_vec()
    }

    pub fn snapshot(&self) -> ListSnapshot<S::Item> {
        let state = lock(&self.state);
        let cursor = state.cursor();
        let mode = state.mode(&self.config);
        ListSnapshot {
            items: state.items.as_slice().to_vec(),
            cursor,
            mode,
            has_more: cursor.has_more(),
            show_load_more: mode == LoadMode::Manual && cursor.has_more(),
            last_error: state.last_error.clone(),
        }
    }
}

impl<S: PageSource + std::fmt::Debug> std::fmt::Debug for ListController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ListController")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("items", &state.items.len())
            .field("cursor", &state.cursor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bazaar_core::Page;
    use bazaar_core::error::TransportError;
    use tokio::sync::Semaphore;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Listing(String);

    impl Keyed for Listing {
        type Key = String;

        fn key(&self) -> String {
            self.0.clone()
        }
    }

    /// Serves `total_pages` pages of two items each, prefixed by the filter.
    struct Catalog {
        total_pages: u32,
        overrides: HashMap<u32, Vec<&'static str>>,
        failing: std::sync::Mutex<HashSet<u32>>,
        gate: Option<Arc<Semaphore>>,
        calls: AtomicUsize,
    }

    impl Catalog {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                overrides: HashMap::new(),
                failing: std::sync::Mutex::new(HashSet::new()),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_page(mut self, page: u32, ids: Vec<&'static str>) -> Self {
            self.overrides.insert(page, ids);
            self
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn fail_page(&self, page: u32) {
            self.failing.lock().unwrap().insert(page);
        }

        fn heal_page(&self, page: u32) {
            self.failing.lock().unwrap().remove(&page);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for Catalog {
        type Item = Listing;
        type Filters = String;

        async fn fetch_page(
            &self,
            page: u32,
            _page_size: u32,
            filters: &String,
        ) -> Result<Page<Listing>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if self.failing.lock().unwrap().contains(&page) {
                return Err(TransportError::Connection {
                    message: "connection reset".to_string(),
                }
                .into());
            }
            let ids: Vec<String> = match self.overrides.get(&page) {
                Some(ids) => ids.iter().map(|id| id.to_string()).collect(),
                None => vec![format!("{}-a", page), format!("{}-b", page)],
            };
            let items = ids
                .into_iter()
                .map(|id| Listing(format!("{}{}", filters, id)))
                .collect();
            Ok(Page::new(items, self.total_pages))
        }
    }

    fn keys(controller: &ListController<Catalog>) -> Vec<String> {
        controller.items().into_iter().map(|l| l.0).collect()
    }

    fn near_bottom() -> ScrollMetrics {
        ScrollMetrics::new(1900.0, 800.0, 2800.0)
    }

    async fn wait_until_fetching<S: PageSource>(controller: &ListController<S>) {
        while !controller.cursor().is_fetching {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn overlapping_pages_are_merged_without_duplicates() {
        let catalog = Catalog::new(2)
            .with_page(1, vec!["A", "B"])
            .with_page(2, vec!["B", "C"]);
        let controller = ListController::new(catalog);

        controller.refresh(String::new()).await.unwrap();
        let outcome = controller.load_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, added: 1 });
        assert_eq!(keys(&controller), vec!["A", "B", "C"]);
        assert_eq!(
            controller.cursor(),
            CursorState {
                current_page: 2,
                total_pages: 2,
                is_fetching: false,
            }
        );
    }

    #[tokio::test]
    async fn load_more_before_any_refresh_is_exhausted() {
        let controller = ListController::new(Catalog::new(3));
        let outcome = controller.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Exhausted));
        assert_eq!(controller.source().calls(), 0);
    }

    #[tokio::test]
    async fn load_more_stops_at_last_page() {
        let controller = ListController::new(Catalog::new(2));
        controller.refresh(String::new()).await.unwrap();
        controller.load_more().await.unwrap();

        let outcome = controller.load_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Exhausted));
        assert_eq!(controller.source().calls(), 2);
    }

    #[tokio::test]
    async fn repeated_load_more_while_fetching_is_ignored() {
        let gate = Arc::new(Semaphore::new(1));
        let controller = Arc::new(ListController::new(Catalog::new(4).gated(gate.clone())));
        controller.refresh(String::new()).await.unwrap();

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.load_more().await })
        };
        wait_until_fetching(&controller).await;

        for _ in 0..3 {
            let outcome = controller.load_more().await.unwrap();
            assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Busy));
        }
        let outcome = controller.refresh(String::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Busy));

        gate.add_permits(1);
        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, added: 2 });
        assert_eq!(controller.source().calls(), 2);
        assert_eq!(keys(&controller), vec!["1-a", "1-b", "2-a", "2-b"]);
    }

    #[tokio::test]
    async fn scrolling_loads_automatically_up_to_the_cap() {
        let controller = ListController::new(Catalog::new(10));
        controller.refresh(String::new()).await.unwrap();

        for expected in 2..=6 {
            let outcome = controller.on_scroll(near_bottom()).await.unwrap();
            assert!(matches!(outcome, LoadOutcome::Loaded { page, .. } if page == expected));
        }

        assert_eq!(controller.load_mode(), LoadMode::Manual);
        let outcome = controller.on_scroll(near_bottom()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::ManualMode));

        let snapshot = controller.snapshot();
        assert!(snapshot.show_load_more);
        assert!(snapshot.has_more);
        assert_eq!(snapshot.cursor.current_page, 6);

        let outcome = controller.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 7, added: 2 });
    }

    #[tokio::test]
    async fn scrolling_far_from_bottom_does_nothing() {
        let controller = ListController::new(Catalog::new(3));
        controller.refresh(String::new()).await.unwrap();

        let metrics = ScrollMetrics::new(0.0, 800.0, 2800.0);
        let outcome = controller.on_scroll(metrics).await.unwrap();

        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::NotNearBottom));
        assert_eq!(controller.source().calls(), 1);
    }

    #[tokio::test]
    async fn refresh_returns_to_auto_mode() {
        let config = ListConfig::default().with_auto_scroll_page_limit(1);
        let controller = ListController::with_config(Catalog::new(5), config);
        controller.refresh(String::new()).await.unwrap();
        controller.load_more().await.unwrap();
        assert_eq!(controller.load_mode(), LoadMode::Manual);

        controller.refresh("new:".to_string()).await.unwrap();

        assert_eq!(controller.load_mode(), LoadMode::Auto);
        assert_eq!(keys(&controller), vec!["new:1-a", "new:1-b"]);
        assert_eq!(controller.filters(), "new:");
    }

    #[tokio::test]
    async fn failed_load_more_leaves_state_untouched() {
        let controller = ListController::new(Catalog::new(3));
        controller.refresh(String::new()).await.unwrap();
        let before = controller.cursor();
        controller.source().fail_page(2);

        let err = controller.load_more().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(controller.cursor(), before);
        assert_eq!(keys(&controller), vec!["1-a", "1-b"]);
        let failure = controller.snapshot().last_error.unwrap();
        assert_eq!(failure.kind, ErrorKind::Network);

        controller.source().heal_page(2);
        let outcome = controller.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, added: 2 });
        assert!(controller.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_items_and_filters() {
        let controller = ListController::new(Catalog::new(3));
        controller.refresh("old:".to_string()).await.unwrap();
        controller.source().fail_page(1);

        assert!(controller.refresh("new:".to_string()).await.is_err());

        assert_eq!(keys(&controller), vec!["old:1-a", "old:1-b"]);
        assert_eq!(controller.filters(), "old:");
        assert!(!controller.cursor().is_fetching);
    }

    #[tokio::test]
    async fn invalidated_response_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let controller = Arc::new(ListController::new(Catalog::new(3).gated(gate.clone())));

        let stale = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh("old:".to_string()).await })
        };
        wait_until_fetching(&controller).await;
        controller.invalidate();
        assert!(!controller.cursor().is_fetching);

        let fresh = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh("new:".to_string()).await })
        };
        wait_until_fetching(&controller).await;

        gate.add_permits(1);
        assert_eq!(stale.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert!(controller.items().is_empty());
        assert!(controller.cursor().is_fetching);

        gate.add_permits(1);
        assert_eq!(
            fresh.await.unwrap().unwrap(),
            LoadOutcome::Loaded { page: 1, added: 2 }
        );
        assert_eq!(keys(&controller), vec!["new:1-a", "new:1-b"]);
    }

    #[tokio::test]
    async fn dropped_fetch_releases_the_slot() {
        let gate = Arc::new(Semaphore::new(0));
        let controller = Arc::new(ListController::new(Catalog::new(3).gated(gate.clone())));

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh(String::new()).await })
        };
        wait_until_fetching(&controller).await;
        task.abort();
        let _ = task.await;

        assert!(!controller.cursor().is_fetching);
        gate.add_permits(1);
        let outcome = controller.refresh(String::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 1, added: 2 });
    }

    #[tokio::test]
    async fn reset_clears_items_and_cursor() {
        let controller = ListController::new(Catalog::new(3));
        controller.refresh(String::new()).await.unwrap();

        controller.reset();

        let snapshot = controller.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.cursor.current_page, 1);
        assert_eq!(snapshot.cursor.total_pages, 0);
        assert!(!snapshot.show_load_more);
    }
}
