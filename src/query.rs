/// Derives the effective collection query from user input
use crate::{
    collection::CollectionStore,
    config::ClientConfig,
    models::{EntryQuery, EntryType, SortKey, SortOrder},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Transient query-building state
#[derive(Debug, Clone)]
pub struct QueryState {
    /// Search text as currently typed
    pub search_input: String,
    /// Search text after the last debounce settle; this is what the
    /// effective query carries
    pub settled_search: String,
    pub kind: Option<EntryType>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_input: String::new(),
            settled_search: String::new(),
            kind: None,
            sort_by: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
        }
    }
}

struct Inner {
    store: Arc<CollectionStore>,
    state: Mutex<QueryState>,
    debounce: Duration,
    page_limit: u32,
    search_epoch: AtomicU64,
}

/// Sole driver of [`CollectionStore::fetch`].
///
/// Search text contributes to the effective query only after it has
/// been stable for the configured quiet interval; filter, sort and page
/// changes take effect immediately. Any change to search, filter or
/// sort resets the page to 1 before the next fetch, since changing the
/// result set invalidates the old page number. Components must route
/// query changes through here rather than calling `fetch` from raw
/// input handlers.
#[derive(Clone)]
pub struct QueryCoordinator {
    inner: Arc<Inner>,
}

impl QueryCoordinator {
    pub fn new(store: Arc<CollectionStore>, config: &ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                state: Mutex::new(QueryState::default()),
                debounce: config.search_debounce(),
                page_limit: config.page_limit,
                search_epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> QueryState {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The settled combination of search/filter/sort/page
    pub fn effective_query(&self) -> EntryQuery {
        let state = self.state();
        EntryQuery {
            page: state.page,
            limit: self.inner.page_limit,
            search: state.settled_search,
            kind: state.kind,
            sort_by: state.sort_by,
            sort_order: state.sort_order,
        }
    }

    /// Record a keystroke in the search box.
    ///
    /// Starts (or restarts) the quiet-interval timer; only the value
    /// still current when the timer fires is settled into the query.
    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.search_input = text;
        }

        let epoch = self.inner.search_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(coordinator.inner.debounce).await;
            if coordinator.inner.search_epoch.load(Ordering::SeqCst) == epoch {
                coordinator.settle_search().await;
            }
        });
    }

    /// Adopt the current search input into the effective query
    async fn settle_search(&self) {
        let query = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.settled_search == state.search_input {
                // Nothing changed since the last settle
                return;
            }
            state.settled_search = state.search_input.clone();
            state.page = 1;
            self.effective_from(&state)
        };

        tracing::debug!(search = %query.search, "search settled");
        self.inner.store.fetch(query).await;
    }

    /// Switch the type filter; takes effect immediately
    pub async fn set_kind_filter(&self, kind: Option<EntryType>) {
        let query = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.kind == kind {
                return;
            }
            state.kind = kind;
            state.page = 1;
            self.effective_from(&state)
        };
        self.inner.store.fetch(query).await;
    }

    /// Switch the sort key/direction; takes effect immediately
    pub async fn set_sort(&self, sort_by: SortKey, sort_order: SortOrder) {
        let query = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.sort_by == sort_by && state.sort_order == sort_order {
                return;
            }
            state.sort_by = sort_by;
            state.sort_order = sort_order;
            state.page = 1;
            self.effective_from(&state)
        };
        self.inner.store.fetch(query).await;
    }

    /// Navigate to a page of the current result set
    pub async fn set_page(&self, page: u32) {
        let query = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.page == page {
                return;
            }
            state.page = page;
            self.effective_from(&state)
        };
        self.inner.store.fetch(query).await;
    }

    /// Re-issue the current effective query, e.g. to backfill the page
    /// after a delete
    pub async fn refresh(&self) {
        let query = self.effective_query();
        self.inner.store.fetch(query).await;
    }

    fn effective_from(&self, state: &QueryState) -> EntryQuery {
        EntryQuery {
            page: state.page,
            limit: self.inner.page_limit,
            search: state.settled_search.clone(),
            kind: state.kind,
            sort_by: state.sort_by,
            sort_order: state.sort_order,
        }
    }
}
