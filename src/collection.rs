/// In-memory paginated/filtered view of the remote collection
use crate::{
    api::MediaApi,
    error::ClientResult,
    models::{
        CreateEntryFields, Entry, EntryQuery, Pagination, StatsSnapshot, UpdateEntryFields,
    },
    notify::{NotificationChannel, NotificationSource, StatusMessage},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Snapshot of the collection state.
///
/// `entries` reflects exactly one server page; `query` is the query
/// whose response populated it. On a failed fetch the previous page
/// stays visible as of the last good fetch.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    pub entries: Vec<Entry>,
    pub current_entry: Option<Entry>,
    pub loading: bool,
    pub pagination: Option<Pagination>,
    pub query: Option<EntryQuery>,
    pub stats: Option<StatsSnapshot>,
    pub message: Option<StatusMessage>,
}

/// Collection state transitions
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    /// An operation began; clears any prior transient message
    LoadingStarted,
    /// A list response was accepted; replaces the page atomically
    PageLoaded {
        entries: Vec<Entry>,
        pagination: Pagination,
        query: EntryQuery,
    },
    EntryLoaded {
        entry: Entry,
    },
    /// A new entry was created; it becomes visible without a refetch
    Created {
        entry: Entry,
        message: String,
    },
    Updated {
        entry: Entry,
        message: String,
    },
    Deleted {
        id: String,
        message: String,
    },
    StatsLoaded {
        stats: StatsSnapshot,
    },
    /// An operation failed; prior entries stay untouched
    Failed {
        message: String,
    },
    MessageCleared,
    CurrentCleared,
    Reset,
}

/// Pure state transition function
pub fn reduce(state: CollectionState, event: CollectionEvent) -> CollectionState {
    match event {
        CollectionEvent::LoadingStarted => CollectionState {
            loading: true,
            message: None,
            ..state
        },
        CollectionEvent::PageLoaded {
            entries,
            pagination,
            query,
        } => CollectionState {
            entries,
            pagination: Some(pagination),
            query: Some(query),
            loading: false,
            message: None,
            ..state
        },
        CollectionEvent::EntryLoaded { entry } => CollectionState {
            current_entry: Some(entry),
            loading: false,
            ..state
        },
        CollectionEvent::Created { entry, message } => {
            let mut state = state;
            state.entries.insert(0, entry);
            state.loading = false;
            state.message = Some(StatusMessage::success(message));
            state
        }
        CollectionEvent::Updated { entry, message } => {
            let mut state = state;
            if let Some(existing) = state.entries.iter_mut().find(|e| e.id == entry.id) {
                *existing = entry.clone();
            }
            state.current_entry = Some(entry);
            state.loading = false;
            state.message = Some(StatusMessage::success(message));
            state
        }
        CollectionEvent::Deleted { id, message } => {
            let mut state = state;
            state.entries.retain(|entry| entry.id != id);
            state.loading = false;
            state.message = Some(StatusMessage::success(message));
            state
        }
        CollectionEvent::StatsLoaded { stats } => CollectionState {
            stats: Some(stats),
            loading: false,
            ..state
        },
        CollectionEvent::Failed { message } => CollectionState {
            loading: false,
            message: Some(StatusMessage::error(message)),
            ..state
        },
        CollectionEvent::MessageCleared => CollectionState {
            message: None,
            ..state
        },
        CollectionEvent::CurrentCleared => CollectionState {
            current_entry: None,
            ..state
        },
        CollectionEvent::Reset => CollectionState::default(),
    }
}

/// Owner of the collection view and its mutations.
///
/// Fetches follow the single-flight, latest-wins discipline: every
/// issued fetch takes a fresh sequence number, and only the response
/// matching the most recently issued number may mutate visible state.
/// A superseded response, success or failure, is silently dropped.
pub struct CollectionStore {
    api: Arc<dyn MediaApi>,
    notifier: NotificationChannel,
    state: Mutex<CollectionState>,
    fetch_seq: AtomicU64,
}

impl CollectionStore {
    pub fn new(api: Arc<dyn MediaApi>, notifier: NotificationChannel) -> Self {
        Self {
            api,
            notifier,
            state: Mutex::new(CollectionState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> CollectionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn dispatch(&self, event: CollectionEvent) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = reduce(guard.clone(), event);
    }

    /// Apply an event only if the fetch that produced it is still the
    /// most recently issued one
    fn dispatch_if_current(&self, seq: u64, event: CollectionEvent) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fetch_seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        *guard = reduce(guard.clone(), event);
        true
    }

    /// Load one page of the collection.
    ///
    /// Does not re-raise: there is no caller-side recovery beyond the
    /// passive message, and a stale page staying visible is the
    /// intended behavior on failure.
    pub async fn fetch(&self, query: EntryQuery) {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(CollectionEvent::LoadingStarted);

        let result = self.api.list_entries(&query).await;

        match result {
            Ok(page) => {
                let pagination = page.pagination.normalized();
                let applied = self.dispatch_if_current(
                    seq,
                    CollectionEvent::PageLoaded {
                        entries: page.data,
                        pagination,
                        query,
                    },
                );
                if !applied {
                    tracing::debug!(seq, "discarding superseded list response");
                }
            }
            Err(e) => {
                let message = e.user_message("Failed to fetch entries");
                if self.dispatch_if_current(seq, CollectionEvent::Failed {
                    message: message.clone(),
                }) {
                    self.notifier.error(NotificationSource::Collection, message);
                } else {
                    tracing::debug!(seq, "discarding superseded list failure");
                }
            }
        }
    }

    /// Load a single entry into the current-entry slot; the list is
    /// untouched
    pub async fn fetch_one(&self, id: &str) {
        self.dispatch(CollectionEvent::LoadingStarted);

        match self.api.get_entry(id).await {
            Ok(entry) => self.dispatch(CollectionEvent::EntryLoaded { entry }),
            Err(e) => {
                let message = e.user_message("Failed to fetch entry");
                self.dispatch(CollectionEvent::Failed {
                    message: message.clone(),
                });
                self.notifier.error(NotificationSource::Collection, message);
            }
        }
    }

    /// Create an entry; on success it is prepended to the visible page.
    ///
    /// The error is re-raised so the form can keep its input and show
    /// field-level messages.
    pub async fn create(&self, fields: &CreateEntryFields) -> ClientResult<Entry> {
        self.dispatch(CollectionEvent::LoadingStarted);

        match self.api.create_entry(fields).await {
            Ok(entry) => {
                let message = format!(
                    "\"{}\" has been added to your collection successfully!",
                    entry.title
                );
                self.dispatch(CollectionEvent::Created {
                    entry: entry.clone(),
                    message: message.clone(),
                });
                self.notifier
                    .success(NotificationSource::Collection, message);
                Ok(entry)
            }
            Err(e) => {
                let message = e.user_message("Failed to create entry");
                self.dispatch(CollectionEvent::Failed {
                    message: message.clone(),
                });
                self.notifier.error(NotificationSource::Collection, message);
                Err(e)
            }
        }
    }

    /// Update an entry in place; it also becomes the current entry
    pub async fn update(&self, id: &str, fields: &UpdateEntryFields) -> ClientResult<Entry> {
        self.dispatch(CollectionEvent::LoadingStarted);

        match self.api.update_entry(id, fields).await {
            Ok(entry) => {
                let message = format!("\"{}\" has been updated successfully!", entry.title);
                self.dispatch(CollectionEvent::Updated {
                    entry: entry.clone(),
                    message: message.clone(),
                });
                self.notifier
                    .success(NotificationSource::Collection, message);
                Ok(entry)
            }
            Err(e) => {
                let message = e.user_message("Failed to update entry");
                self.dispatch(CollectionEvent::Failed {
                    message: message.clone(),
                });
                self.notifier.error(NotificationSource::Collection, message);
                Err(e)
            }
        }
    }

    /// Delete an entry; the caller must not assume removal on failure
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.dispatch(CollectionEvent::LoadingStarted);

        match self.api.delete_entry(id).await {
            Ok(()) => {
                let message = "Entry has been deleted successfully!".to_string();
                self.dispatch(CollectionEvent::Deleted {
                    id: id.to_string(),
                    message: message.clone(),
                });
                self.notifier
                    .success(NotificationSource::Collection, message);
                Ok(())
            }
            Err(e) => {
                let message = e.user_message("Failed to delete entry");
                self.dispatch(CollectionEvent::Failed {
                    message: message.clone(),
                });
                self.notifier.error(NotificationSource::Collection, message);
                Err(e)
            }
        }
    }

    /// Refresh the server-computed statistics snapshot
    pub async fn fetch_statistics(&self) {
        self.dispatch(CollectionEvent::LoadingStarted);

        match self.api.get_statistics().await {
            Ok(stats) => self.dispatch(CollectionEvent::StatsLoaded { stats }),
            Err(e) => {
                let message = e.user_message("Failed to fetch statistics");
                self.dispatch(CollectionEvent::Failed {
                    message: message.clone(),
                });
                self.notifier.error(NotificationSource::Collection, message);
            }
        }
    }

    pub fn clear_current_entry(&self) {
        self.dispatch(CollectionEvent::CurrentCleared);
    }

    pub fn clear_message(&self) {
        self.dispatch(CollectionEvent::MessageCleared);
    }

    pub fn reset(&self) {
        self.dispatch(CollectionEvent::Reset);
    }
}
