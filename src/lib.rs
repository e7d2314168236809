/// Reelvault - client-side session and collection state engine
///
/// The engine behind a personal media-collection tracker: it keeps an
/// authenticated session alive across process restarts, re-validating
/// it against the server, and maintains a paginated, filtered, sorted
/// view of a remote collection that stays consistent under user
/// mutations, debounced query changes, and out-of-order network
/// replies. A UI embeds [`context::AppContext`] and renders the store
/// snapshots; rendering itself lives outside this crate.
pub mod api;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod query;
pub mod session;
pub mod storage;

pub use api::{AuthEvent, AuthEvents, MediaApi, RemoteApiClient, TokenCell};
pub use collection::{CollectionState, CollectionStore};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ClientError, ClientResult, FieldError};
pub use models::{
    CreateEntryFields, Entry, EntryDraft, EntryPage, EntryQuery, EntryType, LoginCredentials,
    Pagination, RegisterProfile, SortKey, SortOrder, StatsSnapshot, UpdateEntryFields, User,
};
pub use notify::{
    Notification, NotificationCategory, NotificationChannel, NotificationSource, StatusMessage,
};
pub use query::QueryCoordinator;
pub use session::{SessionState, SessionStatus, SessionStore};
pub use storage::{CredentialStore, JsonCredentialStore, MemoryCredentialStore, StoredCredentials};
