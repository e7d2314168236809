/// Application context and dependency wiring
use crate::{
    api::{AuthEvents, MediaApi, RemoteApiClient, TokenCell},
    collection::CollectionStore,
    config::ClientConfig,
    error::ClientResult,
    notify::NotificationChannel,
    query::QueryCoordinator,
    session::SessionStore,
    storage::{CredentialStore, JsonCredentialStore},
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Application context holding all shared engine components.
///
/// Components are constructed here and injected into each other
/// explicitly; nothing reaches for ambient globals. Must be built
/// inside a tokio runtime (the 401 watchdog is a spawned task).
pub struct AppContext {
    pub config: Arc<ClientConfig>,
    pub notifications: NotificationChannel,
    pub api: Arc<RemoteApiClient>,
    pub session: Arc<SessionStore>,
    pub collection: Arc<CollectionStore>,
    pub query: QueryCoordinator,
    watchdog: JoinHandle<()>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let token_cell = TokenCell::new();
        let auth_events = AuthEvents::new();
        let notifications = NotificationChannel::new(config.notification_ttl());

        let api = Arc::new(RemoteApiClient::new(
            &config,
            token_cell.clone(),
            auth_events.clone(),
        )?);

        let credentials: Arc<dyn CredentialStore> =
            Arc::new(JsonCredentialStore::new(&config.credential_file));

        let session = Arc::new(SessionStore::new(
            Arc::clone(&api) as Arc<dyn MediaApi>,
            credentials,
            token_cell,
            notifications.clone(),
        ));

        // Any 401 anywhere funnels into the session store exactly once
        let watchdog = session.spawn_watchdog(&auth_events);

        let collection = Arc::new(CollectionStore::new(
            Arc::clone(&api) as Arc<dyn MediaApi>,
            notifications.clone(),
        ));
        let query = QueryCoordinator::new(Arc::clone(&collection), &config);

        Ok(Self {
            config: Arc::new(config),
            notifications,
            api,
            session,
            collection,
            query,
            watchdog,
        })
    }

    /// Resolve the persisted session against the server.
    ///
    /// Call before issuing any request that assumes a valid credential.
    pub async fn startup(&self) {
        self.session.startup().await;
    }

    /// Tear down background tasks
    pub fn shutdown(&self) {
        self.watchdog.abort();
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.watchdog.abort();
    }
}
