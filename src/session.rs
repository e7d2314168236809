/// Authentication lifecycle: current user, credential token, and the
/// startup re-validation protocol
use crate::{
    api::{AuthEvent, AuthEvents, MediaApi, TokenCell},
    error::ClientResult,
    models::{LoginCredentials, RegisterProfile, User},
    notify::{NotificationChannel, NotificationSource, StatusMessage},
    storage::{CredentialStore, StoredCredentials},
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const LOGIN_SUCCESS: &str = "Login successful! Welcome back.";
const REGISTER_SUCCESS: &str = "Account created successfully! Welcome to the platform.";
const LOGOUT_SUCCESS: &str = "You have been logged out successfully.";
const SESSION_EXPIRED: &str = "Session expired. Please login again.";
const CHECK_FAILED: &str = "Authentication check failed.";

/// Authentication status of the running client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup re-validation has not resolved yet
    Resolving,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub status: SessionStatus,
    pub loading: bool,
    pub message: Option<StatusMessage>,
}

impl SessionState {
    /// State at process start: unresolved and loading
    pub fn initial() -> Self {
        Self {
            user: None,
            token: None,
            status: SessionStatus::Resolving,
            loading: true,
            message: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

/// Session state transitions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// An authentication operation began
    Started,
    /// The server accepted a credential
    Authenticated {
        user: User,
        token: String,
        message: Option<String>,
    },
    /// No valid session exists (failed login, rejected token, no
    /// persisted credential)
    Failed { message: Option<String> },
    /// The user logged out
    LoggedOut { message: String },
    MessageCleared,
}

/// Pure state transition function.
///
/// Maintains the invariant that `Authenticated` holds exactly when both
/// user and token are present.
pub fn reduce(state: SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::Started => SessionState {
            loading: true,
            message: None,
            ..state
        },
        SessionEvent::Authenticated {
            user,
            token,
            message,
        } => SessionState {
            user: Some(user),
            token: Some(token),
            status: SessionStatus::Authenticated,
            loading: false,
            message: message.map(StatusMessage::success),
        },
        SessionEvent::Failed { message } => SessionState {
            user: None,
            token: None,
            status: SessionStatus::Unauthenticated,
            loading: false,
            message: message.map(StatusMessage::error),
        },
        SessionEvent::LoggedOut { message } => SessionState {
            user: None,
            token: None,
            status: SessionStatus::Unauthenticated,
            loading: false,
            message: Some(StatusMessage::success(message)),
        },
        SessionEvent::MessageCleared => SessionState {
            message: None,
            ..state
        },
    }
}

/// Owner of the authentication lifecycle.
///
/// Until [`startup`](Self::startup) resolves, no other component should
/// issue requests that assume a valid credential. The persisted
/// credential pair is written only here.
pub struct SessionStore {
    api: Arc<dyn MediaApi>,
    credentials: Arc<dyn CredentialStore>,
    token_cell: TokenCell,
    notifier: NotificationChannel,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(
        api: Arc<dyn MediaApi>,
        credentials: Arc<dyn CredentialStore>,
        token_cell: TokenCell,
        notifier: NotificationChannel,
    ) -> Self {
        Self {
            api,
            credentials,
            token_cell,
            notifier,
            state: Mutex::new(SessionState::initial()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshot().status
    }

    fn dispatch(&self, event: SessionEvent) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = reduce(guard.clone(), event);
    }

    /// Resolve the persisted session against the server.
    ///
    /// A persisted credential is never trusted blindly: the token is
    /// seeded into the cell and `GET /auth/me` must confirm it. On
    /// confirmation the server's user record wins over the cached copy.
    pub async fn startup(&self) {
        self.dispatch(SessionEvent::Started);

        let stored = match self.credentials.load().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("credential cache unreadable: {}", e);
                self.dispatch(SessionEvent::Failed {
                    message: Some(CHECK_FAILED.to_string()),
                });
                self.notifier
                    .error(NotificationSource::Session, CHECK_FAILED);
                return;
            }
        };

        let Some(stored) = stored else {
            // Nothing persisted: quietly land on the login screen
            self.dispatch(SessionEvent::Failed { message: None });
            return;
        };

        self.token_cell.set(&stored.token);
        match self.api.fetch_self().await {
            Ok(user) => {
                tracing::debug!(user = %user.email, "persisted session re-validated");
                self.dispatch(SessionEvent::Authenticated {
                    user,
                    token: stored.token,
                    message: None,
                });
            }
            Err(e) => {
                tracing::info!("persisted session rejected: {}", e);
                self.purge_credentials().await;
                self.dispatch(SessionEvent::Failed {
                    message: Some(SESSION_EXPIRED.to_string()),
                });
                self.notifier
                    .error(NotificationSource::Session, SESSION_EXPIRED);
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// The error is re-raised so the login form can keep its input and
    /// show field-level messages.
    pub async fn login(&self, credentials: &LoginCredentials) -> ClientResult<()> {
        self.dispatch(SessionEvent::Started);

        match self.api.login(credentials).await {
            Ok(session) => {
                self.establish(session.user, session.token, LOGIN_SUCCESS)
                    .await;
                Ok(())
            }
            Err(e) => {
                let message = e.user_message("Login failed");
                self.dispatch(SessionEvent::Failed {
                    message: Some(message.clone()),
                });
                self.notifier.error(NotificationSource::Session, message);
                Err(e)
            }
        }
    }

    /// Create an account and authenticate in one step
    pub async fn register(&self, profile: &RegisterProfile) -> ClientResult<()> {
        self.dispatch(SessionEvent::Started);

        match self.api.register(profile).await {
            Ok(session) => {
                self.establish(session.user, session.token, REGISTER_SUCCESS)
                    .await;
                Ok(())
            }
            Err(e) => {
                let message = e.user_message("Registration failed");
                self.dispatch(SessionEvent::Failed {
                    message: Some(message.clone()),
                });
                self.notifier.error(NotificationSource::Session, message);
                Err(e)
            }
        }
    }

    /// Persist the accepted credential pair and enter `Authenticated`
    async fn establish(&self, user: User, token: String, message: &str) {
        let stored = StoredCredentials {
            token: token.clone(),
            user: user.clone(),
        };
        if let Err(e) = self.credentials.save(&stored).await {
            // The in-memory session is still valid; only restart
            // continuity is lost
            tracing::warn!("failed to persist credentials: {}", e);
        }
        self.token_cell.set(&token);

        self.dispatch(SessionEvent::Authenticated {
            user,
            token,
            message: Some(message.to_string()),
        });
        self.notifier.success(NotificationSource::Session, message);
    }

    /// End the session.
    ///
    /// The credential purge completes before anything else so a request
    /// issued after this point can never attach the stale token. The
    /// server-side logout is fire-and-forget.
    pub async fn logout(&self) {
        self.token_cell.clear();
        if let Err(e) = self.credentials.clear().await {
            tracing::warn!("failed to clear credential cache: {}", e);
        }

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            // Best-effort; the session is already gone locally
            let _ = api.logout().await;
        });

        self.dispatch(SessionEvent::LoggedOut {
            message: LOGOUT_SUCCESS.to_string(),
        });
        self.notifier
            .success(NotificationSource::Session, LOGOUT_SUCCESS);
    }

    /// React to a 401 observed anywhere in the client.
    ///
    /// Idempotent: the check-and-transition happens under one lock, so
    /// any number of concurrent 401s purge exactly once. Startup and
    /// login failures handle their own transition and are not affected.
    pub async fn handle_unauthorized(&self) {
        {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.status != SessionStatus::Authenticated {
                return;
            }
            *guard = reduce(
                guard.clone(),
                SessionEvent::Failed {
                    message: Some(SESSION_EXPIRED.to_string()),
                },
            );
        }

        tracing::info!("session invalidated by server");
        self.token_cell.clear();
        if let Err(e) = self.credentials.clear().await {
            tracing::warn!("failed to clear credential cache: {}", e);
        }
        self.notifier
            .error(NotificationSource::Session, SESSION_EXPIRED);
    }

    /// Listen for transport-level auth events for the lifetime of the
    /// session store
    pub fn spawn_watchdog(self: &Arc<Self>, events: &AuthEvents) -> JoinHandle<()> {
        let mut rx = events.subscribe();
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AuthEvent::Unauthorized) => store.handle_unauthorized().await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn purge_credentials(&self) {
        self.token_cell.clear();
        if let Err(e) = self.credentials.clear().await {
            tracing::warn!("failed to clear credential cache: {}", e);
        }
    }

    pub fn clear_message(&self) {
        self.dispatch(SessionEvent::MessageCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::error::ClientError;
    use crate::models::{sample_user, AuthSession};
    use crate::notify::NotificationCategory;
    use crate::storage::MemoryCredentialStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Credential store wrapper counting purges
    struct CountingStore {
        inner: MemoryCredentialStore,
        clears: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryCredentialStore::new(),
                clears: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for CountingStore {
        async fn load(&self) -> ClientResult<Option<StoredCredentials>> {
            self.inner.load().await
        }

        async fn save(&self, credentials: &StoredCredentials) -> ClientResult<()> {
            self.inner.save(credentials).await
        }

        async fn clear(&self) -> ClientResult<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear().await
        }
    }

    fn store_with(api: Arc<MockApi>, credentials: Arc<dyn CredentialStore>) -> SessionStore {
        SessionStore::new(
            api,
            credentials,
            TokenCell::new(),
            NotificationChannel::new(Duration::from_secs(5)),
        )
    }

    fn auth_session(token: &str) -> AuthSession {
        AuthSession {
            user: sample_user("1", "u@x.com"),
            token: token.to_string(),
        }
    }

    #[test]
    fn reducer_keeps_status_invariant() {
        let state = SessionState::initial();
        assert_eq!(state.status, SessionStatus::Resolving);
        assert!(state.loading);

        let state = reduce(
            state,
            SessionEvent::Authenticated {
                user: sample_user("1", "u@x.com"),
                token: "tok1".to_string(),
                message: Some("hi".to_string()),
            },
        );
        assert!(state.is_authenticated());
        assert!(state.user.is_some() && state.token.is_some());
        assert!(!state.loading);

        let state = reduce(state, SessionEvent::Failed { message: None });
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert!(state.user.is_none() && state.token.is_none());
        assert!(state.message.is_none());
    }

    #[test]
    fn reducer_clears_message_on_start() {
        let state = reduce(
            SessionState::initial(),
            SessionEvent::Failed {
                message: Some("bad".to_string()),
            },
        );
        assert!(state.message.is_some());

        let state = reduce(state, SessionEvent::Started);
        assert!(state.loading);
        assert!(state.message.is_none());
    }

    #[tokio::test]
    async fn startup_without_credentials_is_silent() {
        let api = Arc::new(MockApi::new());
        let store = store_with(api, Arc::new(MemoryCredentialStore::new()));

        store.startup().await;

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert!(state.message.is_none());
    }

    #[tokio::test]
    async fn startup_confirms_persisted_session_with_server_user() {
        let api = Arc::new(MockApi::new());
        // The server's copy has drifted from the cached one; the
        // server-confirmed record must win
        let mut server_user = sample_user("1", "u@x.com");
        server_user.first_name = "Updated".to_string();
        api.expect_self(Ok(server_user.clone()));

        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .save(&StoredCredentials {
                token: "tok1".to_string(),
                user: sample_user("1", "u@x.com"),
            })
            .await
            .unwrap();

        let store = store_with(api, credentials);
        store.startup().await;

        let state = store.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.token.as_deref(), Some("tok1"));
        assert_eq!(state.user.unwrap().first_name, "Updated");
    }

    #[tokio::test]
    async fn startup_purges_rejected_credentials() {
        let api = Arc::new(MockApi::new());
        api.expect_self(Err(ClientError::Unauthorized("Unauthorized".to_string())));

        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .save(&StoredCredentials {
                token: "stale".to_string(),
                user: sample_user("1", "u@x.com"),
            })
            .await
            .unwrap();

        let store = store_with(api, credentials.clone());
        store.startup().await;

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert_eq!(
            state.message,
            Some(StatusMessage::error("Session expired. Please login again."))
        );
        assert_eq!(credentials.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn login_persists_and_announces() {
        let api = Arc::new(MockApi::new());
        api.expect_login(Ok(auth_session("tok1")));

        let credentials = Arc::new(MemoryCredentialStore::new());
        let store = store_with(api, credentials.clone());

        store
            .login(&LoginCredentials {
                email: "u@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        let state = store.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(
            state.message,
            Some(StatusMessage::success("Login successful! Welcome back."))
        );

        let stored = credentials.load().await.unwrap().unwrap();
        assert_eq!(stored.token, "tok1");
        assert_eq!(stored.user.email, "u@x.com");
    }

    #[tokio::test]
    async fn login_failure_reraises_with_server_message() {
        let api = Arc::new(MockApi::new());
        api.expect_login(Err(ClientError::Unauthorized(
            "Invalid credentials".to_string(),
        )));

        let credentials = Arc::new(MemoryCredentialStore::new());
        let store = store_with(api, credentials.clone());

        let err = store
            .login(&LoginCredentials {
                email: "u@x.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        let message = state.message.unwrap();
        assert_eq!(message.text, "Invalid credentials");
        assert_eq!(message.category, NotificationCategory::Error);
        assert_eq!(credentials.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn register_uses_its_own_success_message() {
        let api = Arc::new(MockApi::new());
        api.expect_register(Ok(auth_session("tok2")));

        let store = store_with(api, Arc::new(MemoryCredentialStore::new()));
        store
            .register(&RegisterProfile {
                email: "u@x.com".to_string(),
                password: "secret".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            store.snapshot().message,
            Some(StatusMessage::success(
                "Account created successfully! Welcome to the platform."
            ))
        );
    }

    #[tokio::test]
    async fn logout_purges_before_notifying_the_server() {
        let api = Arc::new(MockApi::new());
        api.expect_login(Ok(auth_session("tok1")));

        let credentials = Arc::new(MemoryCredentialStore::new());
        let store = store_with(api.clone(), credentials.clone());
        store
            .login(&LoginCredentials {
                email: "u@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        store.logout().await;

        // Local purge is complete the moment logout returns
        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert_eq!(
            state.message,
            Some(StatusMessage::success(
                "You have been logged out successfully."
            ))
        );
        assert_eq!(credentials.load().await.unwrap(), None);

        // The fire-and-forget server call lands eventually
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(api.logout_calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_events_purge_exactly_once() {
        let api = Arc::new(MockApi::new());
        api.expect_login(Ok(auth_session("tok1")));

        let credentials = Arc::new(CountingStore::new());
        let store = Arc::new(SessionStore::new(
            api,
            credentials.clone(),
            TokenCell::new(),
            NotificationChannel::new(Duration::from_secs(5)),
        ));
        store
            .login(&LoginCredentials {
                email: "u@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        let baseline = credentials.clears.load(Ordering::SeqCst);

        let events = AuthEvents::new();
        let watchdog = store.spawn_watchdog(&events);

        // Three in-flight calls each observe a 401
        events.emit(AuthEvent::Unauthorized);
        events.emit(AuthEvent::Unauthorized);
        events.emit(AuthEvent::Unauthorized);

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        let state = store.snapshot();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert_eq!(
            state.message,
            Some(StatusMessage::error("Session expired. Please login again."))
        );
        assert_eq!(credentials.clears.load(Ordering::SeqCst) - baseline, 1);

        watchdog.abort();
    }

    #[tokio::test]
    async fn unauthorized_is_ignored_when_not_authenticated() {
        let api = Arc::new(MockApi::new());
        let credentials = Arc::new(CountingStore::new());
        let store = store_with(api, credentials.clone());

        store.handle_unauthorized().await;

        assert_eq!(store.snapshot().status, SessionStatus::Resolving);
        assert_eq!(credentials.clears.load(Ordering::SeqCst), 0);
    }
}
