/// HTTP implementation of the backend gateway
use crate::{
    api::{unwrap_envelope, AuthEvent, AuthEvents, MediaApi, TokenCell},
    config::ClientConfig,
    error::{ClientError, ClientResult},
    models::{
        AuthSession, CreateEntryFields, Entry, EntryPage, EntryQuery, LoginCredentials,
        RegisterProfile, SelfPayload, StatsSnapshot, UpdateEntryFields, User,
    },
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

/// Route table for the backend API
mod routes {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const ME: &str = "/auth/me";
    pub const LOGOUT: &str = "/auth/logout";
    pub const ENTRIES: &str = "/entries";
    pub const ENTRY_STATS: &str = "/entries/stats/summary";

    pub fn entry_by_id(id: &str) -> String {
        format!("{}/{}", ENTRIES, id)
    }
}

/// reqwest-backed gateway to the collection backend.
///
/// Attaches the cached bearer credential to every request, accepts both
/// enveloped and bare success payloads, and classifies failures into
/// the [`ClientError`] taxonomy. Any 401 clears the token cell
/// synchronously and broadcasts [`AuthEvent::Unauthorized`], no matter
/// which call observed it.
pub struct RemoteApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenCell,
    auth_events: AuthEvents,
}

impl RemoteApiClient {
    /// Create a new client from configuration
    pub fn new(
        config: &ClientConfig,
        token: TokenCell,
        auth_events: AuthEvents,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            auth_events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer header when a credential is cached
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and surface non-success statuses as errors.
    ///
    /// A 401 invalidates the cached token before the event fan-out so
    /// no request issued after this point can still attach it.
    async fn send(&self, builder: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            tracing::warn!("received 401, invalidating session credential");
            self.token.clear();
            self.auth_events.emit(AuthEvent::Unauthorized);
        }

        Err(ClientError::from_status(status.as_u16(), &body))
    }

    /// Decode a success payload, tolerating the optional `data` envelope
    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("Malformed response: {}", e)))?;

        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| ClientError::Transport(format!("Unexpected response shape: {}", e)))
    }
}

#[async_trait]
impl MediaApi for RemoteApiClient {
    async fn login(&self, credentials: &LoginCredentials) -> ClientResult<AuthSession> {
        let request = self.http.post(self.url(routes::LOGIN)).json(credentials);
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }

    async fn register(&self, profile: &RegisterProfile) -> ClientResult<AuthSession> {
        let request = self.http.post(self.url(routes::REGISTER)).json(profile);
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }

    async fn fetch_self(&self) -> ClientResult<User> {
        let request = self.http.get(self.url(routes::ME));
        let response = self.send(self.authorize(request)).await?;
        let payload: SelfPayload = self.decode(response).await?;
        Ok(payload.user)
    }

    async fn logout(&self) -> ClientResult<()> {
        let request = self.http.post(self.url(routes::LOGOUT));
        self.send(self.authorize(request)).await?;
        Ok(())
    }

    async fn list_entries(&self, query: &EntryQuery) -> ClientResult<EntryPage> {
        tracing::debug!(page = query.page, search = %query.search, "fetching entries");

        let request = self
            .http
            .get(self.url(routes::ENTRIES))
            .query(&query.to_query_pairs());
        let response = self.send(self.authorize(request)).await?;

        // The page payload carries data and pagination side by side; it
        // may also arrive nested under an outer `data` wrapper.
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("Malformed response: {}", e)))?;
        serde_json::from_value::<EntryPage>(value.clone())
            .or_else(|_| serde_json::from_value(unwrap_envelope(value)))
            .map_err(|e| ClientError::Transport(format!("Unexpected response shape: {}", e)))
    }

    async fn get_entry(&self, id: &str) -> ClientResult<Entry> {
        let request = self.http.get(self.url(&routes::entry_by_id(id)));
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }

    async fn create_entry(&self, fields: &CreateEntryFields) -> ClientResult<Entry> {
        let request = self.http.post(self.url(routes::ENTRIES)).json(fields);
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }

    async fn update_entry(&self, id: &str, fields: &UpdateEntryFields) -> ClientResult<Entry> {
        let request = self.http.put(self.url(&routes::entry_by_id(id))).json(fields);
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }

    async fn delete_entry(&self, id: &str) -> ClientResult<()> {
        let request = self.http.delete(self.url(&routes::entry_by_id(id)));
        self.send(self.authorize(request)).await?;
        Ok(())
    }

    async fn get_statistics(&self) -> ClientResult<StatsSnapshot> {
        let request = self.http.get(self.url(routes::ENTRY_STATS));
        let response = self.send(self.authorize(request)).await?;
        self.decode(response).await
    }
}
