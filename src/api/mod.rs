/// Typed gateway to the backend API
///
/// The [`MediaApi`] trait is the seam between the stores and the
/// network: the concrete [`RemoteApiClient`] speaks HTTP via reqwest,
/// while tests script an in-memory implementation. The shared
/// [`TokenCell`] holds the in-memory bearer credential and is
/// invalidated synchronously on logout or 401 so a stale token can
/// never ride along on a request issued after the purge.
mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::RemoteApiClient;

use crate::{
    error::ClientResult,
    models::{
        AuthSession, CreateEntryFields, Entry, EntryPage, EntryQuery, LoginCredentials,
        RegisterProfile, StatsSnapshot, UpdateEntryFields, User,
    },
};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Operations exposed by the backend
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> ClientResult<AuthSession>;
    async fn register(&self, profile: &RegisterProfile) -> ClientResult<AuthSession>;
    async fn fetch_self(&self) -> ClientResult<User>;
    /// Best-effort server-side logout; callers ignore failures
    async fn logout(&self) -> ClientResult<()>;
    async fn list_entries(&self, query: &EntryQuery) -> ClientResult<EntryPage>;
    async fn get_entry(&self, id: &str) -> ClientResult<Entry>;
    async fn create_entry(&self, fields: &CreateEntryFields) -> ClientResult<Entry>;
    async fn update_entry(&self, id: &str, fields: &UpdateEntryFields) -> ClientResult<Entry>;
    async fn delete_entry(&self, id: &str) -> ClientResult<()>;
    async fn get_statistics(&self) -> ClientResult<StatsSnapshot>;
}

/// Shared in-memory bearer credential.
///
/// Written by the session store (login/register/logout) and by the HTTP
/// client on 401; read once per request when attaching the auth header.
#[derive(Debug, Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Session-level events observed at the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A 401 response was received on some in-flight call
    Unauthorized,
}

/// Fan-out channel for [`AuthEvent`]s.
///
/// Any component may subscribe; emitting without subscribers is not an
/// error (nothing is listening before the session store is wired up).
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the optional `{"data": ...}` envelope from a response payload.
///
/// The backend wraps most success payloads under a `data` key but the
/// client accepts either shape.
pub(crate) fn unwrap_envelope(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}
