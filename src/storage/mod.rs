/// Durable credential cache
///
/// Exactly two things persist across process restarts: the bearer token
/// and the last-known user record. They are written together on every
/// successful authentication and cleared together on logout or
/// invalidation. The cache only exists to avoid a visible logged-out
/// flash on startup; it is never trusted without re-validation.
mod json;
mod memory;

pub use json::JsonCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::{error::ClientResult, models::User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted credential pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredentials {
    pub token: String,
    pub user: User,
}

/// Backend for the persisted credential pair
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the persisted pair, `None` when absent or unreadable
    async fn load(&self) -> ClientResult<Option<StoredCredentials>>;

    /// Persist both keys as one write
    async fn save(&self, credentials: &StoredCredentials) -> ClientResult<()>;

    /// Remove the persisted pair; absent state is not an error
    async fn clear(&self) -> ClientResult<()>;
}
