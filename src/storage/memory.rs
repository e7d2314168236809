/// In-memory credential store for ephemeral sessions
use crate::{
    error::ClientResult,
    storage::{CredentialStore, StoredCredentials},
};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Credential store that never touches disk.
///
/// Useful for embedders that do not want a persisted session, and for
/// tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<StoredCredentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> ClientResult<Option<StoredCredentials>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, credentials: &StoredCredentials) -> ClientResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
