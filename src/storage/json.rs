/// File-backed credential store
use crate::{
    error::{ClientError, ClientResult},
    storage::{CredentialStore, StoredCredentials},
};
use async_trait::async_trait;
use std::path::PathBuf;

/// Credential store persisting a single JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create parent directories if they don't exist
    async fn ensure_parent(&self) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ClientError::Internal(format!(
                        "Failed to create directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn load(&self) -> ClientResult<Option<StoredCredentials>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Io(e)),
        };

        match serde_json::from_slice(&bytes) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                tracing::warn!("discarding unreadable credential cache: {}", e);
                // Corrupt cache entries are deleted rather than surfaced
                let _ = tokio::fs::remove_file(&self.path).await;
                Ok(None)
            }
        }
    }

    async fn save(&self, credentials: &StoredCredentials) -> ClientResult<()> {
        self.ensure_parent().await?;

        let json = serde_json::to_vec_pretty(credentials)
            .map_err(|e| ClientError::Internal(format!("Failed to serialize credentials: {}", e)))?;
        tokio::fs::write(&self.path, json).await.map_err(ClientError::Io)?;

        tracing::debug!(path = ?self.path, "credential cache written");
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Io(e)),
        }
    }
}
