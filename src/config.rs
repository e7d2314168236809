/// Configuration management for the Reelvault client engine
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
///
/// Loaded once at startup and shared read-only by every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend API, including any path prefix
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Page size requested from the list endpoint
    pub page_limit: u32,
    /// Quiet interval before a search term contributes to the query
    pub search_debounce_ms: u64,
    /// Lifetime of success/info notifications before auto-expiry
    pub notification_ttl_secs: u64,
    /// File holding the persisted credential cache
    pub credential_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            request_timeout_secs: 10,
            user_agent: format!("reelvault/{}", env!("CARGO_PKG_VERSION")),
            page_limit: 20,
            search_debounce_ms: 500,
            notification_ttl_secs: 5,
            credential_file: PathBuf::from("./data/credentials.json"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ClientResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let base_url = env::var("REELVAULT_API_URL").unwrap_or(defaults.base_url);
        let request_timeout_secs = env::var("REELVAULT_REQUEST_TIMEOUT")
            .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
            .parse()
            .map_err(|_| ClientError::Internal("Invalid request timeout".to_string()))?;
        let page_limit = env::var("REELVAULT_PAGE_LIMIT")
            .unwrap_or_else(|_| defaults.page_limit.to_string())
            .parse()
            .map_err(|_| ClientError::Internal("Invalid page limit".to_string()))?;
        let search_debounce_ms = env::var("REELVAULT_SEARCH_DEBOUNCE_MS")
            .unwrap_or_else(|_| defaults.search_debounce_ms.to_string())
            .parse()
            .map_err(|_| ClientError::Internal("Invalid search debounce".to_string()))?;
        let notification_ttl_secs = env::var("REELVAULT_NOTIFICATION_TTL")
            .unwrap_or_else(|_| defaults.notification_ttl_secs.to_string())
            .parse()
            .map_err(|_| ClientError::Internal("Invalid notification TTL".to_string()))?;
        let credential_file = env::var("REELVAULT_CREDENTIAL_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.credential_file);

        let config = Self {
            base_url,
            request_timeout_secs,
            user_agent: defaults.user_agent,
            page_limit,
            search_debounce_ms,
            notification_ttl_secs,
            credential_file,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ClientResult<()> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Internal(format!("Invalid base URL: {}", e)))?;

        if self.page_limit == 0 {
            return Err(ClientError::Internal(
                "Page limit must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ClientError::Internal(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Search debounce quiet interval as a [`Duration`]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Notification auto-expiry interval as a [`Duration`]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }
}
