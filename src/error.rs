/// Unified error types for the Reelvault client engine
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport errors (no usable response from the server)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Authentication errors (401 / invalid credential)
    #[error("{0}")]
    Unauthorized(String),

    /// Validation errors with structured per-field messages
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Not found errors (404)
    #[error("{0}")]
    NotFound(String),

    /// Any other server-reported failure
    #[error("{0}")]
    Api(String),

    /// IO errors (credential storage)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors (wiring, serialization)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Per-field validation message as reported by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error response body shape used by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ClientError {
    /// Classify an HTTP failure status into an error variant.
    ///
    /// The body is parsed as an [`ErrorResponse`] when possible so the
    /// server's message (and field errors on 400) survive; otherwise the
    /// status line is all we have.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        match status {
            401 => ClientError::Unauthorized(message),
            400 => ClientError::Validation {
                message,
                field_errors: parsed.and_then(|e| e.errors).unwrap_or_default(),
            },
            404 => ClientError::NotFound(message),
            _ => ClientError::Api(message),
        }
    }

    /// Message suitable for passive display, with a fallback when the
    /// error carries nothing user-facing.
    ///
    /// Mirrors the server-message-first chain: a server-reported message
    /// wins, a transport failure shows its own description, and the
    /// fallback covers anything empty.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            ClientError::Unauthorized(m)
            | ClientError::NotFound(m)
            | ClientError::Api(m)
            | ClientError::Transport(m) => m.clone(),
            ClientError::Validation { message, .. } => message.clone(),
            ClientError::Io(e) => e.to_string(),
            ClientError::Internal(m) => m.clone(),
        };

        if message.is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    /// Field-level errors, when the server reported any
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }

    /// True for 401-class failures
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
