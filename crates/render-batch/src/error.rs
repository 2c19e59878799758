//! Batch API error types.

use serde::Deserialize;
use thiserror::Error;

/// Result type for Batch API operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while talking to the Batch API.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl BatchError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status and response body to an error.
    ///
    /// The `status` string of a Google error envelope takes precedence over
    /// the HTTP code, so `RESOURCE_EXHAUSTED` is reported as a quota error
    /// whatever code it arrives with.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) if !envelope.error.message.is_empty() => {
                (envelope.error.status, envelope.error.message)
            }
            Ok(envelope) => (envelope.error.status, body),
            Err(_) => (String::new(), body),
        };

        match (status, api_status.as_str()) {
            (_, "RESOURCE_EXHAUSTED") | (429, _) => Self::QuotaExceeded(message),
            (_, "UNAUTHENTICATED") | (401, _) => Self::AuthError(message),
            (_, "PERMISSION_DENIED") | (403, _) => Self::PermissionDenied(message),
            (_, "ALREADY_EXISTS") | (409, _) => Self::AlreadyExists(message),
            (404, _) => Self::NotFound(message),
            (400, _) => Self::InvalidArgument(message),
            (500..=599, _) => Self::ServerError(status, message),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, message)),
        }
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            BatchError::AuthError(_) => Some(401),
            BatchError::InvalidArgument(_) => Some(400),
            BatchError::PermissionDenied(_) => Some(403),
            BatchError::NotFound(_) => Some(404),
            BatchError::AlreadyExists(_) => Some(409),
            BatchError::QuotaExceeded(_) => Some(429),
            BatchError::ServerError(status, _) => Some(*status),
            BatchError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True if the provider rejected the job for lack of quota.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BatchError::QuotaExceeded(_))
    }

    /// Check if a caller may reasonably resubmit after this error.
    ///
    /// Nothing in this crate retries; this only classifies the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BatchError::Network(_) | BatchError::QuotaExceeded(_) | BatchError::ServerError(_, _)
        )
    }
}
