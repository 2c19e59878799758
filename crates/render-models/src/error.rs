//! Input validation errors.

use thiserror::Error;

/// Result type for render input parsing.
pub type RenderInputResult<T> = Result<T, RenderInputError>;

/// Errors raised while validating a render request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderInputError {
    #[error("Render job id must not be empty")]
    EmptyRenderJobId,

    #[error("Render job id {id:?} is {len} characters, maximum is {max}")]
    RenderJobIdTooLong { id: String, len: usize, max: usize },

    #[error("Render job id {0:?} may only contain lowercase letters, digits and '-', and must start with a letter or digit")]
    InvalidRenderJobId(String),

    #[error("Scene URI {0:?} does not match scheme://bucket/path")]
    InvalidSceneUri(String),

    #[error("Invalid webhook URL {url:?}: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },
}

impl RenderInputError {
    pub fn invalid_webhook(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidWebhookUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
