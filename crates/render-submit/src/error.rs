//! Submitter error types.

use render_batch::BatchError;
use render_models::RenderInputError;
use thiserror::Error;

pub type SubmitResult<T> = Result<T, SubmitError>;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request cannot be turned into a job; fix the input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The batch service rejected or failed the create call.
    #[error("Batch job submission failed: {0}")]
    Submission(#[from] BatchError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SubmitError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SubmitError::InvalidInput(_))
    }

    /// Underlying batch error, when the remote call failed.
    pub fn batch_error(&self) -> Option<&BatchError> {
        match self {
            SubmitError::Submission(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.batch_error().is_some_and(BatchError::is_quota_exceeded)
    }
}

impl From<RenderInputError> for SubmitError {
    fn from(err: RenderInputError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
