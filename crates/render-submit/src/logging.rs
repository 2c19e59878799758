//! Structured submission logging.

use tracing::{error, info, Span};

/// Logger carrying the render id and operation on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    render_job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for one render job and operation (e.g. "batch_submit").
    pub fn new(render_job_id: &str, operation: &str) -> Self {
        Self {
            render_job_id: render_job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log intent to create a batch job.
    pub fn log_start(&self, job_id: &str, message: &str) {
        info!(
            render_job_id = %self.render_job_id,
            operation = %self.operation,
            job_id = %job_id,
            "Job started: {}", message
        );
    }

    /// Log a job accepted by the provider.
    pub fn log_completion(&self, job_name: &str, message: &str) {
        info!(
            render_job_id = %self.render_job_id,
            operation = %self.operation,
            job_name = %job_name,
            "Job completed: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            render_job_id = %self.render_job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn render_job_id(&self) -> &str {
        &self.render_job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span grouping every event of one submission.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render_submit",
            render_job_id = %self.render_job_id,
            operation = %self.operation
        )
    }
}
