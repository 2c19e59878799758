//! Render job submitter.
//!
//! This crate provides:
//! - Submitter configuration injected at construction
//! - The execution script run inside the batch VM
//! - Batch job description for a single-frame render
//! - Job submission returning the provider's job name

pub mod config;
pub mod error;
pub mod job_spec;
pub mod logging;
pub mod script;
pub mod submitter;

pub use config::{RenderProfile, SubmitterConfig};
pub use error::{SubmitError, SubmitResult};
pub use job_spec::{build_job, generate_job_id, JOB_ID_PREFIX, RENDER_JOB_LABEL};
pub use logging::JobLogger;
pub use script::RenderScript;
pub use submitter::JobSubmitter;
