//! Shared data models for the render batch submitter.
//!
//! This crate provides Serde-serializable types for:
//! - Render job identifiers safe to embed in resource names and scripts
//! - Scene locators (`scheme://bucket/path`)
//! - Webhook callback URLs
//! - Render requests and submitted job results

pub mod error;
pub mod render;
pub mod scene_uri;
pub mod webhook;

// Re-export common types
pub use error::{RenderInputError, RenderInputResult};
pub use render::{RenderJobId, RenderRequest, SubmittedJob, MAX_RENDER_JOB_ID_LEN};
pub use scene_uri::SceneUri;
pub use webhook::WebhookUrl;
