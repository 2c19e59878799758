//! Render requests, render job identifiers and submission results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RenderInputError, RenderInputResult};

/// Longest render id that still fits the batch job id limit of 63 characters
/// once wrapped as `render-<id>-<6 hex>`.
pub const MAX_RENDER_JOB_ID_LEN: usize = 49;

/// Caller-supplied identifier of a render job.
///
/// Lowercase letters, digits and `-` only, so the id can be embedded in a
/// batch resource name, a storage path segment, a shell script and a JSON
/// string without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct RenderJobId(String);

impl RenderJobId {
    /// Validate and wrap a render job id.
    pub fn parse(id: impl Into<String>) -> RenderInputResult<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(RenderInputError::EmptyRenderJobId);
        }

        if id.len() > MAX_RENDER_JOB_ID_LEN {
            return Err(RenderInputError::RenderJobIdTooLong {
                len: id.len(),
                id,
                max: MAX_RENDER_JOB_ID_LEN,
            });
        }

        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let valid_start = id.starts_with(|c: char| c.is_ascii_alphanumeric());
        if !valid_chars || !valid_start {
            return Err(RenderInputError::InvalidRenderJobId(id));
        }

        Ok(Self(id))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage prefix for this render: `renders/<id>`.
    pub fn storage_prefix(&self) -> String {
        format!("renders/{}", self.0)
    }

    /// Object path of the uploaded scene: `renders/<id>/<id>.blend`.
    pub fn scene_object_path(&self) -> String {
        format!("renders/{}/{}.blend", self.0, self.0)
    }
}

impl fmt::Display for RenderJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RenderJobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request to render one frame of an uploaded scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Unique render id chosen by the caller.
    pub render_job_id: String,

    /// Storage locator of the uploaded scene (`gs://bucket/renders/<id>/<id>.blend`).
    pub scene_uri: String,

    /// Endpoint notified when the render stage completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl RenderRequest {
    pub fn new(
        render_job_id: impl Into<String>,
        scene_uri: impl Into<String>,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            render_job_id: render_job_id.into(),
            scene_uri: scene_uri.into(),
            webhook_url,
        }
    }
}

/// A batch job accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubmittedJob {
    /// Fully-qualified resource name: `projects/<p>/locations/<r>/jobs/<job_id>`.
    pub name: String,

    /// Generated batch job id.
    pub job_id: String,

    /// Render id the job was created for.
    pub render_job_id: String,

    /// Where the rendered frames will be written.
    pub output_uri: String,
}
