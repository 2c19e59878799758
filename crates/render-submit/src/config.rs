//! Submitter configuration.

use std::time::Duration;

use render_batch::BatchConfig;
use render_models::RenderJobId;

use crate::error::{SubmitError, SubmitResult};

/// Path appended to the pipeline manager URL to signal the end of rendering.
pub const RENDER_SIGNAL_PATH: &str = "/actions/signal/rendering_process_post_blender";

/// Container and machine shape of a render task.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProfile {
    /// Container image with Blender on the PATH
    pub image_uri: String,
    /// Compute Engine machine type
    pub machine_type: String,
    /// CPU per task, in thousandths of a core
    pub cpu_milli: i64,
    /// Memory per task
    pub memory_mib: i64,
    /// Wall-clock cap enforced by the batch service
    pub max_run_duration: Duration,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            image_uri: "docker.io/linuxserver/blender:3.5.0".to_string(),
            machine_type: "n2-standard-96".to_string(),
            cpu_milli: 96_000,
            memory_mib: 384 * 1024,
            max_run_duration: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl RenderProfile {
    /// Create profile from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            image_uri: std::env::var("RENDER_IMAGE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.image_uri),
            machine_type: std::env::var("RENDER_MACHINE_TYPE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.machine_type),
            cpu_milli: std::env::var("RENDER_CPU_MILLI")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cpu_milli),
            memory_mib: std::env::var("RENDER_MEMORY_MIB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.memory_mib),
            max_run_duration: Duration::from_secs(
                std::env::var("RENDER_MAX_RUN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_run_duration.as_secs()),
            ),
        }
    }
}

/// Everything a [`crate::JobSubmitter`] needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Project, region and endpoint of the batch service
    pub batch: BatchConfig,
    /// Bucket rendered frames are written to
    pub output_bucket: String,
    /// Pipeline manager base URL, used to derive the default webhook
    pub webhook_base_url: Option<String>,
    /// Container and machine shape
    pub profile: RenderProfile,
}

impl SubmitterConfig {
    pub fn new(batch: BatchConfig, output_bucket: impl Into<String>) -> Self {
        Self {
            batch,
            output_bucket: output_bucket.into(),
            webhook_base_url: None,
            profile: RenderProfile::default(),
        }
    }

    pub fn with_webhook_base_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_base_url = Some(url.into());
        self
    }

    pub fn with_profile(mut self, profile: RenderProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> SubmitResult<Self> {
        let batch = BatchConfig::from_env().map_err(|e| SubmitError::config_error(e.to_string()))?;

        let output_bucket = std::env::var("RENDER_OUTPUT_BUCKET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SubmitError::config_error("RENDER_OUTPUT_BUCKET must be set"))?;

        Ok(Self {
            batch,
            output_bucket,
            webhook_base_url: std::env::var("PIPELINE_MANAGER_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            profile: RenderProfile::from_env(),
        })
    }

    /// Webhook signalled when rendering finishes, if a pipeline manager is configured.
    pub fn webhook_signal_url(&self) -> Option<String> {
        self.webhook_base_url
            .as_deref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), RENDER_SIGNAL_PATH))
    }

    /// Where the frames of a render end up: `gs://<output bucket>/renders/<id>/`.
    pub fn output_uri(&self, render_job_id: &RenderJobId) -> String {
        format!(
            "gs://{}/{}/",
            self.output_bucket,
            render_job_id.storage_prefix()
        )
    }
}
