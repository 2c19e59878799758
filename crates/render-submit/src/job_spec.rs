//! Batch job description for a single-frame render.

use std::collections::BTreeMap;

use render_batch::types::duration_string;
use render_batch::{
    AllocationPolicy, ComputeResource, Container, Job, LogsPolicy, Runnable, TaskGroup, TaskSpec,
    Volume,
};
use render_models::RenderJobId;
use uuid::Uuid;

use crate::config::RenderProfile;
use crate::script::{INPUT_MOUNT_PATH, OUTPUT_MOUNT_PATH};

/// Prefix of every generated batch job id.
pub const JOB_ID_PREFIX: &str = "render-";

/// Label carrying the render id, for finding jobs of a render later.
pub const RENDER_JOB_LABEL: &str = "render_job";

/// Cloud Logging log name for task output.
pub const LOGS_PATH: &str = "batch_task_logs";

/// Length of the random job id suffix, in hex characters.
const SUFFIX_LEN: usize = 6;

const ENTRYPOINT: &str = "/bin/bash";

/// Generate a batch job id: `render-<render_job_id>-<6 hex>`.
///
/// The suffix makes collisions unlikely; it is not an idempotency key.
pub fn generate_job_id(render_job_id: &RenderJobId) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}-{}",
        JOB_ID_PREFIX,
        render_job_id,
        &suffix[..SUFFIX_LEN]
    )
}

/// Build the job: one task group, one task running `script` in the render
/// container, the scene bucket mounted read-side and the output bucket
/// mounted for writing.
pub fn build_job(
    render_job_id: &RenderJobId,
    input_bucket: &str,
    output_bucket: &str,
    script: String,
    profile: &RenderProfile,
) -> Job {
    let runnable = Runnable::container(Container {
        image_uri: profile.image_uri.clone(),
        commands: vec!["-c".to_string(), script],
        entrypoint: ENTRYPOINT.to_string(),
    });

    let task_spec = TaskSpec {
        runnables: vec![runnable],
        compute_resource: Some(ComputeResource {
            cpu_milli: profile.cpu_milli,
            memory_mib: profile.memory_mib,
        }),
        max_run_duration: Some(duration_string(profile.max_run_duration)),
        volumes: vec![
            Volume::gcs(input_bucket, INPUT_MOUNT_PATH),
            Volume::gcs(output_bucket, OUTPUT_MOUNT_PATH),
        ],
    };

    Job {
        task_groups: vec![TaskGroup {
            task_spec,
            task_count: 1,
            ..Default::default()
        }],
        allocation_policy: Some(AllocationPolicy::machine_type(&profile.machine_type)),
        logs_policy: Some(LogsPolicy::cloud_logging(LOGS_PATH)),
        labels: BTreeMap::from([(
            RENDER_JOB_LABEL.to_string(),
            render_job_id.to_string(),
        )]),
        ..Default::default()
    }
}
