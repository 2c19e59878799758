//! Batch API `v1` resource types.
//!
//! Field names follow the REST JSON mapping (camelCase). `int64` fields are
//! sent as strings and accepted as either strings or numbers. Every field
//! has a default when reading, since the service may omit any of them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A batch job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Full resource name, assigned by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-generated unique id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub task_groups: Vec<TaskGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_policy: Option<AllocationPolicy>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_policy: Option<LogsPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// Job status as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// A group of identical tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub task_spec: TaskSpec,
    #[serde(default, with = "int64")]
    pub task_count: i64,
}

/// What each task runs and with which resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub runnables: Vec<Runnable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_resource: Option<ComputeResource>,
    /// Protobuf duration string, e.g. `"3600s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_run_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// A single step of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runnable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
}

impl Runnable {
    pub fn container(container: Container) -> Self {
        Self {
            container: Some(container),
        }
    }
}

/// Container runnable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default)]
    pub image_uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entrypoint: String,
}

/// Storage mounted into the task VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs: Option<GcsVolume>,
    #[serde(default)]
    pub mount_path: String,
}

impl Volume {
    /// Mount a whole Cloud Storage bucket (or bucket prefix) at `mount_path`.
    pub fn gcs(remote_path: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            gcs: Some(GcsVolume {
                remote_path: remote_path.into(),
            }),
            mount_path: mount_path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsVolume {
    #[serde(default)]
    pub remote_path: String,
}

/// Per-task compute requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResource {
    #[serde(default, with = "int64")]
    pub cpu_milli: i64,
    #[serde(default, with = "int64")]
    pub memory_mib: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPolicy {
    #[serde(default)]
    pub instances: Vec<InstancePolicyOrTemplate>,
}

impl AllocationPolicy {
    /// Single instance policy with the given machine type.
    pub fn machine_type(machine_type: impl Into<String>) -> Self {
        Self {
            instances: vec![InstancePolicyOrTemplate {
                policy: Some(InstancePolicy {
                    machine_type: machine_type.into(),
                }),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePolicyOrTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<InstancePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePolicy {
    #[serde(default)]
    pub machine_type: String,
}

/// Where task logs are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsPolicy {
    #[serde(default)]
    pub destination: LogsDestination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_path: Option<String>,
}

impl LogsPolicy {
    pub fn cloud_logging(logs_path: impl Into<String>) -> Self {
        Self {
            destination: LogsDestination::CloudLogging,
            logs_path: Some(logs_path.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogsDestination {
    #[default]
    DestinationUnspecified,
    CloudLogging,
    Path,
}

/// Format a duration the way protobuf JSON expects it (`"90s"`, `"1.5s"`).
pub fn duration_string(duration: Duration) -> String {
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        format!("{}s", duration.as_secs())
    } else {
        let frac = format!("{:09}", nanos);
        format!("{}.{}s", duration.as_secs(), frac.trim_end_matches('0'))
    }
}

/// Serde adapter for protobuf `int64` fields.
mod int64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int64_fields_serialize_as_strings() {
        let resource = ComputeResource {
            cpu_milli: 96_000,
            memory_mib: 384 * 1024,
        };
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value, json!({"cpuMilli": "96000", "memoryMib": "393216"}));
    }

    #[test]
    fn test_int64_fields_accept_numbers_and_strings() {
        let a: ComputeResource =
            serde_json::from_value(json!({"cpuMilli": 2000, "memoryMib": "512"})).unwrap();
        assert_eq!(a.cpu_milli, 2000);
        assert_eq!(a.memory_mib, 512);
    }

    #[test]
    fn test_logs_policy_destination_name() {
        let value = serde_json::to_value(LogsPolicy::cloud_logging("batch_task_logs")).unwrap();
        assert_eq!(
            value,
            json!({"destination": "CLOUD_LOGGING", "logsPath": "batch_task_logs"})
        );
    }

    #[test]
    fn test_created_job_response_parses() {
        let body = json!({
            "name": "projects/p/locations/us-central1/jobs/render-abc123-1a2b3c",
            "uid": "render-abc123-1a2b3c-0f1e2d3c",
            "taskGroups": [{
                "name": "projects/p/locations/us-central1/jobs/render-abc123-1a2b3c/taskGroups/group0",
                "taskSpec": {
                    "runnables": [{"container": {"imageUri": "img", "commands": ["-c", "true"], "entrypoint": "/bin/bash"}}],
                    "computeResource": {"cpuMilli": "96000", "memoryMib": "393216"},
                    "maxRunDuration": "3600s"
                },
                "taskCount": "1"
            }],
            "labels": {"render_job": "abc123"},
            "status": {"state": "QUEUED"},
            "createTime": "2026-10-15T10:00:00Z"
        });

        let job: Job = serde_json::from_value(body).unwrap();
        assert_eq!(job.task_groups[0].task_count, 1);
        assert_eq!(job.labels["render_job"], "abc123");
        assert_eq!(job.status.unwrap().state.as_deref(), Some("QUEUED"));
    }

    #[test]
    fn test_sparse_job_response_parses() {
        let body = json!({
            "name": "projects/p/locations/us-central1/jobs/render-abc123-1a2b3c",
            "taskGroups": [{
                "taskSpec": {
                    "runnables": [{"container": {"commands": ["-c", "true"]}}],
                    "volumes": [{"gcs": {}}]
                }
            }, {
                "taskCount": "2"
            }],
            "allocationPolicy": {"instances": [{"policy": {}}]},
            "logsPolicy": {}
        });

        let job: Job = serde_json::from_value(body).unwrap();
        assert_eq!(
            job.name.as_deref(),
            Some("projects/p/locations/us-central1/jobs/render-abc123-1a2b3c")
        );
        assert!(job.task_groups[0].task_spec.volumes[0].mount_path.is_empty());
        assert_eq!(job.task_groups[1].task_spec, TaskSpec::default());
        assert_eq!(
            job.logs_policy.unwrap().destination,
            LogsDestination::DestinationUnspecified
        );
    }

    #[test]
    fn test_duration_string() {
        assert_eq!(duration_string(Duration::from_secs(3600)), "3600s");
        assert_eq!(duration_string(Duration::from_millis(1500)), "1.5s");
    }
}
