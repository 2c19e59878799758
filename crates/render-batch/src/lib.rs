//! Google Cloud Batch REST API client.
//!
//! This crate provides:
//! - Typed `v1` job resources (task groups, runnables, volumes, policies)
//! - Job creation under a project/region parent
//! - Service account authentication via gcp_auth with token caching
//! - HTTP status to error mapping, tracing spans and request metrics

pub mod client;
pub mod error;
pub mod metrics;
pub mod token_cache;
pub mod types;

pub use client::{BatchApi, BatchClient, BatchConfig};
pub use error::{BatchError, BatchResult};
pub use token_cache::{AccessTokenSource, StaticToken, TokenCache};
pub use types::{
    AllocationPolicy, ComputeResource, Container, GcsVolume, InstancePolicy,
    InstancePolicyOrTemplate, Job, LogsDestination, LogsPolicy, Runnable, TaskGroup, TaskSpec,
    Volume,
};
