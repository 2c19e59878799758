//! Scene locators of the form `scheme://bucket/path`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::Serialize;

use crate::error::{RenderInputError, RenderInputResult};

static SCENE_URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z0-9+.\-]*)://([^/]+)/(.+)$").expect("scene URI pattern is valid")
});

/// Parsed storage locator of an uploaded scene file.
///
/// Only the bucket is used when building a job: the batch VM mounts the whole
/// bucket and locates the scene by the `renders/<id>/<id>.blend` convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct SceneUri {
    uri: String,
    scheme: String,
    bucket: String,
    object_path: String,
}

impl SceneUri {
    /// Parse a `scheme://bucket/path` locator.
    pub fn parse(uri: &str) -> RenderInputResult<Self> {
        let caps = SCENE_URI_PATTERN
            .captures(uri)
            .ok_or_else(|| RenderInputError::InvalidSceneUri(uri.to_string()))?;

        Ok(Self {
            uri: uri.to_string(),
            scheme: caps[1].to_string(),
            bucket: caps[2].to_string(),
            object_path: caps[3].to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }
}

impl fmt::Display for SceneUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
