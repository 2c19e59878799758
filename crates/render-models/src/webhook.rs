//! Webhook callback URLs.

use std::fmt;

use schemars::JsonSchema;
use serde::Serialize;
use url::Url;

use crate::error::{RenderInputError, RenderInputResult};

/// Characters that would break out of a double-quoted shell word.
const SHELL_UNSAFE: &[char] = &['"', '`', '$', '\\', '\n', '\r'];

/// Absolute http(s) URL notified when a render stage completes.
///
/// Kept verbatim as supplied; it is embedded inside a double-quoted argument
/// of the remote execution script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct WebhookUrl(String);

impl WebhookUrl {
    pub fn parse(raw: &str) -> RenderInputResult<Self> {
        let parsed =
            Url::parse(raw).map_err(|e| RenderInputError::invalid_webhook(raw, e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RenderInputError::invalid_webhook(
                raw,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        // Url::parse trims and re-encodes whitespace, but the raw text is what
        // ends up in the script.
        if raw.chars().any(char::is_whitespace) {
            return Err(RenderInputError::invalid_webhook(raw, "contains whitespace"));
        }

        if raw.contains(SHELL_UNSAFE) {
            return Err(RenderInputError::invalid_webhook(
                raw,
                "contains characters that cannot be quoted in a shell script",
            ));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
