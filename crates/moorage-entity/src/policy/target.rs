//! Notification delivery targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// The kind of endpoint a target delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// A plain HTTP webhook endpoint.
    Http,
    /// A Slack incoming webhook.
    Slack,
    /// A Microsoft Teams incoming webhook.
    Teams,
}

impl TargetType {
    /// The job name submitted to the job service for this target kind.
    pub fn job_name(&self) -> &'static str {
        match self {
            Self::Http => "WEBHOOK",
            Self::Slack => "SLACK",
            Self::Teams => "TEAMS",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Slack => write!(f, "slack"),
            Self::Teams => write!(f, "teams"),
        }
    }
}

/// The wire protocol a target's payload is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PayloadFormat {
    /// The native envelope (also registered under the empty string).
    #[default]
    Default,
    /// CloudEvents JSON 1.0.
    CloudEvents,
    /// CDEvents wrapped in a CloudEvents envelope.
    CDEvents,
}

impl PayloadFormat {
    /// The registry key for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::CloudEvents => "CloudEvents",
            Self::CDEvents => "CDEvents",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single webhook endpoint: URL, auth, TLS policy, payload format.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Target {
    /// The endpoint kind.
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// The endpoint URL.
    #[validate(url(message = "target address must be a valid URL"))]
    pub address: String,
    /// Value for the `Authorization` header, if any.
    #[serde(default)]
    pub auth_header: Option<String>,
    /// Skip TLS certificate verification when delivering.
    #[serde(default)]
    pub skip_cert_verify: bool,
    /// Payload rendering format.
    #[serde(default)]
    pub payload_format: PayloadFormat,
}
