//! Webhook payload model.
//!
//! [`Payload`] is the wire-level body of the Default format and the `data`
//! member of the CloudEvents envelope. Field presence is a compatibility
//! contract: in particular `scan_overview` is always serialized, even as
//! `null`, because downstream consumers parse it unconditionally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use moorage_core::events::RetentionRule;
use moorage_entity::policy::target::Target;

/// A rendered webhook event handed to a formatter.
#[derive(Debug, Clone)]
pub struct HookEvent {
    /// The matched policy.
    pub policy_id: i64,
    /// The project the event belongs to.
    pub project_id: i64,
    /// The event topic.
    pub event_type: String,
    /// The delivery target.
    pub target: Target,
    /// The payload to render.
    pub payload: Payload,
    /// Correlation id of the originating request.
    pub request_id: Option<String>,
}

/// The webhook payload body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    /// The event topic.
    #[serde(rename = "type")]
    pub kind: String,
    /// When the event occurred, unix seconds.
    pub occur_at: i64,
    /// The operator that caused the event.
    pub operator: String,
    /// Topic-specific event data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<EventPayloadData>,
}

/// Topic-specific payload data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayloadData {
    /// The resources involved (artifacts, tags, charts).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub resources: Vec<Resource>,
    /// The repository the resources belong to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    /// Replication details, replication events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication: Option<ReplicationInfo>,
    /// Retention details, tag retention events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<RetentionInfo>,
    /// Free-form attributes (quota messages, chart versions, labels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<HashMap<String, String>>,
}

/// One resource within an event.
///
/// `scan_overview` has no `skip_serializing_if`: it must appear in the
/// JSON even when `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// The artifact digest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// The tag, or the digest when the operation was by digest only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Externally visible address of the resource.
    pub resource_url: String,
    /// Scan report summary, present for scan events when the report was
    /// ready in time.
    pub scan_overview: Option<serde_json::Value>,
}

/// Repository identity in a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Unix seconds the repository's project was created, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<i64>,
    /// The image name without the namespace.
    pub name: String,
    /// The project namespace.
    pub namespace: String,
    /// `"{namespace}/{name}"`.
    pub repo_full_name: String,
    /// `"public"` or `"private"`, from project metadata.
    pub repo_type: String,
}

impl Repository {
    /// Split a full repository name into `(namespace, image)`. A name with
    /// no slash gets an empty namespace.
    pub fn split_name(full_name: &str) -> (String, String) {
        match full_name.split_once('/') {
            Some((namespace, image)) => (namespace.to_string(), image.to_string()),
            None => (String::new(), full_name.to_string()),
        }
    }
}

/// One side of a replication (remote registry or local).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationResource {
    /// The registry name, absent for the local side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_name: Option<String>,
    /// The registry type (e.g. `"harbor"`, `"docker-hub"`).
    pub registry_type: String,
    /// The registry endpoint URL.
    pub endpoint: String,
    /// The namespace on that registry.
    pub namespace: String,
}

/// One replicated artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationArtifact {
    /// The artifact type (e.g. `"artifact"`, `"chart"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// The task status.
    pub status: String,
    /// `"{repository}:{reference}"`.
    pub name_and_tag: String,
    /// Failure reason, failed artifacts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

/// Replication details in a payload. Exactly one of `successful_artifact`
/// and `failed_artifact` is populated, depending on the task status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationInfo {
    /// The final task status.
    pub job_status: String,
    /// The replication policy description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Who created the replication policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_creator: Option<String>,
    /// How the execution was triggered.
    pub trigger_type: String,
    /// Unix seconds the execution started.
    pub execution_timestamp: i64,
    /// The source side. The remote registry for pull-based replication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_resource: Option<ReplicationResource>,
    /// The destination side. The remote registry for push-based
    /// replication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_resource: Option<ReplicationResource>,
    /// Artifacts that replicated successfully.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_artifact: Option<Vec<ReplicationArtifact>>,
    /// Artifacts that failed to replicate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_artifact: Option<Vec<ReplicationArtifact>>,
}

/// One artifact deleted by a retention run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionArtifact {
    /// The artifact type.
    #[serde(rename = "type")]
    pub kind: String,
    /// The run status.
    pub status: String,
    /// `"{repository}:{reference}"` entries, comma-separated.
    pub name_and_tag: String,
}

/// Tag retention details in a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionInfo {
    /// Total number of candidate artifacts considered.
    pub total: u64,
    /// Number of artifacts retained.
    pub retained: u64,
    /// The final run status.
    pub status: String,
    /// Summary of deleted artifacts, a single entry.
    pub successful_artifact: Vec<RetentionArtifact>,
    /// The rules the run evaluated.
    pub retention_rules: Vec<RetentionRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_repository_name() {
        assert_eq!(
            Repository::split_name("library/hello-world"),
            ("library".to_string(), "hello-world".to_string())
        );
        assert_eq!(
            Repository::split_name("busybox"),
            (String::new(), "busybox".to_string())
        );
    }

    #[test]
    fn scan_overview_is_always_serialized() {
        let resource = Resource {
            digest: Some("sha256:abc".into()),
            tag: Some("v1.0".into()),
            resource_url: "registry.example.com/library/hello-world:v1.0".into(),
            scan_overview: None,
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert!(json.get("scan_overview").is_some());
        assert!(json["scan_overview"].is_null());
    }
}
