//! Artifact-related domain events.

use serde::{Deserialize, Serialize};

/// An artifact push, pull, or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEvent {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name, `"{namespace}/{image}"`.
    pub repository: String,
    /// The artifact digest (`sha256:…`).
    pub digest: String,
    /// Tags involved in the operation. Empty when the artifact was
    /// addressed by digest only.
    pub tags: Vec<String>,
}

impl ArtifactEvent {
    /// The tag to display for this artifact: the first tag, or the digest
    /// when the operation was by digest only.
    pub fn reference(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(&self.digest)
    }
}

/// A label was attached to an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactLabelEvent {
    /// The labeled artifact.
    pub artifact: ArtifactEvent,
    /// The label name.
    pub label: String,
}
