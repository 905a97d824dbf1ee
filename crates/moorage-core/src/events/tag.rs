//! Tag domain events.

use serde::{Deserialize, Serialize};

/// A tag was created or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEvent {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name, `"{namespace}/{image}"`.
    pub repository: String,
    /// The tag name.
    pub tag: String,
    /// Digest of the artifact the tag points at.
    pub digest: String,
}
