//! Project and repository domain events.

use serde::{Deserialize, Serialize};

/// A project was created or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvent {
    /// The project id.
    pub project_id: i64,
    /// The project name.
    pub name: String,
}

/// A repository was deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryEvent {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name, `"{namespace}/{image}"`.
    pub name: String,
}
