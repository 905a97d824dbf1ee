//! Robot account and role binding domain events.

use serde::{Deserialize, Serialize};

/// A robot account was created or deleted.
///
/// The resolver prefixes `name` with the configured robot prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotEvent {
    /// The owning project.
    pub project_id: i64,
    /// The prefixed robot account name.
    pub name: String,
}

/// A role binding was created or deleted.
///
/// The resolver prefixes `role` with the configured role prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEvent {
    /// The owning project.
    pub project_id: i64,
    /// The prefixed role name.
    pub role: String,
    /// The user or group the role was granted to.
    pub grantee: String,
}
