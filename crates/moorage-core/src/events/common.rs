//! Generic audited HTTP operation events.

use serde::{Deserialize, Serialize};

/// A generic audited HTTP operation, produced by the common-event resolver
/// framework from raw request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonEvent {
    /// The operator that performed the operation.
    pub operator: String,
    /// The project the operation belongs to, if any.
    pub project_id: Option<i64>,
    /// The resource type (e.g. `"user"`, `"configuration"`).
    pub resource_type: String,
    /// The resource display name (or numeric id when unresolvable).
    pub resource_name: String,
    /// The operation: `"create"`, `"update"`, `"delete"`, `"login"`, `"logout"`.
    pub operation: String,
    /// Human-readable description of the operation.
    pub operation_description: String,
    /// Whether the response code indicated success.
    pub is_successful: bool,
    /// Redacted request payload, empty when not JSON.
    pub payload: String,
}
