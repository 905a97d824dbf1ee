//! Audit log entity model.
//!
//! One row per audited operation in the `audit_log_ext` table. The
//! `payload` field is never persisted; it only travels with the record to
//! the syslog forwarder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum persisted username length. Longer names are truncated to 252
/// characters plus `"..."`.
pub const MAX_USERNAME_LEN: usize = 255;

/// An immutable audit record of a registry operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    /// Unique record identifier.
    pub id: i64,
    /// The project the operation belongs to (0 when not project-scoped).
    pub project_id: i64,
    /// The operation: `create`, `pull`, `delete`, `update`, `login`, `logout`.
    pub operation: String,
    /// The resource type: `project`, `repository`, `artifact`, `tag`,
    /// `user`, `configuration`, ...
    pub resource_type: String,
    /// The resource identity (e.g. `"library/hello-world:v1.0"`).
    pub resource: String,
    /// The operator, at most [`MAX_USERNAME_LEN`] characters.
    pub username: String,
    /// Human-readable description of the operation.
    pub op_desc: Option<String>,
    /// Whether the operation succeeded.
    pub op_result: bool,
    /// When the operation occurred.
    pub op_time: DateTime<Utc>,
}

/// Data required to create a new audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditRecord {
    /// The project the operation belongs to.
    pub project_id: i64,
    /// The operation performed.
    pub operation: String,
    /// The resource type.
    pub resource_type: String,
    /// The resource identity.
    pub resource: String,
    /// The operator name (truncated on construction).
    pub username: String,
    /// Human-readable description.
    pub op_desc: Option<String>,
    /// Whether the operation succeeded.
    pub op_result: bool,
    /// When the operation occurred.
    pub op_time: DateTime<Utc>,
    /// Redacted request payload; forwarded to syslog, never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl CreateAuditRecord {
    /// The lowercase `operation_resourcetype` event type string used by the
    /// per-type audit gates and the purge allow-list.
    pub fn event_type(&self) -> String {
        format!("{}_{}", self.operation, self.resource_type).to_lowercase()
    }
}

/// Truncate a username so it fits the persisted column: names longer than
/// [`MAX_USERNAME_LEN`] are cut to 252 characters and suffixed with `"..."`.
pub fn truncate_username(name: &str) -> String {
    if name.chars().count() <= MAX_USERNAME_LEN {
        return name.to_string();
    }
    let prefix: String = name.chars().take(MAX_USERNAME_LEN - 3).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_usernames_pass_through() {
        assert_eq!(truncate_username("admin"), "admin");
        let exact = "a".repeat(255);
        assert_eq!(truncate_username(&exact), exact);
    }

    #[test]
    fn long_usernames_are_truncated_with_ellipsis() {
        let long = "b".repeat(300);
        let got = truncate_username(&long);
        assert_eq!(got.len(), 255);
        assert!(got.ends_with("..."));
        assert_eq!(&got[..252], &long[..252]);
    }

    #[test]
    fn event_type_is_lowercase_operation_resource() {
        let rec = CreateAuditRecord {
            project_id: 1,
            operation: "Create".into(),
            resource_type: "User".into(),
            resource: "alice".into(),
            username: "admin".into(),
            op_desc: None,
            op_result: true,
            op_time: Utc::now(),
            payload: None,
        };
        assert_eq!(rec.event_type(), "create_user");
    }
}
