//! Notification policy entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use validator::Validate;

use super::target::Target;

/// A per-project notification policy: which event topics fan out to which
/// targets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationPolicy {
    /// Unique policy identifier.
    pub id: i64,
    /// Policy name, unique within a project.
    pub name: String,
    /// The project the policy belongs to.
    pub project_id: i64,
    /// Optional description.
    pub description: Option<String>,
    /// Delivery targets (JSON column).
    pub targets: Json<Vec<Target>>,
    /// Subscribed topic names (JSON column).
    pub event_types: Json<Vec<String>>,
    /// Whether the policy is active.
    pub enabled: bool,
    /// Who created the policy.
    pub creator: Option<String>,
    /// When the policy was created.
    pub creation_time: DateTime<Utc>,
    /// When the policy was last updated.
    pub update_time: DateTime<Utc>,
}

impl NotificationPolicy {
    /// A policy applies to an event iff it is enabled and subscribes to
    /// the event's topic. Project scoping is handled by the query.
    pub fn subscribes_to(&self, topic: &str) -> bool {
        self.enabled && self.event_types.iter().any(|t| t == topic)
    }
}

/// Data required to create or update a notification policy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePolicy {
    /// Policy name.
    #[validate(length(min = 1, max = 256, message = "Policy name is required"))]
    pub name: String,
    /// The owning project.
    pub project_id: i64,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Delivery targets.
    #[validate(length(min = 1, message = "At least one target is required"), nested)]
    pub targets: Vec<Target>,
    /// Subscribed topic names.
    #[validate(length(min = 1, message = "At least one event type is required"))]
    pub event_types: Vec<String>,
    /// Whether the policy is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Who created the policy.
    #[serde(default)]
    pub creator: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::target::{PayloadFormat, TargetType};

    fn policy(enabled: bool, event_types: Vec<&str>) -> NotificationPolicy {
        NotificationPolicy {
            id: 1,
            name: "p".into(),
            project_id: 1,
            description: None,
            targets: Json(vec![Target {
                target_type: TargetType::Http,
                address: "http://sink/hook".into(),
                auth_header: None,
                skip_cert_verify: false,
                payload_format: PayloadFormat::Default,
            }]),
            event_types: Json(event_types.into_iter().map(String::from).collect()),
            enabled,
            creator: None,
            creation_time: Utc::now(),
            update_time: Utc::now(),
        }
    }

    #[test]
    fn subscription_is_set_membership() {
        let p = policy(true, vec!["PUSH_ARTIFACT", "DELETE_ARTIFACT"]);
        assert!(p.subscribes_to("PUSH_ARTIFACT"));
        assert!(!p.subscribes_to("PULL_ARTIFACT"));
    }

    #[test]
    fn disabled_policy_never_subscribes() {
        let p = policy(false, vec!["PUSH_ARTIFACT"]);
        assert!(!p.subscribes_to("PUSH_ARTIFACT"));
    }
}
