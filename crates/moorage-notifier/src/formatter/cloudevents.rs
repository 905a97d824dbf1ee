//! CloudEvents 1.0 JSON format.

use chrono::{DateTime, SecondsFormat};
use serde_json::json;
use uuid::Uuid;

use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::result::AppResult;

use crate::model::HookEvent;

use super::{Formatter, HookHeaders, content_type};

/// CloudEvents `type` attribute per topic. The strings are a wire
/// contract with downstream consumers.
pub(crate) fn event_type_for(topic_name: &str) -> Option<&'static str> {
    match topic_name {
        topic::PUSH_ARTIFACT => Some("harbor.artifact.pushed"),
        topic::PULL_ARTIFACT => Some("harbor.artifact.pulled"),
        topic::DELETE_ARTIFACT => Some("harbor.artifact.deleted"),
        topic::QUOTA_EXCEED => Some("harbor.quota.exceeded"),
        topic::QUOTA_WARNING => Some("harbor.quota.warned"),
        topic::REPLICATION => Some("harbor.replication.status.changed"),
        topic::SCANNING_COMPLETED => Some("harbor.scan.completed"),
        topic::SCANNING_FAILED => Some("harbor.scan.failed"),
        topic::SCANNING_STOPPED => Some("harbor.scan.stopped"),
        topic::TAG_RETENTION => Some("harbor.tag_retention.finished"),
        _ => None,
    }
}

/// CloudEvents `source` attribute for a policy.
pub(crate) fn source_for(project_id: i64, policy_id: i64) -> String {
    format!("/projects/{project_id}/webhook/policies/{policy_id}")
}

/// RFC 3339 rendering of the payload timestamp.
pub(crate) fn rfc3339_time(occur_at: i64) -> AppResult<String> {
    DateTime::from_timestamp(occur_at, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| AppError::validation(format!("invalid event timestamp {occur_at}")))
}

/// Renders a CloudEvents 1.0 envelope with `requestid` and `operator`
/// extensions.
pub struct CloudEventsFormatter;

impl Formatter for CloudEventsFormatter {
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)> {
        let event_type = event_type_for(&event.event_type).ok_or_else(|| {
            AppError::validation(format!(
                "topic '{}' has no CloudEvents mapping",
                event.event_type
            ))
        })?;

        let mut envelope = json!({
            "specversion": "1.0",
            "id": Uuid::new_v4().to_string(),
            "source": source_for(event.project_id, event.policy_id),
            "type": event_type,
            "datacontenttype": "application/json",
            "time": rfc3339_time(event.payload.occur_at)?,
            "operator": event.payload.operator,
            "data": event.payload,
        });
        if let Some(request_id) = &event.request_id {
            envelope["requestid"] = json!(request_id);
        }

        let body = serde_json::to_vec(&envelope)?;
        Ok((content_type("application/cloudevents+json"), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::test_support::push_hook_event;

    #[test]
    fn pull_event_renders_the_mapped_type() {
        let mut event = push_hook_event();
        event.event_type = topic::PULL_ARTIFACT.to_string();

        let (headers, body) = CloudEventsFormatter.format(&event).unwrap();
        assert_eq!(
            headers.get("Content-Type"),
            Some(&vec!["application/cloudevents+json".to_string()])
        );

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["specversion"], "1.0");
        assert_eq!(json["source"], "/projects/1/webhook/policies/3");
        assert_eq!(json["type"], "harbor.artifact.pulled");
        assert_eq!(json["time"], "2023-03-06T06:08:43Z");
        assert_eq!(json["operator"], "admin");
        assert_eq!(json["requestid"], "req-1");
        assert!(json["id"].as_str().is_some());
    }

    #[test]
    fn unmapped_topic_is_rejected() {
        let mut event = push_hook_event();
        event.event_type = topic::CREATE_PROJECT.to_string();
        assert!(CloudEventsFormatter.format(&event).is_err());
    }

    #[test]
    fn every_mapped_topic_round_trips() {
        let cases = [
            (topic::PUSH_ARTIFACT, "harbor.artifact.pushed"),
            (topic::PULL_ARTIFACT, "harbor.artifact.pulled"),
            (topic::DELETE_ARTIFACT, "harbor.artifact.deleted"),
            (topic::QUOTA_EXCEED, "harbor.quota.exceeded"),
            (topic::QUOTA_WARNING, "harbor.quota.warned"),
            (topic::REPLICATION, "harbor.replication.status.changed"),
            (topic::SCANNING_COMPLETED, "harbor.scan.completed"),
            (topic::SCANNING_FAILED, "harbor.scan.failed"),
            (topic::SCANNING_STOPPED, "harbor.scan.stopped"),
            (topic::TAG_RETENTION, "harbor.tag_retention.finished"),
        ];
        for (topic_name, expected) in cases {
            let mut event = push_hook_event();
            event.event_type = topic_name.to_string();
            let (_, body) = CloudEventsFormatter.format(&event).unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["type"], expected, "topic {topic_name}");
        }
    }
}
