//! CDEvents `ArtifactPublished` format.

use serde_json::json;
use uuid::Uuid;

use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::result::AppResult;

use crate::model::HookEvent;

use super::cloudevents::{rfc3339_time, source_for};
use super::{Formatter, HookHeaders, content_type};

const CDEVENTS_TYPE: &str = "dev.cdevents.artifact.published.0.1.1";

/// Renders a CDEvents `ArtifactPublished` 0.1.1 event wrapped in a
/// CloudEvents envelope. Only push events carry a published artifact, so
/// every other topic is rejected.
pub struct CdEventsFormatter;

impl Formatter for CdEventsFormatter {
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)> {
        if event.event_type != topic::PUSH_ARTIFACT {
            return Err(AppError::validation(format!(
                "topic '{}' cannot be rendered as CDEvents",
                event.event_type
            )));
        }

        let data = event
            .payload
            .event_data
            .as_ref()
            .ok_or_else(|| AppError::validation("event carries no data"))?;
        let resource = data
            .resources
            .first()
            .ok_or_else(|| AppError::validation("event carries no resource"))?;
        let repository = data
            .repository
            .as_ref()
            .ok_or_else(|| AppError::validation("event carries no repository"))?;

        let digest = resource.digest.as_deref().unwrap_or_default();
        let tag = resource.tag.as_deref().unwrap_or_default();
        let subject_id = format!(
            "pkg:oci/{}@{}?repository_url={}&tag={}",
            repository.name, digest, resource.resource_url, tag
        );

        let id = Uuid::new_v4().to_string();
        let source = source_for(event.project_id, event.policy_id);
        let time = rfc3339_time(event.payload.occur_at)?;

        let cdevent = json!({
            "context": {
                "version": "0.1.1",
                "id": id,
                "source": source,
                "type": CDEVENTS_TYPE,
                "timestamp": time,
            },
            "subject": {
                "id": subject_id,
                "source": source,
                "type": "artifact",
                "content": {},
            },
        });

        // The outer CloudEvent reuses the CDEvents id.
        let envelope = json!({
            "specversion": "1.0",
            "id": id,
            "source": source,
            "type": CDEVENTS_TYPE,
            "datacontenttype": "application/json",
            "time": time,
            "data": cdevent,
        });

        let body = serde_json::to_vec(&envelope)?;
        Ok((content_type("application/cloudevents+json"), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::test_support::push_hook_event;

    #[test]
    fn push_event_renders_an_oci_purl_subject() {
        let event = push_hook_event();
        let (_, body) = CdEventsFormatter.format(&event).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["type"], CDEVENTS_TYPE);
        assert_eq!(json["data"]["context"]["type"], CDEVENTS_TYPE);
        assert_eq!(json["id"], json["data"]["context"]["id"]);
        assert_eq!(
            json["data"]["subject"]["id"],
            "pkg:oci/hello-world@sha256:abc\
             ?repository_url=registry.example.com/library/hello-world:v1.0&tag=v1.0"
        );
    }

    #[test]
    fn non_push_topics_are_rejected() {
        let mut event = push_hook_event();
        event.event_type = topic::DELETE_ARTIFACT.to_string();
        assert!(CdEventsFormatter.format(&event).is_err());
    }
}
