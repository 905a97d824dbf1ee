//! Scan status resolver.

use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::events::{ArtifactEvent, Event, EventData, ScanEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A vulnerability scan changed state. Scan events are system-triggered,
/// so the operator is always `"auto"`.
#[derive(Debug, Clone)]
pub struct ScanMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The scanned artifact's digest.
    pub digest: String,
    /// Tags pointing at the artifact.
    pub tags: Vec<String>,
    /// Raw status from the scan controller.
    pub status: String,
    /// Scan type identifier.
    pub scan_type: String,
}

impl Metadata for ScanMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        let topic = match self.status.as_str() {
            "Success" => topic::SCANNING_COMPLETED,
            "Stopped" => topic::SCANNING_STOPPED,
            "Error" => topic::SCANNING_FAILED,
            other => {
                return Err(AppError::validation(format!(
                    "unsupported scan status '{other}'"
                )));
            }
        };
        Ok(envelope(
            ctx,
            topic,
            "auto".to_string(),
            EventData::Scan(ScanEvent {
                artifact: ArtifactEvent {
                    project_id: self.project_id,
                    repository: self.repository.clone(),
                    digest: self.digest.clone(),
                    tags: self.tags.clone(),
                },
                status: self.status.clone(),
                scan_type: self.scan_type.clone(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_support::TestContext;

    use moorage_core::context::RequestContext;
    use moorage_core::error::ErrorKind;

    fn metadata(status: &str) -> ScanMetadata {
        ScanMetadata {
            project_id: 1,
            repository: "library/hello-world".into(),
            digest: "sha256:abc".into(),
            tags: vec!["v1.0".into()],
            status: status.into(),
            scan_type: "vulnerability".into(),
        }
    }

    #[test]
    fn status_maps_to_topic() {
        let ctx = TestContext::new(RequestContext::new("admin"));
        let cases = [
            ("Success", topic::SCANNING_COMPLETED),
            ("Stopped", topic::SCANNING_STOPPED),
            ("Error", topic::SCANNING_FAILED),
        ];
        for (status, expected) in cases {
            let event = metadata(status).resolve(&ctx.resolve_ctx()).unwrap();
            assert_eq!(event.topic, expected);
            assert_eq!(event.operator, "auto");
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let ctx = TestContext::new(RequestContext::anonymous());
        let err = metadata("Running").resolve(&ctx.resolve_ctx()).unwrap_err();
        assert!(err.is_kind(ErrorKind::Validation));
        assert!(err.message.contains("unsupported scan status"));
    }
}
