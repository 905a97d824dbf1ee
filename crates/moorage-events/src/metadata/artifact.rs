//! Artifact push/pull/delete/label resolvers.

use moorage_core::events::topic;
use moorage_core::events::{ArtifactEvent, ArtifactLabelEvent, Event, EventData};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// An artifact was pushed.
#[derive(Debug, Clone)]
pub struct PushArtifactMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The artifact digest.
    pub digest: String,
    /// Tags pushed, empty for a push by digest.
    pub tags: Vec<String>,
}

impl Metadata for PushArtifactMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::PUSH_ARTIFACT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ArtifactPushed(ArtifactEvent {
                project_id: self.project_id,
                repository: self.repository.clone(),
                digest: self.digest.clone(),
                tags: self.tags.clone(),
            }),
        ))
    }
}

/// An artifact was pulled. Pulls are the one operation routinely performed
/// without an authenticated user, so the operator falls back to
/// `"anonymous"`.
#[derive(Debug, Clone)]
pub struct PullArtifactMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The artifact digest.
    pub digest: String,
    /// Tags the pull was addressed by, empty for a pull by digest.
    pub tags: Vec<String>,
}

impl Metadata for PullArtifactMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::PULL_ARTIFACT,
            ctx.request.principal_or("anonymous").to_string(),
            EventData::ArtifactPulled(ArtifactEvent {
                project_id: self.project_id,
                repository: self.repository.clone(),
                digest: self.digest.clone(),
                tags: self.tags.clone(),
            }),
        ))
    }
}

/// An artifact was deleted.
#[derive(Debug, Clone)]
pub struct DeleteArtifactMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The artifact digest.
    pub digest: String,
    /// Tags that pointed at the artifact.
    pub tags: Vec<String>,
}

impl Metadata for DeleteArtifactMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_ARTIFACT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ArtifactDeleted(ArtifactEvent {
                project_id: self.project_id,
                repository: self.repository.clone(),
                digest: self.digest.clone(),
                tags: self.tags.clone(),
            }),
        ))
    }
}

/// A label was attached to an artifact.
#[derive(Debug, Clone)]
pub struct LabelArtifactMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The artifact digest.
    pub digest: String,
    /// Tags pointing at the artifact.
    pub tags: Vec<String>,
    /// The label name.
    pub label: String,
}

impl Metadata for LabelArtifactMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::ARTIFACT_LABELED,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ArtifactLabeled(ArtifactLabelEvent {
                artifact: ArtifactEvent {
                    project_id: self.project_id,
                    repository: self.repository.clone(),
                    digest: self.digest.clone(),
                    tags: self.tags.clone(),
                },
                label: self.label.clone(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_support::TestContext;

    use moorage_core::context::RequestContext;

    #[test]
    fn pull_without_principal_is_anonymous() {
        let ctx = TestContext::new(RequestContext::anonymous());
        let metadata = PullArtifactMetadata {
            project_id: 1,
            repository: "library/hello-world".into(),
            digest: "sha256:abc".into(),
            tags: vec![],
        };
        let event = metadata.resolve(&ctx.resolve_ctx()).unwrap();
        assert_eq!(event.topic, topic::PULL_ARTIFACT);
        assert_eq!(event.operator, "anonymous");
    }

    #[test]
    fn push_carries_the_principal() {
        let ctx = TestContext::new(RequestContext::new("admin").with_request_id("req-1"));
        let metadata = PushArtifactMetadata {
            project_id: 1,
            repository: "library/hello-world".into(),
            digest: "sha256:abc".into(),
            tags: vec!["v1.0".into()],
        };
        let event = metadata.resolve(&ctx.resolve_ctx()).unwrap();
        assert_eq!(event.topic, topic::PUSH_ARTIFACT);
        assert_eq!(event.operator, "admin");
        assert_eq!(event.request_id.as_deref(), Some("req-1"));
        match event.data {
            EventData::ArtifactPushed(a) => assert_eq!(a.reference(), "v1.0"),
            other => panic!("unexpected data: {other:?}"),
        }
    }
}
