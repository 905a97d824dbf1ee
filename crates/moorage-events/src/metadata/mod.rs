//! Lazy event descriptors.
//!
//! A [`Metadata`] value is created at the call site that performs a domain
//! action and may be queued (see [`crate::collector`]) before it is
//! resolved. Resolution stamps the topic, the wall-clock timestamp, and
//! the operator from the request context, producing a fully populated
//! [`Event`].

pub mod artifact;
pub mod chart;
pub mod common;
pub mod project;
pub mod quota;
pub mod replication;
pub mod retention;
pub mod robot;
pub mod scan;
pub mod tag;

use chrono::Utc;

use moorage_core::config::NotificationConfig;
use moorage_core::context::RequestContext;
use moorage_core::error::AppError;
use moorage_core::events::{Event, EventData};
use moorage_core::result::AppResult;

use crate::bus::EventBus;

pub use artifact::{
    DeleteArtifactMetadata, LabelArtifactMetadata, PullArtifactMetadata, PushArtifactMetadata,
};
pub use chart::{ChartDeleteMetadata, ChartDownloadMetadata, ChartUploadMetadata};
pub use common::CommonEventMetadata;
pub use project::{CreateProjectMetadata, DeleteProjectMetadata, DeleteRepositoryMetadata};
pub use quota::QuotaMetadata;
pub use replication::ReplicationMetadata;
pub use retention::RetentionMetadata;
pub use robot::{
    CreateRobotMetadata, CreateRoleMetadata, DeleteRobotMetadata, DeleteRoleMetadata,
};
pub use scan::ScanMetadata;
pub use tag::{CreateTagMetadata, DeleteTagMetadata};

/// Everything a resolver may read: the originating request's identity and
/// the notification configuration (robot/role prefixes).
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// The request that produced the event.
    pub request: &'a RequestContext,
    /// Notification settings.
    pub config: &'a NotificationConfig,
}

/// A lazy event descriptor. Resolving exactly once yields the event with
/// its topic, timestamp, and operator populated.
pub trait Metadata: Send + Sync {
    /// Resolve into a concrete event.
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event>;
}

/// Construct the event envelope shared by every resolver.
pub(crate) fn envelope(
    ctx: &ResolveContext<'_>,
    topic: &str,
    operator: String,
    data: EventData,
) -> Event {
    Event {
        topic: topic.to_string(),
        occur_at: Utc::now(),
        operator,
        request_id: ctx.request.request_id.clone(),
        data,
    }
}

/// Resolve a metadata into an event, wrapping any resolver failure.
pub fn build_event(ctx: &ResolveContext<'_>, metadata: &dyn Metadata) -> AppResult<Event> {
    metadata.resolve(ctx).map_err(|e| {
        let kind = e.kind;
        AppError::with_source(kind, "failed to resolve event metadata", e)
    })
}

/// Resolve a metadata and publish the resulting event on the bus.
pub fn build_and_publish(
    bus: &EventBus,
    ctx: &ResolveContext<'_>,
    metadata: &dyn Metadata,
) -> AppResult<()> {
    let event = build_event(ctx, metadata)?;
    bus.publish(event)
}

#[cfg(test)]
pub(crate) mod test_support {
    use moorage_core::config::NotificationConfig;
    use moorage_core::context::RequestContext;

    use super::ResolveContext;

    pub struct TestContext {
        pub request: RequestContext,
        pub config: NotificationConfig,
    }

    impl TestContext {
        pub fn new(request: RequestContext) -> Self {
            Self {
                request,
                config: NotificationConfig::default(),
            }
        }

        pub fn resolve_ctx(&self) -> ResolveContext<'_> {
            ResolveContext {
                request: &self.request,
                config: &self.config,
            }
        }
    }
}
