//! Replication status resolver.

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, ReplicationEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A replication run changed status. Replication runs are usually
/// scheduled, so the operator falls back to `"auto"` when no principal is
/// present.
#[derive(Debug, Clone)]
pub struct ReplicationMetadata {
    /// The replication task id.
    pub task_id: i64,
    /// The final task status.
    pub status: String,
}

impl Metadata for ReplicationMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::REPLICATION,
            ctx.request.principal_or("auto").to_string(),
            EventData::Replication(ReplicationEvent {
                task_id: self.task_id,
                status: self.status.clone(),
            }),
        ))
    }
}
