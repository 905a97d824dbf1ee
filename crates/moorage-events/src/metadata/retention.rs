//! Tag retention resolver.

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, RetentionEvent, RetentionRule};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A tag retention run finished. Retention runs are scheduled, so the
/// operator falls back to `"auto"` when no principal is present.
#[derive(Debug, Clone)]
pub struct RetentionMetadata {
    /// The retention execution id.
    pub execution_id: i64,
    /// The project the retention policy belongs to.
    pub project_id: i64,
    /// Final run status.
    pub status: String,
    /// Total number of candidate artifacts considered.
    pub total: u64,
    /// Number of artifacts retained.
    pub retained: u64,
    /// Repository and reference of each deleted artifact.
    pub deleted_artifacts: Vec<(String, String)>,
    /// The rules the run evaluated.
    pub rules: Vec<RetentionRule>,
}

impl Metadata for RetentionMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::TAG_RETENTION,
            ctx.request.principal_or("auto").to_string(),
            EventData::Retention(RetentionEvent {
                execution_id: self.execution_id,
                project_id: self.project_id,
                status: self.status.clone(),
                total: self.total,
                retained: self.retained,
                deleted_artifacts: self.deleted_artifacts.clone(),
                rules: self.rules.clone(),
            }),
        ))
    }
}
