//! Generic audited HTTP operation resolver.

use moorage_core::events::topic;
use moorage_core::events::{CommonEvent, Event, EventData};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A generic audited HTTP operation, produced by the common-event
/// framework. The operator was already extracted by the framework, so the
/// envelope carries it verbatim.
#[derive(Debug, Clone)]
pub struct CommonEventMetadata {
    /// The operator that performed the operation.
    pub operator: String,
    /// The project the operation belongs to, if any.
    pub project_id: Option<i64>,
    /// The resource type.
    pub resource_type: String,
    /// The resource display name.
    pub resource_name: String,
    /// The operation performed.
    pub operation: String,
    /// Human-readable description.
    pub operation_description: String,
    /// Whether the response indicated success.
    pub is_successful: bool,
    /// Redacted request payload.
    pub payload: String,
}

impl Metadata for CommonEventMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::COMMON_EVENT,
            self.operator.clone(),
            EventData::Common(CommonEvent {
                operator: self.operator.clone(),
                project_id: self.project_id,
                resource_type: self.resource_type.clone(),
                resource_name: self.resource_name.clone(),
                operation: self.operation.clone(),
                operation_description: self.operation_description.clone(),
                is_successful: self.is_successful,
                payload: self.payload.clone(),
            }),
        ))
    }
}
