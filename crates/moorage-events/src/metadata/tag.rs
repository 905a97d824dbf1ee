//! Tag create/delete resolvers.

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, TagEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A tag was created.
#[derive(Debug, Clone)]
pub struct CreateTagMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The tag name.
    pub tag: String,
    /// The digest the tag points at.
    pub digest: String,
}

impl Metadata for CreateTagMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::CREATE_TAG,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::TagCreated(TagEvent {
                project_id: self.project_id,
                repository: self.repository.clone(),
                tag: self.tag.clone(),
                digest: self.digest.clone(),
            }),
        ))
    }
}

/// A tag was deleted.
#[derive(Debug, Clone)]
pub struct DeleteTagMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub repository: String,
    /// The tag name.
    pub tag: String,
    /// The digest the tag pointed at.
    pub digest: String,
}

impl Metadata for DeleteTagMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_TAG,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::TagDeleted(TagEvent {
                project_id: self.project_id,
                repository: self.repository.clone(),
                tag: self.tag.clone(),
                digest: self.digest.clone(),
            }),
        ))
    }
}
