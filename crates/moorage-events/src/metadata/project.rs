//! Project and repository lifecycle resolvers.

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, ProjectEvent, RepositoryEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A project was created.
#[derive(Debug, Clone)]
pub struct CreateProjectMetadata {
    /// The new project's id.
    pub project_id: i64,
    /// The project name.
    pub name: String,
}

impl Metadata for CreateProjectMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::CREATE_PROJECT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ProjectCreated(ProjectEvent {
                project_id: self.project_id,
                name: self.name.clone(),
            }),
        ))
    }
}

/// A project was deleted.
#[derive(Debug, Clone)]
pub struct DeleteProjectMetadata {
    /// The deleted project's id.
    pub project_id: i64,
    /// The project name.
    pub name: String,
}

impl Metadata for DeleteProjectMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_PROJECT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ProjectDeleted(ProjectEvent {
                project_id: self.project_id,
                name: self.name.clone(),
            }),
        ))
    }
}

/// A repository was deleted.
#[derive(Debug, Clone)]
pub struct DeleteRepositoryMetadata {
    /// The owning project.
    pub project_id: i64,
    /// Full repository name.
    pub name: String,
}

impl Metadata for DeleteRepositoryMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_REPOSITORY,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::RepositoryDeleted(RepositoryEvent {
                project_id: self.project_id,
                name: self.name.clone(),
            }),
        ))
    }
}
