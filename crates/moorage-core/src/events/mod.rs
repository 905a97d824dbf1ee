//! Domain events emitted by Moorage operations.
//!
//! Events are dispatched through the event bus and consumed by the webhook
//! dispatcher, the audit-log sink, and internal bookkeeping handlers.
//!
//! An [`Event`] is the fully resolved envelope; the data variants are a
//! sealed sum type so handlers dispatch by pattern match rather than
//! downcasting.

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
pub mod topic;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use artifact::{ArtifactEvent, ArtifactLabelEvent};
pub use chart::ChartEvent;
pub use common::CommonEvent;
pub use project::{ProjectEvent, RepositoryEvent};
pub use quota::QuotaEvent;
pub use replication::ReplicationEvent;
pub use retention::{RetentionEvent, RetentionRule};
pub use robot::{RobotEvent, RoleEvent};
pub use scan::ScanEvent;
pub use tag::TagEvent;

/// A fully resolved domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The topic the event is published on (one of [`topic::ALL`]).
    pub topic: String,
    /// When the event occurred.
    pub occur_at: DateTime<Utc>,
    /// The operator that caused the event (`"anonymous"` or `"auto"` when
    /// no authenticated principal applies).
    pub operator: String,
    /// Correlation id of the originating request, if any.
    pub request_id: Option<String>,
    /// The event payload.
    pub data: EventData,
}

/// Union of all domain event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "event")]
pub enum EventData {
    /// An artifact was pushed.
    ArtifactPushed(ArtifactEvent),
    /// An artifact was pulled.
    ArtifactPulled(ArtifactEvent),
    /// An artifact was deleted.
    ArtifactDeleted(ArtifactEvent),
    /// A label was attached to an artifact.
    ArtifactLabeled(ArtifactLabelEvent),
    /// A tag was created.
    TagCreated(TagEvent),
    /// A tag was deleted.
    TagDeleted(TagEvent),
    /// A project was created.
    ProjectCreated(ProjectEvent),
    /// A project was deleted.
    ProjectDeleted(ProjectEvent),
    /// A repository was deleted.
    RepositoryDeleted(RepositoryEvent),
    /// A vulnerability scan changed state.
    Scan(ScanEvent),
    /// A project quota threshold was crossed.
    Quota(QuotaEvent),
    /// A replication run changed status.
    Replication(ReplicationEvent),
    /// A tag retention run finished.
    Retention(RetentionEvent),
    /// A chart was uploaded.
    ChartUploaded(ChartEvent),
    /// A chart was downloaded.
    ChartDownloaded(ChartEvent),
    /// A chart was deleted.
    ChartDeleted(ChartEvent),
    /// A robot account was created.
    RobotCreated(RobotEvent),
    /// A robot account was deleted.
    RobotDeleted(RobotEvent),
    /// A role binding was created.
    RoleCreated(RoleEvent),
    /// A role binding was deleted.
    RoleDeleted(RoleEvent),
    /// A generic audited HTTP operation.
    Common(CommonEvent),
}

impl EventData {
    /// The project the event belongs to, when it has one.
    pub fn project_id(&self) -> Option<i64> {
        match self {
            Self::ArtifactPushed(e) | Self::ArtifactPulled(e) | Self::ArtifactDeleted(e) => {
                Some(e.project_id)
            }
            Self::ArtifactLabeled(e) => Some(e.artifact.project_id),
            Self::TagCreated(e) | Self::TagDeleted(e) => Some(e.project_id),
            Self::ProjectCreated(e) | Self::ProjectDeleted(e) => Some(e.project_id),
            Self::RepositoryDeleted(e) => Some(e.project_id),
            Self::Scan(e) => Some(e.artifact.project_id),
            Self::Quota(e) => Some(e.project_id),
            Self::Retention(e) => Some(e.project_id),
            Self::RobotCreated(e) | Self::RobotDeleted(e) => Some(e.project_id),
            Self::RoleCreated(e) | Self::RoleDeleted(e) => Some(e.project_id),
            Self::Common(e) => e.project_id,
            Self::Replication(_)
            | Self::ChartUploaded(_)
            | Self::ChartDownloaded(_)
            | Self::ChartDeleted(_) => None,
        }
    }
}
