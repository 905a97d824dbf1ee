//! Chart lifecycle resolvers.

use moorage_core::events::topic;
use moorage_core::events::{ChartEvent, Event, EventData};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A chart was uploaded.
#[derive(Debug, Clone)]
pub struct ChartUploadMetadata {
    /// The owning project name.
    pub project_name: String,
    /// The chart name.
    pub chart_name: String,
    /// The uploaded versions.
    pub versions: Vec<String>,
}

impl Metadata for ChartUploadMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::UPLOAD_CHART,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ChartUploaded(ChartEvent {
                project_name: self.project_name.clone(),
                chart_name: self.chart_name.clone(),
                versions: self.versions.clone(),
            }),
        ))
    }
}

/// A chart was downloaded. Like pulls, downloads may be unauthenticated.
#[derive(Debug, Clone)]
pub struct ChartDownloadMetadata {
    /// The owning project name.
    pub project_name: String,
    /// The chart name.
    pub chart_name: String,
    /// The downloaded versions.
    pub versions: Vec<String>,
}

impl Metadata for ChartDownloadMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DOWNLOAD_CHART,
            ctx.request.principal_or("anonymous").to_string(),
            EventData::ChartDownloaded(ChartEvent {
                project_name: self.project_name.clone(),
                chart_name: self.chart_name.clone(),
                versions: self.versions.clone(),
            }),
        ))
    }
}

/// A chart was deleted.
#[derive(Debug, Clone)]
pub struct ChartDeleteMetadata {
    /// The owning project name.
    pub project_name: String,
    /// The chart name.
    pub chart_name: String,
    /// The deleted versions.
    pub versions: Vec<String>,
}

impl Metadata for ChartDeleteMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_CHART,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::ChartDeleted(ChartEvent {
                project_name: self.project_name.clone(),
                chart_name: self.chart_name.clone(),
                versions: self.versions.clone(),
            }),
        ))
    }
}
