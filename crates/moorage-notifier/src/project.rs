//! Project lookup with an in-process cache.
//!
//! Project CRUD lives outside the notification core; the dispatcher only
//! needs to resolve a project id (or name) into the metadata that goes
//! into payloads. Lookups are cached with moka since a busy repository
//! produces many events for the same project.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;

use moorage_core::result::AppResult;

/// Project metadata needed to build webhook payloads.
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    /// The project id.
    pub project_id: i64,
    /// The project name (the repository namespace).
    pub name: String,
    /// Whether the project is public.
    pub public: bool,
    /// When the project was created.
    pub date_created: Option<DateTime<Utc>>,
}

impl ProjectInfo {
    /// `"public"` or `"private"`, as it appears in payloads.
    pub fn repo_type(&self) -> &'static str {
        if self.public { "public" } else { "private" }
    }
}

/// Read-only access to project metadata.
#[async_trait]
pub trait ProjectLookup: Send + Sync {
    /// Look up a project by id.
    async fn project(&self, project_id: i64) -> AppResult<Option<ProjectInfo>>;

    /// Look up a project by name.
    async fn project_by_name(&self, name: &str) -> AppResult<Option<ProjectInfo>>;
}

/// Caching wrapper around a [`ProjectLookup`].
pub struct CachingProjectLookup {
    inner: Arc<dyn ProjectLookup>,
    by_id: Cache<i64, ProjectInfo>,
    by_name: Cache<String, ProjectInfo>,
}

impl CachingProjectLookup {
    /// Wrap a lookup with a cache of the given capacity and TTL.
    pub fn new(inner: Arc<dyn ProjectLookup>, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            by_id: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            by_name: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl ProjectLookup for CachingProjectLookup {
    async fn project(&self, project_id: i64) -> AppResult<Option<ProjectInfo>> {
        if let Some(hit) = self.by_id.get(&project_id).await {
            return Ok(Some(hit));
        }
        let found = self.inner.project(project_id).await?;
        if let Some(info) = &found {
            self.by_id.insert(project_id, info.clone()).await;
        }
        Ok(found)
    }

    async fn project_by_name(&self, name: &str) -> AppResult<Option<ProjectInfo>> {
        if let Some(hit) = self.by_name.get(name).await {
            return Ok(Some(hit));
        }
        let found = self.inner.project_by_name(name).await?;
        if let Some(info) = &found {
            self.by_name.insert(name.to_string(), info.clone()).await;
        }
        Ok(found)
    }
}
