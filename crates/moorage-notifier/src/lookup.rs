//! Database-backed implementations of the dispatcher's lookup traits.

use async_trait::async_trait;

use moorage_database::repositories::project::ProjectRepository;
use moorage_database::repositories::replication::ReplicationRepository;
use moorage_database::repositories::scan::ScanReportRepository;

use moorage_core::result::AppResult;

use crate::project::{ProjectInfo, ProjectLookup};
use crate::replication::{
    RegistryInfo, ReplicationExecution, ReplicationLookup, ReplicationPolicyInfo, ReplicationTask,
};
use crate::scan::ScanReportLookup;

/// [`ProjectLookup`] over the `project` table.
pub struct DatabaseProjectLookup {
    projects: ProjectRepository,
}

impl DatabaseProjectLookup {
    /// Create a lookup backed by the given repository.
    pub fn new(projects: ProjectRepository) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ProjectLookup for DatabaseProjectLookup {
    async fn project(&self, project_id: i64) -> AppResult<Option<ProjectInfo>> {
        Ok(self.projects.find_by_id(project_id).await?.map(|row| ProjectInfo {
            project_id: row.project_id,
            name: row.name,
            public: row.public,
            date_created: Some(row.creation_time),
        }))
    }

    async fn project_by_name(&self, name: &str) -> AppResult<Option<ProjectInfo>> {
        Ok(self.projects.find_by_name(name).await?.map(|row| ProjectInfo {
            project_id: row.project_id,
            name: row.name,
            public: row.public,
            date_created: Some(row.creation_time),
        }))
    }
}

/// [`ScanReportLookup`] over the `scan_report` table.
pub struct DatabaseScanReportLookup {
    reports: ScanReportRepository,
}

impl DatabaseScanReportLookup {
    /// Create a lookup backed by the given repository.
    pub fn new(reports: ScanReportRepository) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl ScanReportLookup for DatabaseScanReportLookup {
    async fn report_summary(
        &self,
        digest: &str,
        scan_type: &str,
    ) -> AppResult<Option<serde_json::Value>> {
        self.reports.find_summary(digest, scan_type).await
    }
}

/// [`ReplicationLookup`] over the replication bookkeeping tables.
pub struct DatabaseReplicationLookup {
    replications: ReplicationRepository,
}

impl DatabaseReplicationLookup {
    /// Create a lookup backed by the given repository.
    pub fn new(replications: ReplicationRepository) -> Self {
        Self { replications }
    }
}

#[async_trait]
impl ReplicationLookup for DatabaseReplicationLookup {
    async fn task(&self, task_id: i64) -> AppResult<Option<ReplicationTask>> {
        Ok(self.replications.find_task(task_id).await?.map(|row| ReplicationTask {
            id: row.id,
            execution_id: row.execution_id,
            status: row.status,
            resource: row.resource,
            resource_type: row.resource_type,
            fail_reason: row.fail_reason,
        }))
    }

    async fn execution(&self, execution_id: i64) -> AppResult<Option<ReplicationExecution>> {
        Ok(self
            .replications
            .find_execution(execution_id)
            .await?
            .map(|row| ReplicationExecution {
                id: row.id,
                policy_id: row.policy_id,
                trigger: row.trigger,
                start_time: row.start_time,
            }))
    }

    async fn policy(&self, policy_id: i64) -> AppResult<Option<ReplicationPolicyInfo>> {
        Ok(self
            .replications
            .find_policy(policy_id)
            .await?
            .map(|row| ReplicationPolicyInfo {
                id: row.id,
                creator: row.creator,
                description: row.description,
                src_registry_id: row.src_registry_id,
                dest_registry_id: row.dest_registry_id,
                dest_namespace: row.dest_namespace,
            }))
    }

    async fn registry(&self, registry_id: i64) -> AppResult<Option<RegistryInfo>> {
        Ok(self
            .replications
            .find_registry(registry_id)
            .await?
            .map(|row| RegistryInfo {
                id: row.id,
                name: row.name,
                registry_type: row.registry_type,
                url: row.url,
            }))
    }
}
