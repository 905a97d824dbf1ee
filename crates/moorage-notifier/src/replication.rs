//! Replication metadata lookup.
//!
//! Replication events carry only a task id; payload construction walks
//! task → execution → policy → registry through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use moorage_core::result::AppResult;

/// A replication task.
#[derive(Debug, Clone)]
pub struct ReplicationTask {
    /// The task id.
    pub id: i64,
    /// The execution the task belongs to.
    pub execution_id: i64,
    /// The task status.
    pub status: String,
    /// The replicated resource, `"{repository}:{reference}"`.
    pub resource: String,
    /// The resource type (e.g. `"artifact"`).
    pub resource_type: String,
    /// Failure reason, failed tasks only.
    pub fail_reason: Option<String>,
}

/// A replication execution.
#[derive(Debug, Clone)]
pub struct ReplicationExecution {
    /// The execution id.
    pub id: i64,
    /// The policy the execution ran under.
    pub policy_id: i64,
    /// How the execution was triggered (`"manual"`, `"scheduled"`, ...).
    pub trigger: String,
    /// When the execution started.
    pub start_time: DateTime<Utc>,
}

/// A replication policy.
#[derive(Debug, Clone)]
pub struct ReplicationPolicyInfo {
    /// The policy id.
    pub id: i64,
    /// Who created the policy.
    pub creator: Option<String>,
    /// The policy description.
    pub description: Option<String>,
    /// The remote source registry for pull-based replication.
    pub src_registry_id: Option<i64>,
    /// The remote destination registry for push-based replication.
    pub dest_registry_id: Option<i64>,
    /// The namespace on the destination side.
    pub dest_namespace: String,
}

/// A remote registry.
#[derive(Debug, Clone)]
pub struct RegistryInfo {
    /// The registry id.
    pub id: i64,
    /// The registry name.
    pub name: String,
    /// The registry type.
    pub registry_type: String,
    /// The registry endpoint URL.
    pub url: String,
}

/// Read-only access to replication bookkeeping.
#[async_trait]
pub trait ReplicationLookup: Send + Sync {
    /// Look up a task by id.
    async fn task(&self, task_id: i64) -> AppResult<Option<ReplicationTask>>;

    /// Look up an execution by id.
    async fn execution(&self, execution_id: i64) -> AppResult<Option<ReplicationExecution>>;

    /// Look up a replication policy by id.
    async fn policy(&self, policy_id: i64) -> AppResult<Option<ReplicationPolicyInfo>>;

    /// Look up a remote registry by id.
    async fn registry(&self, registry_id: i64) -> AppResult<Option<RegistryInfo>>;
}
