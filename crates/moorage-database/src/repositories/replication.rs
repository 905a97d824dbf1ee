//! Read-only replication lookups.
//!
//! Replication execution is owned by the wider registry; the webhook
//! dispatcher walks task → execution → policy → registry to build the
//! replication payload.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;

/// One row of the `replication_task` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReplicationTaskRow {
    /// Task id.
    pub id: i64,
    /// The execution the task belongs to.
    pub execution_id: i64,
    /// Final task status.
    pub status: String,
    /// Replicated resource, `"{namespace}/{image}:{tag}"`.
    pub resource: String,
    /// Resource type (`"artifact"`, `"chart"`).
    pub resource_type: String,
    /// Failure reason, when failed.
    pub fail_reason: Option<String>,
}

/// One row of the `replication_execution` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReplicationExecutionRow {
    /// Execution id.
    pub id: i64,
    /// The policy that started the execution.
    pub policy_id: i64,
    /// What triggered the execution (`"manual"`, `"scheduled"`, `"event"`).
    pub trigger: String,
    /// When the execution started.
    pub start_time: DateTime<Utc>,
}

/// One row of the `replication_policy` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReplicationPolicyRow {
    /// Policy id.
    pub id: i64,
    /// Who created the policy.
    pub creator: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Source registry for pull-based replication.
    pub src_registry_id: Option<i64>,
    /// Destination registry for push-based replication.
    pub dest_registry_id: Option<i64>,
    /// Destination namespace.
    pub dest_namespace: String,
}

/// One row of the `registry` table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistryRow {
    /// Registry id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Registry type (`"docker-hub"`, `"harbor"`, ...).
    pub registry_type: String,
    /// Endpoint URL.
    pub url: String,
}

/// Repository for replication lookups.
#[derive(Debug, Clone)]
pub struct ReplicationRepository {
    pool: PgPool,
}

impl ReplicationRepository {
    /// Create a new replication repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a replication task by id.
    pub async fn find_task(&self, id: i64) -> AppResult<Option<ReplicationTaskRow>> {
        sqlx::query_as::<_, ReplicationTaskRow>(
            "SELECT id, execution_id, status, resource, resource_type, fail_reason \
             FROM replication_task WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find replication task", e)
        })
    }

    /// Find a replication execution by id.
    pub async fn find_execution(&self, id: i64) -> AppResult<Option<ReplicationExecutionRow>> {
        sqlx::query_as::<_, ReplicationExecutionRow>(
            "SELECT id, policy_id, trigger, start_time FROM replication_execution WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find replication execution", e)
        })
    }

    /// Find a replication policy by id.
    pub async fn find_policy(&self, id: i64) -> AppResult<Option<ReplicationPolicyRow>> {
        sqlx::query_as::<_, ReplicationPolicyRow>(
            "SELECT id, creator, description, src_registry_id, dest_registry_id, dest_namespace \
             FROM replication_policy WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find replication policy", e)
        })
    }

    /// Find a remote registry by id.
    pub async fn find_registry(&self, id: i64) -> AppResult<Option<RegistryRow>> {
        sqlx::query_as::<_, RegistryRow>(
            "SELECT id, name, registry_type, url FROM registry WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find registry", e))
    }
}
