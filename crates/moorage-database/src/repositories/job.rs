//! Job repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;
use moorage_entity::job::model::{CreateJob, Job};
use moorage_entity::job::status::JobStatus;

/// The most recent delivery job per policy and job name, used to report
/// when a policy last fired.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyLastTrigger {
    /// The policy that produced the job.
    pub policy_id: i64,
    /// The job name (`"WEBHOOK"`, `"SLACK"`, `"TEAMS"`).
    pub job_name: String,
    /// When the most recent job was created.
    pub last_trigger: DateTime<Utc>,
}

/// Repository for background job CRUD and queue operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// Create a new job in the pending state.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (kind, name, parameters, policy_id, max_attempts) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&data.kind)
        .bind(&data.name)
        .bind(Json(&data.parameters))
        .bind(data.policy_id)
        .bind(data.max_attempts)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    /// Claim the next pending job (SKIP LOCKED for concurrency).
    pub async fn dequeue(&self, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', worker_id = $1, \
             attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs WHERE status = 'pending' \
                ORDER BY created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to dequeue job", e))
    }

    /// Mark a job as completed.
    pub async fn complete(&self, job_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', status_message = NULL, \
             completed_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    /// Mark a job as failed.
    pub async fn fail(&self, job_id: Uuid, status_message: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', status_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(status_message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job as failed", e))?;
        Ok(())
    }

    /// Reset a job to pending for another attempt. Covers both jobs that
    /// already settled as failed and running jobs whose handler reported a
    /// transient failure.
    pub async fn retry(&self, job_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', worker_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('running', 'failed') AND attempts < max_attempts",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to retry job", e))?;
        Ok(())
    }

    /// Count jobs in a given status.
    pub async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }

    /// Most recent job creation time per (policy, job name) for the given
    /// policies.
    pub async fn last_trigger_times(
        &self,
        policy_ids: &[i64],
    ) -> AppResult<Vec<PolicyLastTrigger>> {
        sqlx::query_as::<_, PolicyLastTrigger>(
            "SELECT policy_id, name AS job_name, MAX(created_at) AS last_trigger \
             FROM jobs WHERE policy_id = ANY($1) \
             GROUP BY policy_id, name",
        )
        .bind(policy_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load last trigger times", e)
        })
    }

    /// Delete terminal jobs older than the cutoff.
    pub async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs \
             WHERE status IN ('completed', 'failed', 'cancelled') AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clean up jobs", e))?;
        Ok(result.rows_affected())
    }
}
