//! Job queue over the `jobs` table.

use uuid::Uuid;

use moorage_core::result::AppResult;
use moorage_database::repositories::job::JobRepository;
use moorage_entity::job::model::{CreateJob, Job};
use moorage_entity::job::status::JobStatus;

/// Queue for enqueuing and claiming background jobs.
#[derive(Clone)]
pub struct JobQueue {
    repo: JobRepository,
    worker_id: String,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(repo: JobRepository, worker_id: String) -> Self {
        Self { repo, worker_id }
    }

    /// Enqueue a new job.
    pub async fn enqueue(&self, data: CreateJob) -> AppResult<Job> {
        let job = self.repo.create(&data).await?;
        tracing::debug!(job_id = %job.id, name = %job.name, "Enqueued job");
        Ok(job)
    }

    /// Claim the next pending job for this worker.
    pub async fn dequeue(&self) -> AppResult<Option<Job>> {
        let job = self.repo.dequeue(&self.worker_id).await?;
        if let Some(job) = &job {
            tracing::debug!(job_id = %job.id, name = %job.name, "Claimed job");
        }
        Ok(job)
    }

    /// Mark a job as completed.
    pub async fn complete(&self, job_id: Uuid) -> AppResult<()> {
        self.repo.complete(job_id).await?;
        tracing::debug!(%job_id, "Job completed");
        Ok(())
    }

    /// Mark a job as failed.
    pub async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.repo.fail(job_id, error).await?;
        tracing::debug!(%job_id, error, "Job failed");
        Ok(())
    }

    /// Put a failed job back in the pending state for another attempt.
    pub async fn retry(&self, job_id: Uuid) -> AppResult<()> {
        self.repo.retry(job_id).await?;
        tracing::debug!(%job_id, "Job queued for retry");
        Ok(())
    }

    /// Queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        Ok(QueueStats {
            pending: self.repo.count_by_status(JobStatus::Pending).await?,
            running: self.repo.count_by_status(JobStatus::Running).await?,
            failed: self.repo.count_by_status(JobStatus::Failed).await?,
            worker_id: self.worker_id.clone(),
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStats {
    /// Number of pending jobs.
    pub pending: i64,
    /// Number of running jobs.
    pub running: i64,
    /// Number of failed jobs.
    pub failed: i64,
    /// Current worker identifier.
    pub worker_id: String,
}
