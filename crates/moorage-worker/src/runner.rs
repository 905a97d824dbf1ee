//! Worker runner polling the queue and executing claimed jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;

use moorage_core::config::worker::WorkerConfig;
use moorage_entity::job::model::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::JobQueue;

/// Main worker loop: claims pending jobs and runs them on a bounded pool.
pub struct WorkerRunner {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        queue: Arc<JobQueue>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            queue,
            executor,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to `true`. In-flight jobs get a
    /// grace period to finish.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(worker_id = %self.worker_id, "Worker received shutdown signal");
                        break;
                    }
                }
                _ = self.poll_and_execute(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!(worker_id = %self.worker_id, "Worker shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Waiting for in-flight jobs");
        let max_permits = self.config.concurrency as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;
        tracing::info!(worker_id = %self.worker_id, "Worker shut down");
    }

    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::trace!("All worker slots occupied");
                return;
            }
        };

        match self.queue.dequeue().await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);
                tokio::spawn(async move {
                    let _permit = permit;
                    settle(&queue, &executor, job).await;
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No pending jobs");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to dequeue job");
            }
        }
    }
}

/// Execute one claimed job and record the outcome.
async fn settle(queue: &JobQueue, executor: &JobExecutor, job: Job) {
    let job_id = job.id;
    match executor.execute(&job).await {
        Ok(()) => {
            if let Err(e) = queue.complete(job_id).await {
                tracing::error!(%job_id, error = %e, "Failed to mark job completed");
            }
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!(%job_id, error = %msg, "Job failed transiently");
            let outcome = if job.can_retry() {
                queue.retry(job_id).await
            } else {
                queue.fail(job_id, &msg).await
            };
            if let Err(e) = outcome {
                tracing::error!(%job_id, error = %e, "Failed to settle transient failure");
            }
        }
        Err(JobExecutionError::Permanent(msg)) => {
            tracing::error!(%job_id, error = %msg, "Job failed permanently");
            if let Err(e) = queue.fail(job_id, &msg).await {
                tracing::error!(%job_id, error = %e, "Failed to mark job failed");
            }
        }
        Err(JobExecutionError::Internal(err)) => {
            let msg = err.to_string();
            tracing::error!(%job_id, error = %msg, "Job hit an internal error");
            if let Err(e) = queue.fail(job_id, &msg).await {
                tracing::error!(%job_id, error = %e, "Failed to mark job failed");
            }
        }
    }
}
