//! Cron scheduler for periodic background work.

use std::sync::Arc;

use serde_json::json;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use moorage_core::config::audit::AuditConfig;
use moorage_core::error::AppError;
use moorage_core::result::AppResult;
use moorage_entity::job::model::{CreateJob, JobParameters};

use crate::jobs::purge::AUDIT_PURGE_JOB;
use crate::queue::JobQueue;

/// Cron-based scheduler. The only periodic task in this service is the
/// audit-log purge; it is enqueued as a regular job so the worker's retry
/// and bookkeeping apply.
pub struct CronScheduler {
    scheduler: JobScheduler,
    queue: Arc<JobQueue>,
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(queue: Arc<JobQueue>) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler, queue })
    }

    /// Register the scheduled audit-log purge.
    pub async fn register_audit_purge(
        &self,
        schedule: &str,
        audit: &AuditConfig,
    ) -> AppResult<()> {
        let queue = Arc::clone(&self.queue);
        let retention_hours = audit.purge_retention_hours;
        let include_event_types = audit.purge_include_event_types.clone();
        let dry_run = audit.purge_dry_run;

        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            let include_event_types = include_event_types.clone();
            Box::pin(async move {
                tracing::debug!("Scheduling audit purge job");
                let mut parameters = JobParameters::default();
                parameters
                    .extra
                    .insert("retention_hours".to_string(), json!(retention_hours));
                parameters.extra.insert(
                    "include_event_types".to_string(),
                    json!(include_event_types),
                );
                parameters.extra.insert("dry_run".to_string(), json!(dry_run));
                let data = CreateJob {
                    kind: "Generic".to_string(),
                    name: AUDIT_PURGE_JOB.to_string(),
                    parameters,
                    policy_id: None,
                    max_attempts: 1,
                };
                if let Err(e) = queue.enqueue(data).await {
                    tracing::error!(error = %e, "Failed to enqueue audit purge");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create purge schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add purge schedule: {e}")))?;

        tracing::info!(schedule, "Registered scheduled audit purge");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shut down scheduler: {e}")))?;
        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
