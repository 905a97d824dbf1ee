//! Job executor dispatching claimed jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use moorage_core::error::AppError;
use moorage_entity::job::model::Job;

/// A handler for one job name.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job name this handler processes (`"WEBHOOK"`, `"SLACK"`,
    /// `"TEAMS"`, `"AUDIT_PURGE"`).
    fn job_name(&self) -> &'static str;

    /// Execute the job.
    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; do not retry.
    #[error("permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; may retry.
    #[error("transient job failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs to the handler registered under their name.
#[derive(Default)]
pub struct JobExecutor {
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let name = handler.job_name();
        tracing::info!(name, "Registered job handler");
        self.handlers.insert(name, handler);
    }

    /// Execute a job by dispatching to its handler.
    pub async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let handler = self.handlers.get(job.name.as_str()).ok_or_else(|| {
            JobExecutionError::Permanent(format!("no handler registered for job '{}'", job.name))
        })?;
        tracing::info!(
            job_id = %job.id,
            name = %job.name,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            "Executing job"
        );
        handler.execute(job).await
    }

    /// Whether a handler is registered for a job name.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
