//! Scheduled audit-log purge job handler.

use std::sync::Arc;

use async_trait::async_trait;

use moorage_audit::purge::{PurgeParams, PurgeService};
use moorage_core::config::audit::AuditConfig;
use moorage_entity::job::model::Job;

use crate::executor::{JobExecutionError, JobHandler};

/// Job name of the scheduled audit-log purge.
pub const AUDIT_PURGE_JOB: &str = "AUDIT_PURGE";

/// Runs one audit-log purge per job. Parameters can be overridden in the
/// job's extra parameters; anything missing falls back to the configured
/// defaults.
pub struct AuditPurgeJobHandler {
    purge: Arc<PurgeService>,
    defaults: PurgeParams,
}

impl AuditPurgeJobHandler {
    /// Create a purge handler with defaults from the audit configuration.
    pub fn new(purge: Arc<PurgeService>, config: &AuditConfig) -> Self {
        Self {
            purge,
            defaults: PurgeParams {
                retention_hours: config.purge_retention_hours,
                include_event_types: config.purge_include_event_types.clone(),
                dry_run: config.purge_dry_run,
            },
        }
    }

}

/// Apply a job's extra parameters over the configured defaults.
fn params_for(defaults: &PurgeParams, job: &Job) -> PurgeParams {
    let extra = &job.parameters.extra;
    PurgeParams {
        retention_hours: extra
            .get("retention_hours")
            .and_then(|v| v.as_i64())
            .unwrap_or(defaults.retention_hours),
        include_event_types: extra
            .get("include_event_types")
            .and_then(|v| v.as_array())
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_else(|| defaults.include_event_types.clone()),
        dry_run: extra
            .get("dry_run")
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.dry_run),
    }
}

#[async_trait]
impl JobHandler for AuditPurgeJobHandler {
    fn job_name(&self) -> &'static str {
        AUDIT_PURGE_JOB
    }

    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let params = params_for(&self.defaults, job);
        let affected = self.purge.purge(&params).await?;
        tracing::info!(job_id = %job.id, affected, dry_run = params.dry_run, "Audit purge job finished");
        Ok(())
    }
}
