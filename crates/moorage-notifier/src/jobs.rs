//! The delivery job sink.
//!
//! The dispatcher never delivers webhooks itself: it renders the payload
//! and hands a job to a [`HookSender`]. The queue-backed sender enqueues
//! the job for the worker; tests substitute a capturing sender.

use async_trait::async_trait;
use tracing::debug;

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;
use moorage_database::repositories::job::JobRepository;
use moorage_entity::job::model::{CreateJob, JobParameters};
use moorage_entity::policy::target::Target;

use crate::formatter::HookHeaders;

/// Job kind for all hook deliveries.
pub const HOOK_JOB_KIND: &str = "Generic";

/// Accepts rendered delivery jobs.
#[async_trait]
pub trait HookSender: Send + Sync {
    /// Submit one delivery job.
    async fn submit(&self, job: CreateJob) -> AppResult<()>;
}

/// Build the delivery job for one rendered `(target, payload)` pair.
pub fn delivery_job(
    target: &Target,
    policy_id: i64,
    body: Vec<u8>,
    headers: &HookHeaders,
    max_attempts: i32,
) -> AppResult<CreateJob> {
    let payload = String::from_utf8(body).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "rendered payload is not UTF-8", e)
    })?;
    Ok(CreateJob {
        kind: HOOK_JOB_KIND.to_string(),
        name: target.target_type.job_name().to_string(),
        parameters: JobParameters {
            payload,
            address: target.address.clone(),
            header: serde_json::to_string(headers)?,
            skip_cert_verify: target.skip_cert_verify,
            extra: Default::default(),
        },
        policy_id: Some(policy_id),
        max_attempts,
    })
}

/// [`HookSender`] backed by the jobs table.
pub struct QueueHookSender {
    jobs: JobRepository,
}

impl QueueHookSender {
    /// Create a queue-backed sender.
    pub fn new(jobs: JobRepository) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl HookSender for QueueHookSender {
    async fn submit(&self, job: CreateJob) -> AppResult<()> {
        let created = self.jobs.create(&job).await?;
        debug!(job_id = %created.id, name = %created.name, "Enqueued hook delivery job");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use moorage_entity::policy::target::{PayloadFormat, TargetType};

    #[test]
    fn delivery_job_carries_the_wire_contract() {
        let target = Target {
            target_type: TargetType::Slack,
            address: "https://hooks.slack.com/services/T0/B0/x".into(),
            auth_header: Some("Bearer token".into()),
            skip_cert_verify: true,
            payload_format: PayloadFormat::Default,
        };
        let headers =
            HookHeaders::from([("Content-Type".to_string(), vec!["application/json".to_string()])]);

        let job = delivery_job(&target, 7, b"{}".to_vec(), &headers, 3).unwrap();
        assert_eq!(job.kind, "Generic");
        assert_eq!(job.name, "SLACK");
        assert_eq!(job.policy_id, Some(7));
        assert_eq!(job.parameters.payload, "{}");
        assert!(job.parameters.skip_cert_verify);

        let header: HookHeaders = serde_json::from_str(&job.parameters.header).unwrap();
        assert_eq!(
            header.get("Content-Type"),
            Some(&vec!["application/json".to_string()])
        );
    }
}
