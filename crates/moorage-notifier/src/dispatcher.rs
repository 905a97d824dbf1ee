//! The webhook dispatcher.
//!
//! Subscribed to every externally notifiable topic. For each event it
//! resolves the owning project, finds the related policies, builds the
//! topic-specific payload once, then renders and submits one delivery job
//! per `(policy, target)` pair.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, warn};

use moorage_core::config::NotificationConfig;
use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::events::{
    ArtifactEvent, ChartEvent, Event, EventData, QuotaEvent, ReplicationEvent, RetentionEvent,
    ScanEvent,
};
use moorage_core::result::AppResult;
use moorage_core::settings::RuntimeSettings;
use moorage_entity::policy::target::{Target, TargetType};
use moorage_events::EventHandler;

use crate::formatter::FormatterRegistry;
use crate::jobs::{HookSender, delivery_job};
use crate::model::{
    EventPayloadData, HookEvent, Payload, ReplicationArtifact, ReplicationInfo,
    ReplicationResource, Repository, Resource, RetentionArtifact, RetentionInfo,
};
use crate::policy::PolicyProvider;
use crate::project::{ProjectInfo, ProjectLookup};
use crate::replication::ReplicationLookup;
use crate::scan::ScanReportLookup;

/// How often the dispatcher polls for a pending scan report.
const SCAN_REPORT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The topics the webhook dispatcher subscribes to.
pub const WEBHOOK_TOPICS: &[&str] = &[
    topic::PUSH_ARTIFACT,
    topic::PULL_ARTIFACT,
    topic::DELETE_ARTIFACT,
    topic::QUOTA_EXCEED,
    topic::QUOTA_WARNING,
    topic::SCANNING_COMPLETED,
    topic::SCANNING_STOPPED,
    topic::SCANNING_FAILED,
    topic::REPLICATION,
    topic::TAG_RETENTION,
    topic::UPLOAD_CHART,
    topic::DOWNLOAD_CHART,
    topic::DELETE_CHART,
];

/// Matches events against notification policies and submits delivery jobs.
pub struct WebhookHandler {
    settings: Arc<RuntimeSettings>,
    config: Arc<NotificationConfig>,
    projects: Arc<dyn ProjectLookup>,
    scans: Arc<dyn ScanReportLookup>,
    replications: Arc<dyn ReplicationLookup>,
    policies: Arc<dyn PolicyProvider>,
    formatters: Arc<FormatterRegistry>,
    sender: Arc<dyn HookSender>,
}

impl WebhookHandler {
    /// Create a new webhook dispatcher.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<RuntimeSettings>,
        config: Arc<NotificationConfig>,
        projects: Arc<dyn ProjectLookup>,
        scans: Arc<dyn ScanReportLookup>,
        replications: Arc<dyn ReplicationLookup>,
        policies: Arc<dyn PolicyProvider>,
        formatters: Arc<FormatterRegistry>,
        sender: Arc<dyn HookSender>,
    ) -> Self {
        Self {
            settings,
            config,
            projects,
            scans,
            replications,
            policies,
            formatters,
            sender,
        }
    }

    /// The externally visible registry host, without the URL scheme.
    fn ext_host(&self) -> &str {
        self.config
            .ext_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    /// Resolve the project an event belongs to. Replication events carry
    /// only a task id, so the project comes from the local resource's
    /// namespace; chart events carry the project name.
    async fn resolve_project(&self, event: &Event) -> AppResult<Option<ProjectInfo>> {
        match &event.data {
            EventData::Replication(r) => {
                let Some(task) = self.replications.task(r.task_id).await? else {
                    return Ok(None);
                };
                let namespace = task.resource.split('/').next().unwrap_or_default();
                if namespace.is_empty() {
                    return Ok(None);
                }
                self.projects.project_by_name(namespace).await
            }
            EventData::ChartUploaded(c)
            | EventData::ChartDownloaded(c)
            | EventData::ChartDeleted(c) => self.projects.project_by_name(&c.project_name).await,
            _ => match event.data.project_id() {
                Some(project_id) => self.projects.project(project_id).await,
                None => Ok(None),
            },
        }
    }

    async fn build_payload(&self, event: &Event, project: &ProjectInfo) -> AppResult<Payload> {
        let event_data = match &event.data {
            EventData::ArtifactPushed(a)
            | EventData::ArtifactPulled(a)
            | EventData::ArtifactDeleted(a) => Some(EventPayloadData {
                resources: vec![self.artifact_resource(a, None)],
                repository: Some(self.repository(project, &a.repository)),
                ..EventPayloadData::default()
            }),
            EventData::Scan(s) => Some(self.scan_data(s, project).await),
            EventData::Quota(q) => Some(self.quota_data(q, project)),
            EventData::Replication(r) => Some(EventPayloadData {
                replication: Some(self.replication_info(r).await?),
                ..EventPayloadData::default()
            }),
            EventData::Retention(r) => Some(EventPayloadData {
                retention: Some(retention_info(r)),
                ..EventPayloadData::default()
            }),
            EventData::ChartUploaded(c)
            | EventData::ChartDownloaded(c)
            | EventData::ChartDeleted(c) => Some(EventPayloadData {
                resources: self.chart_resources(c),
                ..EventPayloadData::default()
            }),
            _ => {
                return Err(AppError::validation(format!(
                    "topic '{}' is not notifiable via webhooks",
                    event.topic
                )));
            }
        };

        Ok(Payload {
            kind: event.topic.clone(),
            occur_at: event.occur_at.timestamp(),
            operator: event.operator.clone(),
            event_data,
        })
    }

    fn artifact_resource(
        &self,
        artifact: &ArtifactEvent,
        scan_overview: Option<serde_json::Value>,
    ) -> Resource {
        let host = self.ext_host();
        let resource_url = if artifact.tags.is_empty() {
            format!("{host}/{}@{}", artifact.repository, artifact.digest)
        } else {
            format!("{host}/{}:{}", artifact.repository, artifact.reference())
        };
        Resource {
            digest: Some(artifact.digest.clone()),
            tag: Some(artifact.reference().to_string()),
            resource_url,
            scan_overview,
        }
    }

    fn repository(&self, project: &ProjectInfo, full_name: &str) -> Repository {
        let (namespace, name) = Repository::split_name(full_name);
        Repository {
            date_created: project.date_created.map(|t| t.timestamp()),
            name,
            namespace,
            repo_full_name: full_name.to_string(),
            repo_type: project.repo_type().to_string(),
        }
    }

    async fn scan_data(&self, scan: &ScanEvent, project: &ProjectInfo) -> EventPayloadData {
        let scan_overview = self
            .wait_for_scan_report(&scan.artifact.digest, &scan.scan_type)
            .await;
        EventPayloadData {
            resources: vec![self.artifact_resource(&scan.artifact, scan_overview)],
            repository: Some(self.repository(project, &scan.artifact.repository)),
            ..EventPayloadData::default()
        }
    }

    /// Report persistence races with event publication, so poll for a
    /// short window before shipping the payload without an overview.
    async fn wait_for_scan_report(
        &self,
        digest: &str,
        scan_type: &str,
    ) -> Option<serde_json::Value> {
        let deadline = Instant::now() + Duration::from_secs(self.config.scan_report_wait_seconds);
        loop {
            match self.scans.report_summary(digest, scan_type).await {
                Ok(Some(summary)) => return Some(summary),
                Ok(None) => {}
                Err(e) => {
                    warn!(digest, error = %e, "Scan report lookup failed");
                    return None;
                }
            }
            if Instant::now() >= deadline {
                warn!(digest, "Scan report not ready before the deadline");
                return None;
            }
            sleep(SCAN_REPORT_POLL_INTERVAL).await;
        }
    }

    fn quota_data(&self, quota: &QuotaEvent, project: &ProjectInfo) -> EventPayloadData {
        let repository = if quota.repository.is_empty() {
            None
        } else {
            Some(self.repository(project, &quota.repository))
        };
        EventPayloadData {
            repository,
            custom: Some(HashMap::from([(
                "message".to_string(),
                quota.message.clone(),
            )])),
            ..EventPayloadData::default()
        }
    }

    fn chart_resources(&self, chart: &ChartEvent) -> Vec<Resource> {
        let host = self.ext_host();
        chart
            .versions
            .iter()
            .map(|version| Resource {
                digest: None,
                tag: Some(version.clone()),
                resource_url: format!(
                    "{host}/chartrepo/{}/charts/{}-{version}.tgz",
                    chart.project_name, chart.chart_name
                ),
                scan_overview: None,
            })
            .collect()
    }

    /// Walk task → execution → policy → registry and decide which side is
    /// the remote. A populated source registry means pull-based
    /// replication (remote → local); a populated destination registry
    /// means push-based.
    async fn replication_info(&self, event: &ReplicationEvent) -> AppResult<ReplicationInfo> {
        let task = self
            .replications
            .task(event.task_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("replication task {}", event.task_id)))?;
        let execution = self
            .replications
            .execution(task.execution_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("replication execution {}", task.execution_id))
            })?;
        let policy = self
            .replications
            .policy(execution.policy_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("replication policy {}", execution.policy_id))
            })?;

        let local_namespace = task.resource.split('/').next().unwrap_or_default().to_string();
        let local = |namespace: String| ReplicationResource {
            registry_name: None,
            registry_type: "harbor".to_string(),
            endpoint: self.config.ext_url.clone(),
            namespace,
        };

        let (src_resource, dest_resource) = if let Some(registry_id) = policy.src_registry_id {
            let registry = self
                .replications
                .registry(registry_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("registry {registry_id}")))?;
            let remote = ReplicationResource {
                registry_name: Some(registry.name),
                registry_type: registry.registry_type,
                endpoint: registry.url,
                namespace: local_namespace.clone(),
            };
            (Some(remote), Some(local(policy.dest_namespace.clone())))
        } else if let Some(registry_id) = policy.dest_registry_id {
            let registry = self
                .replications
                .registry(registry_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("registry {registry_id}")))?;
            let remote = ReplicationResource {
                registry_name: Some(registry.name),
                registry_type: registry.registry_type,
                endpoint: registry.url,
                namespace: policy.dest_namespace.clone(),
            };
            (Some(local(local_namespace)), Some(remote))
        } else {
            return Err(AppError::not_found(format!(
                "replication policy {} has no remote registry",
                policy.id
            )));
        };

        let artifact = ReplicationArtifact {
            kind: task.resource_type.clone(),
            status: task.status.clone(),
            name_and_tag: task.resource.clone(),
            fail_reason: task.fail_reason.clone(),
        };
        let succeeded = task.status == "Succeed";

        Ok(ReplicationInfo {
            job_status: task.status,
            description: policy.description,
            policy_creator: policy.creator,
            trigger_type: execution.trigger,
            execution_timestamp: execution.start_time.timestamp(),
            src_resource,
            dest_resource,
            successful_artifact: succeeded.then(|| vec![artifact.clone()]),
            failed_artifact: (!succeeded).then_some(vec![artifact]),
        })
    }

    async fn send_to_target(
        &self,
        event: &Event,
        payload: &Payload,
        policy_id: i64,
        project_id: i64,
        target: &Target,
    ) -> AppResult<()> {
        let format_name = match target.target_type {
            TargetType::Http => target.payload_format.as_str(),
            TargetType::Slack => "Slack",
            TargetType::Teams => "Teams",
        };
        let formatter = self.formatters.get(format_name)?;

        let hook_event = HookEvent {
            policy_id,
            project_id,
            event_type: event.topic.clone(),
            target: target.clone(),
            payload: payload.clone(),
            request_id: event.request_id.clone(),
        };
        let (mut headers, body) = formatter.format(&hook_event)?;
        if let Some(auth) = &target.auth_header {
            headers.insert("Authorization".to_string(), vec![auth.clone()]);
        }

        let job = delivery_job(
            target,
            policy_id,
            body,
            &headers,
            self.config.delivery_max_attempts,
        )?;
        self.sender.submit(job).await
    }
}

#[async_trait]
impl EventHandler for WebhookHandler {
    fn name(&self) -> &'static str {
        "WebhookHandler"
    }

    async fn handle(&self, event: &Event) -> AppResult<()> {
        if !self.settings.notification_enabled() {
            debug!(topic = %event.topic, "Webhook notification is disabled");
            return Ok(());
        }

        let Some(project) = self.resolve_project(event).await? else {
            warn!(topic = %event.topic, "Dropping event for unknown project");
            return Ok(());
        };

        let policies = self
            .policies
            .related_policies(project.project_id, &event.topic)
            .await?;
        if policies.is_empty() {
            debug!(topic = %event.topic, project = project.project_id, "No related policies");
            return Ok(());
        }

        let payload = self.build_payload(event, &project).await?;

        let mut failed = 0usize;
        let mut total = 0usize;
        for policy in &policies {
            for target in policy.targets.iter() {
                total += 1;
                if let Err(e) = self
                    .send_to_target(event, &payload, policy.id, project.project_id, target)
                    .await
                {
                    error!(
                        topic = %event.topic,
                        policy = policy.id,
                        address = %target.address,
                        error = %e,
                        "Hook delivery submission failed"
                    );
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(AppError::external(format!(
                "{failed} of {total} hook submissions failed for topic '{}'",
                event.topic
            )));
        }
        Ok(())
    }
}

fn retention_info(event: &RetentionEvent) -> RetentionInfo {
    let name_and_tag = event
        .deleted_artifacts
        .iter()
        .map(|(repository, reference)| format!("{repository}:{reference}"))
        .collect::<Vec<_>>()
        .join(", ");
    RetentionInfo {
        total: event.total,
        retained: event.retained,
        status: event.status.clone(),
        successful_artifact: vec![RetentionArtifact {
            kind: "image".to_string(),
            status: event.status.clone(),
            name_and_tag,
        }],
        retention_rules: event.rules.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use chrono::Utc;

    use moorage_core::config::audit::AuditConfig;
    use moorage_entity::job::model::CreateJob;
    use moorage_entity::policy::model::NotificationPolicy;
    use moorage_entity::policy::target::PayloadFormat;
    use sqlx::types::Json;

    use crate::replication::{
        RegistryInfo, ReplicationExecution, ReplicationPolicyInfo, ReplicationTask,
    };

    struct StaticProjects;

    #[async_trait]
    impl ProjectLookup for StaticProjects {
        async fn project(&self, project_id: i64) -> AppResult<Option<ProjectInfo>> {
            Ok((project_id == 1).then(|| ProjectInfo {
                project_id: 1,
                name: "library".into(),
                public: true,
                date_created: None,
            }))
        }

        async fn project_by_name(&self, name: &str) -> AppResult<Option<ProjectInfo>> {
            Ok((name == "library").then(|| ProjectInfo {
                project_id: 1,
                name: "library".into(),
                public: true,
                date_created: None,
            }))
        }
    }

    struct NoScanReports;

    #[async_trait]
    impl ScanReportLookup for NoScanReports {
        async fn report_summary(
            &self,
            _digest: &str,
            _scan_type: &str,
        ) -> AppResult<Option<serde_json::Value>> {
            Ok(None)
        }
    }

    struct StaticReplications;

    #[async_trait]
    impl ReplicationLookup for StaticReplications {
        async fn task(&self, task_id: i64) -> AppResult<Option<ReplicationTask>> {
            Ok(Some(ReplicationTask {
                id: task_id,
                execution_id: 10,
                status: "Succeed".into(),
                resource: "library/hello-world:v1.0".into(),
                resource_type: "artifact".into(),
                fail_reason: None,
            }))
        }

        async fn execution(&self, id: i64) -> AppResult<Option<ReplicationExecution>> {
            Ok(Some(ReplicationExecution {
                id,
                policy_id: 20,
                trigger: "manual".into(),
                start_time: Utc::now(),
            }))
        }

        async fn policy(&self, id: i64) -> AppResult<Option<ReplicationPolicyInfo>> {
            Ok(Some(ReplicationPolicyInfo {
                id,
                creator: Some("admin".into()),
                description: None,
                src_registry_id: Some(30),
                dest_registry_id: None,
                dest_namespace: "mirror".into(),
            }))
        }

        async fn registry(&self, id: i64) -> AppResult<Option<RegistryInfo>> {
            Ok(Some(RegistryInfo {
                id,
                name: "upstream".into(),
                registry_type: "docker-hub".into(),
                url: "https://hub.docker.com".into(),
            }))
        }
    }

    struct StaticPolicies {
        policies: Vec<NotificationPolicy>,
    }

    #[async_trait]
    impl PolicyProvider for StaticPolicies {
        async fn related_policies(
            &self,
            project_id: i64,
            topic: &str,
        ) -> AppResult<Vec<NotificationPolicy>> {
            Ok(self
                .policies
                .iter()
                .filter(|p| p.project_id == project_id && p.subscribes_to(topic))
                .cloned()
                .collect())
        }
    }

    struct CapturingSender {
        jobs: Mutex<Vec<CreateJob>>,
    }

    #[async_trait]
    impl HookSender for CapturingSender {
        async fn submit(&self, job: CreateJob) -> AppResult<()> {
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    fn policy(id: i64, topics: Vec<&str>, format: PayloadFormat) -> NotificationPolicy {
        NotificationPolicy {
            id,
            name: format!("policy-{id}"),
            project_id: 1,
            description: None,
            targets: Json(vec![Target {
                target_type: TargetType::Http,
                address: "http://sink/hook".into(),
                auth_header: Some("Bearer secret".into()),
                skip_cert_verify: false,
                payload_format: format,
            }]),
            event_types: Json(topics.into_iter().map(String::from).collect()),
            enabled: true,
            creator: None,
            creation_time: Utc::now(),
            update_time: Utc::now(),
        }
    }

    fn handler(
        policies: Vec<NotificationPolicy>,
        enabled: bool,
    ) -> (WebhookHandler, Arc<CapturingSender>) {
        let config = Arc::new(NotificationConfig {
            ext_url: "https://registry.example.com".into(),
            scan_report_wait_seconds: 0,
            ..NotificationConfig::default()
        });
        let settings = Arc::new(RuntimeSettings::from_config(&config, &AuditConfig::default()));
        settings.set_notification_enabled(enabled);
        let sender = Arc::new(CapturingSender {
            jobs: Mutex::new(Vec::new()),
        });
        let handler = WebhookHandler::new(
            settings,
            config,
            Arc::new(StaticProjects),
            Arc::new(NoScanReports),
            Arc::new(StaticReplications),
            Arc::new(StaticPolicies { policies }),
            Arc::new(FormatterRegistry::with_defaults()),
            sender.clone(),
        );
        (handler, sender)
    }

    fn push_event() -> Event {
        Event {
            topic: topic::PUSH_ARTIFACT.to_string(),
            occur_at: Utc::now(),
            operator: "admin".into(),
            request_id: Some("req-1".into()),
            data: EventData::ArtifactPushed(ArtifactEvent {
                project_id: 1,
                repository: "library/hello-world".into(),
                digest: "sha256:abc".into(),
                tags: vec!["v1.0".into()],
            }),
        }
    }

    #[tokio::test]
    async fn push_event_submits_one_webhook_job() {
        let (handler, sender) = handler(
            vec![policy(3, vec![topic::PUSH_ARTIFACT], PayloadFormat::Default)],
            true,
        );

        handler.handle(&push_event()).await.unwrap();

        let jobs = sender.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.kind, "Generic");
        assert_eq!(job.name, "WEBHOOK");
        assert_eq!(job.policy_id, Some(3));
        assert_eq!(job.parameters.address, "http://sink/hook");

        let payload = &job.parameters.payload;
        assert!(payload.contains("\"repo_full_name\":\"library/hello-world\""));
        assert!(payload.contains("\"tag\":\"v1.0\""));
        assert!(payload.contains("\"digest\":\"sha256:abc\""));
        assert!(payload.contains("\"repo_type\":\"public\""));
        assert!(payload.contains("\"operator\":\"admin\""));
        assert!(payload.contains(
            "\"resource_url\":\"registry.example.com/library/hello-world:v1.0\""
        ));

        let header: HashMap<String, Vec<String>> =
            serde_json::from_str(&job.parameters.header).unwrap();
        assert_eq!(
            header.get("Authorization"),
            Some(&vec!["Bearer secret".to_string()])
        );
    }

    #[tokio::test]
    async fn kill_switch_suppresses_deliveries() {
        let (handler, sender) = handler(
            vec![policy(3, vec![topic::PUSH_ARTIFACT], PayloadFormat::Default)],
            false,
        );

        handler.handle(&push_event()).await.unwrap();
        assert!(sender.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrelated_policies_do_not_fire() {
        let (handler, sender) = handler(
            vec![policy(3, vec![topic::DELETE_ARTIFACT], PayloadFormat::Default)],
            true,
        );

        handler.handle(&push_event()).await.unwrap();
        assert!(sender.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_event_ships_with_null_overview_when_report_is_late() {
        let (handler, sender) = handler(
            vec![policy(
                3,
                vec![topic::SCANNING_COMPLETED],
                PayloadFormat::Default,
            )],
            true,
        );

        let event = Event {
            topic: topic::SCANNING_COMPLETED.to_string(),
            occur_at: Utc::now(),
            operator: "auto".into(),
            request_id: None,
            data: EventData::Scan(ScanEvent {
                artifact: ArtifactEvent {
                    project_id: 1,
                    repository: "library/hello-world".into(),
                    digest: "sha256:abc".into(),
                    tags: vec!["v1.0".into()],
                },
                status: "Success".into(),
                scan_type: "vulnerability".into(),
            }),
        };
        handler.handle(&event).await.unwrap();

        let jobs = sender.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&jobs[0].parameters.payload).unwrap();
        let resource = &payload["event_data"]["resources"][0];
        assert!(resource.get("scan_overview").is_some());
        assert!(resource["scan_overview"].is_null());
    }

    #[tokio::test]
    async fn replication_event_places_the_remote_on_the_source_side() {
        let (handler, sender) = handler(
            vec![policy(3, vec![topic::REPLICATION], PayloadFormat::Default)],
            true,
        );

        let event = Event {
            topic: topic::REPLICATION.to_string(),
            occur_at: Utc::now(),
            operator: "auto".into(),
            request_id: None,
            data: EventData::Replication(ReplicationEvent {
                task_id: 42,
                status: "Succeed".into(),
            }),
        };
        handler.handle(&event).await.unwrap();

        let jobs = sender.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&jobs[0].parameters.payload).unwrap();
        let replication = &payload["event_data"]["replication"];
        assert_eq!(replication["src_resource"]["registry_name"], "upstream");
        assert_eq!(replication["dest_resource"]["namespace"], "mirror");
        assert_eq!(
            replication["successful_artifact"][0]["name_and_tag"],
            "library/hello-world:v1.0"
        );
        assert!(replication.get("failed_artifact").is_none());
    }
}
