//! End-to-end pipeline tests: HTTP request → pending-event queue →
//! collector → bus → webhook dispatcher / audit sink, with the database
//! and outbound HTTP replaced by in-memory fakes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::Response;
use axum::routing::post;
use chrono::Utc;
use tower::ServiceExt;

use moorage_core::config::{AuditConfig, NotificationConfig};
use moorage_core::context::RequestContext;
use moorage_core::events::topic;
use moorage_core::result::AppResult;
use moorage_core::settings::RuntimeSettings;
use moorage_entity::audit::CreateAuditRecord;
use moorage_entity::job::model::CreateJob;
use moorage_entity::policy::model::NotificationPolicy;
use moorage_entity::policy::target::{PayloadFormat, Target, TargetType};
use moorage_events::EventBus;
use moorage_events::collector::{CollectorState, PendingEventQueue, collect_events};
use moorage_events::metadata::{PullArtifactMetadata, PushArtifactMetadata};
use moorage_notifier::WebhookHandler;
use moorage_notifier::dispatcher::WEBHOOK_TOPICS;
use moorage_notifier::formatter::FormatterRegistry;
use moorage_notifier::jobs::HookSender;
use moorage_notifier::policy::PolicyProvider;
use moorage_notifier::project::{ProjectInfo, ProjectLookup};
use moorage_notifier::replication::{
    RegistryInfo, ReplicationExecution, ReplicationLookup, ReplicationPolicyInfo, ReplicationTask,
};
use moorage_notifier::scan::ScanReportLookup;
use moorage_audit::{AUDIT_TOPICS, AuditForwarder, AuditHandler, AuditStore};
use sqlx::types::Json;

struct StaticProjects;

#[async_trait]
impl ProjectLookup for StaticProjects {
    async fn project(&self, project_id: i64) -> AppResult<Option<ProjectInfo>> {
        Ok(Some(ProjectInfo {
            project_id,
            name: "library".into(),
            public: true,
            date_created: Some(Utc::now()),
        }))
    }

    async fn project_by_name(&self, name: &str) -> AppResult<Option<ProjectInfo>> {
        Ok(Some(ProjectInfo {
            project_id: 1,
            name: name.to_string(),
            public: true,
            date_created: Some(Utc::now()),
        }))
    }
}

struct NoScans;

#[async_trait]
impl ScanReportLookup for NoScans {
    async fn report_summary(
        &self,
        _digest: &str,
        _scan_type: &str,
    ) -> AppResult<Option<serde_json::Value>> {
        Ok(None)
    }
}

struct NoReplications;

#[async_trait]
impl ReplicationLookup for NoReplications {
    async fn task(&self, _task_id: i64) -> AppResult<Option<ReplicationTask>> {
        Ok(None)
    }

    async fn execution(&self, _execution_id: i64) -> AppResult<Option<ReplicationExecution>> {
        Ok(None)
    }

    async fn policy(&self, _policy_id: i64) -> AppResult<Option<ReplicationPolicyInfo>> {
        Ok(None)
    }

    async fn registry(&self, _registry_id: i64) -> AppResult<Option<RegistryInfo>> {
        Ok(None)
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

#[derive(Default)]
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

#[derive(Default)]
struct MemoryAuditStore {
    records: Mutex<Vec<CreateAuditRecord>>,
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, record: &CreateAuditRecord) -> AppResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct NoopForwarder;

#[async_trait]
impl AuditForwarder for NoopForwarder {
    async fn forward(&self, _record: &CreateAuditRecord) -> AppResult<()> {
        Ok(())
    }
}

fn webhook_policy(id: i64, topics: Vec<&str>) -> NotificationPolicy {
    NotificationPolicy {
        id,
        name: format!("policy-{id}"),
        project_id: 1,
        description: None,
        targets: Json(vec![Target {
            target_type: TargetType::Http,
            address: "https://sink.example.com/hook".into(),
            auth_header: None,
            skip_cert_verify: false,
            payload_format: PayloadFormat::Default,
        }]),
        event_types: Json(topics.into_iter().map(String::from).collect()),
        enabled: true,
        creator: None,
        creation_time: Utc::now(),
        update_time: Utc::now(),
    }
}

fn settings() -> Arc<RuntimeSettings> {
    Arc::new(RuntimeSettings::from_config(
        &NotificationConfig::default(),
        &AuditConfig::default(),
    ))
}

fn subscribe_webhooks(bus: &EventBus, policies: Vec<NotificationPolicy>) -> Arc<CapturingSender> {
    let sender = Arc::new(CapturingSender::default());
    let handler = Arc::new(WebhookHandler::new(
        settings(),
        Arc::new(NotificationConfig::default()),
        Arc::new(StaticProjects),
        Arc::new(NoScans),
        Arc::new(NoReplications),
        Arc::new(StaticPolicies { policies }),
        Arc::new(FormatterRegistry::with_defaults()),
        sender.clone(),
    ));
    bus.subscribe_all(WEBHOOK_TOPICS, handler).unwrap();
    sender
}

fn subscribe_audit(bus: &EventBus) -> Arc<MemoryAuditStore> {
    let store = Arc::new(MemoryAuditStore::default());
    let handler = Arc::new(AuditHandler::new(
        settings(),
        store.clone(),
        Arc::new(NoopForwarder),
    ));
    bus.subscribe_all(AUDIT_TOPICS, handler).unwrap();
    store
}

async fn as_admin(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestContext::new("admin"));
    next.run(request).await
}

/// A router with one artifact-push route and the collector stack. The
/// handler queues events exactly the way a domain service would.
fn pipeline_app(bus: Arc<EventBus>, status: StatusCode, anonymous_pull: bool) -> Router {
    let handler = move |Extension(queue): Extension<Arc<PendingEventQueue>>| async move {
        if anonymous_pull {
            queue.push(Box::new(PullArtifactMetadata {
                project_id: 1,
                repository: "library/hello-world".into(),
                digest: "sha256:abc".into(),
                tags: vec!["v1.0".into()],
            }));
        } else {
            queue.push(Box::new(PushArtifactMetadata {
                project_id: 1,
                repository: "library/hello-world".into(),
                digest: "sha256:abc".into(),
                tags: vec!["v1.0".into()],
            }));
        }
        status
    };

    let collector_state = CollectorState {
        bus,
        notification: Arc::new(NotificationConfig::default()),
    };
    let router = Router::new()
        .route("/api/v1/artifacts", post(handler))
        .layer(from_fn_with_state(collector_state, collect_events));
    if anonymous_pull {
        router
    } else {
        router.layer(from_fn(as_admin))
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pipeline did not settle in time");
}

#[tokio::test]
async fn successful_push_produces_a_delivery_job() {
    let bus = Arc::new(EventBus::new());
    let sender = subscribe_webhooks(&bus, vec![webhook_policy(3, vec![topic::PUSH_ARTIFACT])]);
    let app = pipeline_app(bus, StatusCode::CREATED, false);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/artifacts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    wait_until(|| !sender.jobs.lock().unwrap().is_empty()).await;
    let jobs = sender.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, "Generic");
    assert_eq!(jobs[0].name, "WEBHOOK");
    assert_eq!(jobs[0].policy_id, Some(3));
    assert!(jobs[0].parameters.payload.contains("library/hello-world"));
    assert!(jobs[0].parameters.payload.contains("admin"));
}

#[tokio::test]
async fn failed_request_reaches_no_target() {
    let bus = Arc::new(EventBus::new());
    let sender = subscribe_webhooks(&bus, vec![webhook_policy(3, vec![topic::PUSH_ARTIFACT])]);
    let app = pipeline_app(bus, StatusCode::INTERNAL_SERVER_ERROR, false);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/artifacts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sender.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn policies_on_other_topics_stay_silent() {
    let bus = Arc::new(EventBus::new());
    let sender = subscribe_webhooks(&bus, vec![webhook_policy(4, vec![topic::DELETE_ARTIFACT])]);
    let app = pipeline_app(bus, StatusCode::CREATED, false);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/artifacts")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sender.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_pull_lands_in_the_audit_log() {
    let bus = Arc::new(EventBus::new());
    let store = subscribe_audit(&bus);
    let app = pipeline_app(bus, StatusCode::OK, true);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/artifacts")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    wait_until(|| !store.records.lock().unwrap().is_empty()).await;
    let records = store.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "pull");
    assert_eq!(records[0].resource_type, "artifact");
    assert_eq!(records[0].resource, "library/hello-world:v1.0");
    assert_eq!(records[0].username, "anonymous");
}
