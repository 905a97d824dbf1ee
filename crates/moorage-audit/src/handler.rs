//! The audit-log sink handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData};
use moorage_core::result::AppResult;
use moorage_core::settings::RuntimeSettings;
use moorage_database::repositories::audit::AuditRepository;
use moorage_entity::audit::{CreateAuditRecord, truncate_username};
use moorage_events::EventHandler;

use crate::forward::AuditForwarder;

/// The topics the audit sink subscribes to.
pub const AUDIT_TOPICS: &[&str] = &[
    topic::PUSH_ARTIFACT,
    topic::PULL_ARTIFACT,
    topic::DELETE_ARTIFACT,
    topic::CREATE_PROJECT,
    topic::DELETE_PROJECT,
    topic::DELETE_REPOSITORY,
    topic::CREATE_TAG,
    topic::DELETE_TAG,
    topic::COMMON_EVENT,
];

/// Where audit records are persisted. Separated out so the handler can be
/// exercised without a database.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist one audit record.
    async fn insert(&self, record: &CreateAuditRecord) -> AppResult<()>;
}

/// [`AuditStore`] backed by the `audit_log_ext` table.
pub struct DatabaseAuditStore {
    records: AuditRepository,
}

impl DatabaseAuditStore {
    /// Create a database-backed store.
    pub fn new(records: AuditRepository) -> Self {
        Self { records }
    }
}

#[async_trait]
impl AuditStore for DatabaseAuditStore {
    async fn insert(&self, record: &CreateAuditRecord) -> AppResult<()> {
        self.records.create(record).await?;
        Ok(())
    }
}

/// Turns auditable domain events into audit records: one INSERT per
/// event, plus an optional forward to the configured syslog endpoint.
pub struct AuditHandler {
    settings: Arc<RuntimeSettings>,
    store: Arc<dyn AuditStore>,
    forwarder: Arc<dyn AuditForwarder>,
}

impl AuditHandler {
    /// Create a new audit sink.
    pub fn new(
        settings: Arc<RuntimeSettings>,
        store: Arc<dyn AuditStore>,
        forwarder: Arc<dyn AuditForwarder>,
    ) -> Self {
        Self {
            settings,
            store,
            forwarder,
        }
    }
}

#[async_trait]
impl EventHandler for AuditHandler {
    fn name(&self) -> &'static str {
        "AuditHandler"
    }

    async fn handle(&self, event: &Event) -> AppResult<()> {
        let Some(record) = record_for(event) else {
            debug!(topic = %event.topic, "Event is not auditable");
            return Ok(());
        };
        if !self.settings.audit_event_enabled(&record.event_type()) {
            debug!(event_type = %record.event_type(), "Audit event type is disabled");
            return Ok(());
        }
        if !self.settings.skip_audit_database() {
            self.store.insert(&record).await?;
        }
        self.forwarder.forward(&record).await
    }
}

/// Map an event to its audit record, or `None` when the event is not
/// auditable.
fn record_for(event: &Event) -> Option<CreateAuditRecord> {
    let record = |project_id: i64, operation: &str, resource_type: &str, resource: String| {
        CreateAuditRecord {
            project_id,
            operation: operation.to_string(),
            resource_type: resource_type.to_string(),
            resource,
            username: truncate_username(&event.operator),
            op_desc: None,
            op_result: true,
            op_time: event.occur_at,
            payload: None,
        }
    };

    match &event.data {
        EventData::ArtifactPushed(a) => Some(record(
            a.project_id,
            "create",
            "artifact",
            format!("{}:{}", a.repository, a.reference()),
        )),
        EventData::ArtifactPulled(a) => {
            let mut rec = record(
                a.project_id,
                "pull",
                "artifact",
                format!("{}:{}", a.repository, a.reference()),
            );
            if rec.username.is_empty() {
                rec.username = "anonymous".to_string();
            }
            Some(rec)
        }
        EventData::ArtifactDeleted(a) => Some(record(
            a.project_id,
            "delete",
            "artifact",
            format!("{}:{}", a.repository, a.reference()),
        )),
        EventData::ProjectCreated(p) => {
            Some(record(p.project_id, "create", "project", p.name.clone()))
        }
        EventData::ProjectDeleted(p) => {
            Some(record(p.project_id, "delete", "project", p.name.clone()))
        }
        EventData::RepositoryDeleted(r) => {
            Some(record(r.project_id, "delete", "repository", r.name.clone()))
        }
        EventData::TagCreated(t) => Some(record(
            t.project_id,
            "create",
            "tag",
            format!("{}:{}", t.repository, t.tag),
        )),
        EventData::TagDeleted(t) => Some(record(
            t.project_id,
            "delete",
            "tag",
            format!("{}:{}", t.repository, t.tag),
        )),
        EventData::Common(c) => Some(CreateAuditRecord {
            project_id: c.project_id.unwrap_or(0),
            operation: c.operation.clone(),
            resource_type: c.resource_type.clone(),
            resource: c.resource_name.clone(),
            username: truncate_username(&c.operator),
            op_desc: Some(c.operation_description.clone()),
            op_result: c.is_successful,
            op_time: event.occur_at,
            payload: (!c.payload.is_empty()).then(|| c.payload.clone()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use chrono::Utc;

    use moorage_core::config::audit::AuditConfig;
    use moorage_core::config::notification::NotificationConfig;
    use moorage_core::events::ArtifactEvent;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<CreateAuditRecord>>,
    }

    #[async_trait]
    impl AuditStore for MemoryStore {
        async fn insert(&self, record: &CreateAuditRecord) -> AppResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryForwarder {
        records: Mutex<Vec<CreateAuditRecord>>,
    }

    #[async_trait]
    impl AuditForwarder for MemoryForwarder {
        async fn forward(&self, record: &CreateAuditRecord) -> AppResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn fixtures() -> (
        Arc<RuntimeSettings>,
        Arc<MemoryStore>,
        Arc<MemoryForwarder>,
        AuditHandler,
    ) {
        let settings = Arc::new(RuntimeSettings::from_config(
            &NotificationConfig::default(),
            &AuditConfig::default(),
        ));
        let store = Arc::new(MemoryStore::default());
        let forwarder = Arc::new(MemoryForwarder::default());
        let handler = AuditHandler::new(settings.clone(), store.clone(), forwarder.clone());
        (settings, store, forwarder, handler)
    }

    fn pull_event(operator: &str) -> Event {
        Event {
            topic: topic::PULL_ARTIFACT.to_string(),
            occur_at: Utc::now(),
            operator: operator.to_string(),
            request_id: None,
            data: EventData::ArtifactPulled(ArtifactEvent {
                project_id: 1,
                repository: "library/hello-world".into(),
                digest: "sha256:abc".into(),
                tags: vec!["v1.0".into()],
            }),
        }
    }

    #[tokio::test]
    async fn pull_produces_a_pull_artifact_record() {
        let (_, store, _, handler) = fixtures();
        handler.handle(&pull_event("alice")).await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "pull");
        assert_eq!(records[0].resource_type, "artifact");
        assert_eq!(records[0].resource, "library/hello-world:v1.0");
        assert_eq!(records[0].username, "alice");
        assert_eq!(records[0].event_type(), "pull_artifact");
    }

    #[tokio::test]
    async fn anonymous_pulls_are_attributed_to_anonymous() {
        let (_, store, _, handler) = fixtures();
        handler.handle(&pull_event("")).await.unwrap();
        assert_eq!(store.records.lock().unwrap()[0].username, "anonymous");
    }

    #[tokio::test]
    async fn disabled_event_types_are_not_audited() {
        let (settings, store, forwarder, handler) = fixtures();
        settings.set_disabled_audit_events(["pull_artifact".to_string()]);

        handler.handle(&pull_event("alice")).await.unwrap();
        assert!(store.records.lock().unwrap().is_empty());
        assert!(forwarder.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skip_database_keeps_the_forward() {
        let (settings, store, forwarder, handler) = fixtures();
        settings.set_skip_audit_database(true);

        handler.handle(&pull_event("alice")).await.unwrap();
        assert!(store.records.lock().unwrap().is_empty());
        assert_eq!(forwarder.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn long_usernames_are_truncated() {
        let (_, store, _, handler) = fixtures();
        handler.handle(&pull_event(&"x".repeat(300))).await.unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records[0].username.len(), 255);
        assert!(records[0].username.ends_with("..."));
    }

    #[tokio::test]
    async fn scan_events_are_not_auditable() {
        let (_, store, _, handler) = fixtures();
        let event = Event {
            topic: topic::SCANNING_COMPLETED.to_string(),
            occur_at: Utc::now(),
            operator: "auto".into(),
            request_id: None,
            data: EventData::Scan(moorage_core::events::ScanEvent {
                artifact: ArtifactEvent {
                    project_id: 1,
                    repository: "library/hello-world".into(),
                    digest: "sha256:abc".into(),
                    tags: vec![],
                },
                status: "Success".into(),
                scan_type: "vulnerability".into(),
            }),
        };
        handler.handle(&event).await.unwrap();
        assert!(store.records.lock().unwrap().is_empty());
    }
}
