//! Syslog-over-TCP audit record forwarding.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{info, warn};

use moorage_core::result::AppResult;
use moorage_core::settings::RuntimeSettings;
use moorage_entity::audit::CreateAuditRecord;

/// Wire form of a forwarded record. The field names are the parsing
/// contract with downstream syslog consumers and do not follow the
/// column names of the audit table.
#[derive(Debug, Serialize)]
struct ForwardedRecord<'a> {
    operator: &'a str,
    time: DateTime<Utc>,
    #[serde(rename = "resourceType")]
    resource_type: &'a str,
    action: &'a str,
    resource: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a str>,
}

impl<'a> From<&'a CreateAuditRecord> for ForwardedRecord<'a> {
    fn from(record: &'a CreateAuditRecord) -> Self {
        Self {
            operator: &record.username,
            time: record.op_time,
            resource_type: &record.resource_type,
            action: &record.operation,
            resource: &record.resource,
            payload: record.payload.as_deref(),
        }
    }
}

/// Mirrors audit records to an external sink.
#[async_trait]
pub trait AuditForwarder: Send + Sync {
    /// Forward one audit record. Forwarding is best-effort and must not
    /// fail the audit write.
    async fn forward(&self, record: &CreateAuditRecord) -> AppResult<()>;
}

struct Connection {
    endpoint: String,
    stream: TcpStream,
}

/// Forwards audit records as JSON lines over a raw TCP connection.
///
/// The connection is opened lazily on first use and reopened whenever the
/// configured endpoint changes at runtime. Both checks happen under one
/// mutex, so an endpoint change cannot race a concurrent forward into a
/// duplicate connection.
pub struct SyslogForwarder {
    settings: Arc<RuntimeSettings>,
    conn: Mutex<Option<Connection>>,
}

impl SyslogForwarder {
    /// Create a forwarder reading its endpoint from the runtime settings.
    pub fn new(settings: Arc<RuntimeSettings>) -> Self {
        Self {
            settings,
            conn: Mutex::new(None),
        }
    }

    async fn write_line(&self, endpoint: &str, line: &str) -> std::io::Result<()> {
        let mut guard = self.conn.lock().await;
        let stale = match guard.as_ref() {
            Some(conn) => conn.endpoint != endpoint,
            None => true,
        };
        if stale {
            let stream = TcpStream::connect(endpoint).await?;
            *guard = Some(Connection {
                endpoint: endpoint.to_string(),
                stream,
            });
        }
        // The connection is always Some here.
        if let Some(conn) = guard.as_mut() {
            let result = conn.stream.write_all(line.as_bytes()).await;
            if result.is_err() {
                *guard = None;
            }
            result?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuditForwarder for SyslogForwarder {
    async fn forward(&self, record: &CreateAuditRecord) -> AppResult<()> {
        let endpoint = self.settings.audit_forward_endpoint();
        if endpoint.is_empty() {
            return Ok(());
        }
        let mut line = serde_json::to_string(&ForwardedRecord::from(record))?;
        line.push('\n');
        if let Err(e) = self.write_line(&endpoint, &line).await {
            warn!(endpoint = %endpoint, error = %e, "Audit forward failed, logging locally");
            info!(target: "audit", record = %line.trim_end(), "Audit record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_line_uses_the_sink_field_names() {
        let record = CreateAuditRecord {
            project_id: 1,
            operation: "delete".into(),
            resource_type: "artifact".into(),
            resource: "library/hello-world:v1.0".into(),
            username: "admin".into(),
            op_desc: None,
            op_result: true,
            op_time: Utc::now(),
            payload: None,
        };

        let json: serde_json::Value =
            serde_json::to_value(ForwardedRecord::from(&record)).unwrap();
        assert_eq!(json["operator"], "admin");
        assert_eq!(json["action"], "delete");
        assert_eq!(json["resourceType"], "artifact");
        assert_eq!(json["resource"], "library/hello-world:v1.0");
        assert!(json.get("time").is_some());
        // Table column names must not leak into the wire line.
        assert!(json.get("operation").is_none());
        assert!(json.get("username").is_none());
        assert!(json.get("op_time").is_none());
    }
}
