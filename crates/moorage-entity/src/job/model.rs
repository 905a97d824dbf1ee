//! Job entity model.
//!
//! The delivery contract with the job service: a generic job named
//! `"WEBHOOK"`, `"SLACK"`, `"TEAMS"`, or `"AUDIT_PURGE"`, with the rendered
//! payload and target parameters as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

use super::status::JobStatus;

/// A background job row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job kind; always `"Generic"` for hook deliveries.
    pub kind: String,
    /// Job name (`"WEBHOOK"`, `"SLACK"`, `"TEAMS"`, `"AUDIT_PURGE"`).
    pub name: String,
    /// Job parameters (JSON column).
    pub parameters: Json<JobParameters>,
    /// The notification policy that produced the job, when applicable.
    pub policy_id: Option<i64>,
    /// Current job status.
    pub status: JobStatus,
    /// Error message on failure.
    pub status_message: Option<String>,
    /// Number of execution attempts so far.
    pub attempts: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// Worker that claimed the job.
    pub worker_id: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the job completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Parameters carried by a hook delivery job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobParameters {
    /// The rendered payload body.
    #[serde(default)]
    pub payload: String,
    /// The target URL.
    #[serde(default)]
    pub address: String,
    /// JSON-encoded header map (`name -> [values]`).
    #[serde(default)]
    pub header: String,
    /// Skip TLS certificate verification when delivering.
    #[serde(default)]
    pub skip_cert_verify: bool,
    /// Extra parameters for non-delivery jobs (e.g. purge settings).
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Data required to create a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job kind; `"Generic"` for hook deliveries.
    pub kind: String,
    /// Job name.
    pub name: String,
    /// Job parameters.
    pub parameters: JobParameters,
    /// The notification policy that produced the job, when applicable.
    pub policy_id: Option<i64>,
    /// Maximum retry attempts.
    pub max_attempts: i32,
}

impl Job {
    /// Check if the job can be retried after a transient failure.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }
}
