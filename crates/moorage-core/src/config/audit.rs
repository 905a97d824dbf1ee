//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Audit logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Optional syslog-over-TCP endpoint (`host:port`) that audit records
    /// are mirrored to. Empty string disables forwarding.
    #[serde(default)]
    pub forward_endpoint: String,
    /// Suppress the database write while keeping the forward.
    #[serde(default)]
    pub skip_database: bool,
    /// Hard cap on the purge retention window, in hours.
    #[serde(default = "default_max_retention_hours")]
    pub max_retention_hours: i64,
    /// Event types (`operation_resourcetype`) excluded from audit logging.
    /// Empty list means everything is audited.
    #[serde(default)]
    pub disabled_event_types: Vec<String>,
    /// Retention window applied by the scheduled purge, in hours.
    /// `0` and `-1` disable the purge.
    #[serde(default)]
    pub purge_retention_hours: i64,
    /// Event types the scheduled purge deletes.
    #[serde(default)]
    pub purge_include_event_types: Vec<String>,
    /// Make the scheduled purge count candidates without deleting.
    #[serde(default)]
    pub purge_dry_run: bool,
}

fn default_max_retention_hours() -> i64 {
    // 30 years, same cap the purge job enforces.
    240_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            forward_endpoint: String::new(),
            skip_database: false,
            max_retention_hours: default_max_retention_hours(),
            disabled_event_types: Vec::new(),
            purge_retention_hours: 0,
            purge_include_event_types: Vec::new(),
            purge_dry_run: false,
        }
    }
}
