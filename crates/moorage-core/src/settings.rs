//! Runtime-tunable settings shared between handlers.
//!
//! A subset of the configuration surface can change while the process is
//! running (the admin API reloads it). Handlers read these values on every
//! event instead of caching them at startup.

use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::audit::AuditConfig;
use crate::config::notification::NotificationConfig;

/// Shared handle over the runtime-changeable settings.
#[derive(Debug)]
pub struct RuntimeSettings {
    /// Global webhook kill switch.
    notification_enabled: AtomicBool,
    /// Suppress audit database writes.
    skip_audit_database: AtomicBool,
    /// Syslog forward endpoint; empty string means disabled.
    audit_forward_endpoint: RwLock<String>,
    /// Audit event types (`operation_resourcetype`, lowercase) that are
    /// switched off. Empty set means everything is audited.
    disabled_audit_events: RwLock<HashSet<String>>,
}

impl RuntimeSettings {
    /// Build the initial settings from configuration.
    pub fn from_config(notification: &NotificationConfig, audit: &AuditConfig) -> Self {
        Self {
            notification_enabled: AtomicBool::new(notification.enabled),
            skip_audit_database: AtomicBool::new(audit.skip_database),
            audit_forward_endpoint: RwLock::new(audit.forward_endpoint.clone()),
            disabled_audit_events: RwLock::new(
                audit
                    .disabled_event_types
                    .iter()
                    .map(|s| s.to_lowercase())
                    .collect(),
            ),
        }
    }

    /// Whether webhook notification is globally enabled.
    pub fn notification_enabled(&self) -> bool {
        self.notification_enabled.load(Ordering::Relaxed)
    }

    /// Flip the global webhook switch.
    pub fn set_notification_enabled(&self, enabled: bool) {
        self.notification_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether audit records skip the database write.
    pub fn skip_audit_database(&self) -> bool {
        self.skip_audit_database.load(Ordering::Relaxed)
    }

    /// Toggle suppression of audit database writes.
    pub fn set_skip_audit_database(&self, skip: bool) {
        self.skip_audit_database.store(skip, Ordering::Relaxed);
    }

    /// The current syslog forward endpoint, empty when disabled.
    pub fn audit_forward_endpoint(&self) -> String {
        self.audit_forward_endpoint
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Update the syslog forward endpoint.
    pub fn set_audit_forward_endpoint(&self, endpoint: impl Into<String>) {
        if let Ok(mut guard) = self.audit_forward_endpoint.write() {
            *guard = endpoint.into();
        }
    }

    /// Per-type fine-grained audit gate. `event_type` is the lowercase
    /// `operation_resourcetype` string (e.g. `"create_user"`).
    pub fn audit_event_enabled(&self, event_type: &str) -> bool {
        self.disabled_audit_events
            .read()
            .map(|set| !set.contains(event_type))
            .unwrap_or(true)
    }

    /// Replace the set of disabled audit event types.
    pub fn set_disabled_audit_events(&self, types: impl IntoIterator<Item = String>) {
        if let Ok(mut guard) = self.disabled_audit_events.write() {
            *guard = types.into_iter().map(|s| s.to_lowercase()).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RuntimeSettings {
        RuntimeSettings::from_config(
            &NotificationConfig {
                enabled: true,
                ext_url: "http://localhost".into(),
                robot_prefix: "robot$".into(),
                role_prefix: "role$".into(),
                scan_report_wait_seconds: 5,
                delivery_max_attempts: 3,
            },
            &AuditConfig::default(),
        )
    }

    #[test]
    fn audit_gate_defaults_open() {
        let s = settings();
        assert!(s.audit_event_enabled("create_user"));
        s.set_disabled_audit_events(vec!["create_user".to_string()]);
        assert!(!s.audit_event_enabled("create_user"));
        assert!(s.audit_event_enabled("delete_user"));
    }

    #[test]
    fn forward_endpoint_round_trip() {
        let s = settings();
        assert_eq!(s.audit_forward_endpoint(), "");
        s.set_audit_forward_endpoint("syslog.internal:514");
        assert_eq!(s.audit_forward_endpoint(), "syslog.internal:514");
    }
}
