//! Webhook notification configuration.

use serde::{Deserialize, Serialize};

/// Webhook notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Global kill switch. When false, webhook handlers return immediately.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Public base URL used when constructing externally visible resource
    /// URLs (e.g. `https://registry.example.com`).
    #[serde(default = "default_ext_url")]
    pub ext_url: String,
    /// Prefix prepended to robot account names in events.
    #[serde(default = "default_robot_prefix")]
    pub robot_prefix: String,
    /// Prefix prepended to role names in events.
    #[serde(default = "default_role_prefix")]
    pub role_prefix: String,
    /// How long to wait for a scan report before giving up, in seconds.
    #[serde(default = "default_scan_report_wait")]
    pub scan_report_wait_seconds: u64,
    /// Maximum delivery attempts per webhook job.
    #[serde(default = "default_max_attempts")]
    pub delivery_max_attempts: i32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ext_url: default_ext_url(),
            robot_prefix: default_robot_prefix(),
            role_prefix: default_role_prefix(),
            scan_report_wait_seconds: default_scan_report_wait(),
            delivery_max_attempts: default_max_attempts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ext_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_robot_prefix() -> String {
    "robot$".to_string()
}

fn default_role_prefix() -> String {
    "role$".to_string()
}

fn default_scan_report_wait() -> u64 {
    5
}

fn default_max_attempts() -> i32 {
    3
}
