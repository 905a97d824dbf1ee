//! Quota domain events.

use serde::{Deserialize, Serialize};

/// A project quota threshold was crossed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaEvent {
    /// The project whose quota was affected.
    pub project_id: i64,
    /// The project name.
    pub project_name: String,
    /// Full repository name involved in the violating operation, if any.
    pub repository: String,
    /// Human-readable description of the violation.
    pub message: String,
}
