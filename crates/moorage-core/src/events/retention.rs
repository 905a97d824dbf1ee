//! Tag retention domain events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tag retention run finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionEvent {
    /// The retention execution id.
    pub execution_id: i64,
    /// The project the retention policy belongs to.
    pub project_id: i64,
    /// Final run status (`"Success"`, `"Failed"`, `"Stopped"`).
    pub status: String,
    /// Total number of candidate artifacts considered.
    pub total: u64,
    /// Number of artifacts retained.
    pub retained: u64,
    /// Repository and reference of each deleted artifact,
    /// `("{namespace}/{image}", "{tag-or-digest}")`.
    pub deleted_artifacts: Vec<(String, String)>,
    /// The rules the run evaluated.
    pub rules: Vec<RetentionRule>,
}

/// A single retention rule descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionRule {
    /// Rule template identifier (e.g. `"latestPushedK"`).
    pub template: String,
    /// Template parameters.
    pub parameters: HashMap<String, serde_json::Value>,
    /// Tag selector expressions.
    pub tag_selectors: Vec<RetentionSelector>,
    /// Repository scope selector expressions.
    pub scope_selectors: HashMap<String, Vec<RetentionSelector>>,
}

/// A retention selector (kind + decoration + pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSelector {
    /// Selector kind (e.g. `"doublestar"`).
    pub kind: String,
    /// Decoration (e.g. `"matches"`, `"excludes"`).
    pub decoration: String,
    /// The selector pattern.
    pub pattern: String,
}
