//! Chart domain events.

use serde::{Deserialize, Serialize};

/// A chart was uploaded, downloaded, or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEvent {
    /// The owning project name.
    pub project_name: String,
    /// The chart name.
    pub chart_name: String,
    /// The chart versions involved.
    pub versions: Vec<String>,
}
