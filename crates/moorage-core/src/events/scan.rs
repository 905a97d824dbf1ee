//! Vulnerability scan domain events.

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactEvent;

/// A vulnerability scan changed state.
///
/// Scan events are system-triggered; their operator is always `"auto"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    /// The scanned artifact.
    pub artifact: ArtifactEvent,
    /// Raw scan status string from the scan controller
    /// (`"Success"`, `"Stopped"`, `"Error"`).
    pub status: String,
    /// Scan type identifier (e.g. `"vulnerability"`).
    pub scan_type: String,
}
