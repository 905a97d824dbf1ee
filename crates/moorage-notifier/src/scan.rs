//! Scan report lookup.

use async_trait::async_trait;

use moorage_core::result::AppResult;

/// Read-only access to scan report summaries.
///
/// The scan engine is outside the notification core; the dispatcher polls
/// this lookup for a short window after a scan event before shipping the
/// payload, because report persistence races with event publication.
#[async_trait]
pub trait ScanReportLookup: Send + Sync {
    /// The report summary for an artifact, or `None` while the report is
    /// not ready.
    async fn report_summary(
        &self,
        digest: &str,
        scan_type: &str,
    ) -> AppResult<Option<serde_json::Value>>;
}
