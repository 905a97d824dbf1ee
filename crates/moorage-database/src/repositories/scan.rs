//! Read-only scan report lookups.

use sqlx::PgPool;

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;

/// Repository for vulnerability scan report summaries.
#[derive(Debug, Clone)]
pub struct ScanReportRepository {
    pool: PgPool,
}

impl ScanReportRepository {
    /// Create a new scan report repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The latest report summary for an artifact digest, if the scanner
    /// has persisted one.
    pub async fn find_summary(
        &self,
        digest: &str,
        scan_type: &str,
    ) -> AppResult<Option<serde_json::Value>> {
        sqlx::query_scalar(
            "SELECT summary FROM scan_report \
             WHERE digest = $1 AND scan_type = $2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(digest)
        .bind(scan_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find scan report", e))
    }
}
