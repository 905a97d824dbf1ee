//! Audit record repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;
use moorage_core::types::pagination::{PageRequest, PageResponse};
use moorage_entity::audit::model::{AuditRecord, CreateAuditRecord};

/// Repository for audit records in the `audit_log_ext` table.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an audit record by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<AuditRecord>> {
        sqlx::query_as::<_, AuditRecord>("SELECT * FROM audit_log_ext WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find audit record", e)
            })
    }

    /// Persist an audit record. The in-memory `payload` field is never
    /// written to the database.
    pub async fn create(&self, data: &CreateAuditRecord) -> AppResult<AuditRecord> {
        sqlx::query_as::<_, AuditRecord>(
            "INSERT INTO audit_log_ext \
             (project_id, operation, resource_type, resource, username, op_desc, op_result, op_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(data.project_id)
        .bind(&data.operation)
        .bind(&data.resource_type)
        .bind(&data.resource)
        .bind(&data.username)
        .bind(&data.op_desc)
        .bind(data.op_result)
        .bind(data.op_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create audit record", e))
    }

    /// Search the audit log with optional filters.
    pub async fn search(
        &self,
        project_id: Option<i64>,
        operation: Option<&str>,
        resource_type: Option<&str>,
        username: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditRecord>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if project_id.is_some() {
            conditions.push(format!("project_id = ${param_idx}"));
            param_idx += 1;
        }
        if operation.is_some() {
            conditions.push(format!("operation = ${param_idx}"));
            param_idx += 1;
        }
        if resource_type.is_some() {
            conditions.push(format!("resource_type = ${param_idx}"));
            param_idx += 1;
        }
        if username.is_some() {
            conditions.push(format!("username = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_log_ext {where_clause}");
        let select_sql = format!(
            "SELECT * FROM audit_log_ext {where_clause} ORDER BY op_time DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, AuditRecord>(&select_sql);

        if let Some(pid) = project_id {
            count_query = count_query.bind(pid);
            select_query = select_query.bind(pid);
        }
        if let Some(op) = operation {
            count_query = count_query.bind(op.to_string());
            select_query = select_query.bind(op.to_string());
        }
        if let Some(rt) = resource_type {
            count_query = count_query.bind(rt.to_string());
            select_query = select_query.bind(rt.to_string());
        }
        if let Some(u) = username {
            count_query = count_query.bind(u.to_string());
            select_query = select_query.bind(u.to_string());
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit records", e)
        })?;

        let records = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search audit log", e)
            })?;

        Ok(PageResponse::new(
            records,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Count records that a purge with the given cutoff and event types
    /// would delete, without deleting anything.
    pub async fn count_purge_candidates(
        &self,
        cutoff: DateTime<Utc>,
        event_types: &[String],
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log_ext \
             WHERE op_time < $1 AND lower(operation || '_' || resource_type) = ANY($2)",
        )
        .bind(cutoff)
        .bind(event_types)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count purge candidates", e)
        })?;
        Ok(count as u64)
    }

    /// Delete records older than the cutoff whose event type is in the
    /// given set. Event types are bound as an array parameter, never
    /// interpolated into the SQL text.
    pub async fn purge(&self, cutoff: DateTime<Utc>, event_types: &[String]) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM audit_log_ext \
             WHERE op_time < $1 AND lower(operation || '_' || resource_type) = ANY($2)",
        )
        .bind(cutoff)
        .bind(event_types)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge audit log", e))?;
        Ok(result.rows_affected())
    }
}
