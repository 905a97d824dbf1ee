//! Notification policy repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;
use moorage_core::types::pagination::{PageRequest, PageResponse};
use moorage_entity::policy::model::{CreatePolicy, NotificationPolicy};

/// Repository for per-project notification policies.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    pool: PgPool,
}

impl PolicyRepository {
    /// Create a new policy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a policy by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<NotificationPolicy>> {
        sqlx::query_as::<_, NotificationPolicy>("SELECT * FROM notification_policy WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find policy", e))
    }

    /// Find a policy by name within a project.
    pub async fn find_by_name_and_project(
        &self,
        name: &str,
        project_id: i64,
    ) -> AppResult<Option<NotificationPolicy>> {
        sqlx::query_as::<_, NotificationPolicy>(
            "SELECT * FROM notification_policy WHERE name = $1 AND project_id = $2",
        )
        .bind(name)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find policy", e))
    }

    /// List policies for a project with pagination.
    pub async fn find_by_project(
        &self,
        project_id: i64,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationPolicy>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_policy WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count policies", e)
                })?;

        let policies = sqlx::query_as::<_, NotificationPolicy>(
            "SELECT * FROM notification_policy WHERE project_id = $1 \
             ORDER BY creation_time DESC LIMIT $2 OFFSET $3",
        )
        .bind(project_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list policies", e))?;

        Ok(PageResponse::new(
            policies,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Fetch all enabled policies for a project. Topic matching happens in
    /// the service layer.
    pub async fn find_enabled_by_project(
        &self,
        project_id: i64,
    ) -> AppResult<Vec<NotificationPolicy>> {
        sqlx::query_as::<_, NotificationPolicy>(
            "SELECT * FROM notification_policy WHERE project_id = $1 AND enabled = TRUE",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list enabled policies", e)
        })
    }

    /// Create a new policy.
    pub async fn create(&self, data: &CreatePolicy) -> AppResult<NotificationPolicy> {
        sqlx::query_as::<_, NotificationPolicy>(
            "INSERT INTO notification_policy \
             (name, project_id, description, targets, event_types, enabled, creator) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.project_id)
        .bind(&data.description)
        .bind(Json(&data.targets))
        .bind(Json(&data.event_types))
        .bind(data.enabled)
        .bind(&data.creator)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create policy", e))
    }

    /// Update an existing policy.
    pub async fn update(&self, id: i64, data: &CreatePolicy) -> AppResult<NotificationPolicy> {
        sqlx::query_as::<_, NotificationPolicy>(
            "UPDATE notification_policy SET name = $2, description = $3, targets = $4, \
             event_types = $5, enabled = $6, update_time = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(Json(&data.targets))
        .bind(Json(&data.event_types))
        .bind(data.enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update policy", e))
    }

    /// Delete a policy.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notification_policy WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete policy", e))?;
        Ok(result.rows_affected() > 0)
    }
}
