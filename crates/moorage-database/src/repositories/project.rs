//! Read-only project lookups.
//!
//! Project lifecycle is owned by the wider registry; the notification
//! core only reads the `project` table to resolve event ownership and
//! visibility.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use moorage_core::error::{AppError, ErrorKind};
use moorage_core::result::AppResult;

/// One row of the `project` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    /// The project id.
    pub project_id: i64,
    /// The project name.
    pub name: String,
    /// Whether the project is publicly readable.
    pub public: bool,
    /// When the project was created.
    pub creation_time: DateTime<Utc>,
}

/// Repository for project lookups.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a project by id.
    pub async fn find_by_id(&self, project_id: i64) -> AppResult<Option<ProjectRow>> {
        sqlx::query_as::<_, ProjectRow>(
            "SELECT project_id, name, public, creation_time FROM project WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    /// Find a project by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<ProjectRow>> {
        sqlx::query_as::<_, ProjectRow>(
            "SELECT project_id, name, public, creation_time FROM project WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }
}

/// Repository for user display-name lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The username for a user id, when the account exists.
    pub async fn find_username(&self, user_id: i64) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT username FROM user_account WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}
