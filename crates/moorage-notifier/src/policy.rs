//! Notification policy service.

use async_trait::async_trait;
use validator::Validate;

use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::result::AppResult;
use moorage_core::types::pagination::{PageRequest, PageResponse};
use moorage_database::repositories::job::{JobRepository, PolicyLastTrigger};
use moorage_database::repositories::policy::PolicyRepository;
use moorage_entity::policy::model::{CreatePolicy, NotificationPolicy};

/// The subset of the policy store the webhook dispatcher needs. Separated
/// out so the dispatcher can be exercised without a database.
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    /// The enabled policies of a project that subscribe to a topic.
    async fn related_policies(
        &self,
        project_id: i64,
        topic: &str,
    ) -> AppResult<Vec<NotificationPolicy>>;
}

/// CRUD and matching for per-project notification policies.
pub struct PolicyService {
    policies: PolicyRepository,
    jobs: JobRepository,
}

impl PolicyService {
    /// Create a new policy service.
    pub fn new(policies: PolicyRepository, jobs: JobRepository) -> Self {
        Self { policies, jobs }
    }

    /// Create a policy after validating it.
    pub async fn create(&self, data: CreatePolicy) -> AppResult<NotificationPolicy> {
        self.validate(&data)?;
        if self
            .policies
            .find_by_name_and_project(&data.name, data.project_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "policy '{}' already exists in project {}",
                data.name, data.project_id
            )));
        }
        self.policies.create(&data).await
    }

    /// Update an existing policy.
    pub async fn update(&self, id: i64, data: CreatePolicy) -> AppResult<NotificationPolicy> {
        self.validate(&data)?;
        self.get(id).await?;
        self.policies.update(id, &data).await
    }

    /// Delete a policy.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.policies.delete(id).await? {
            return Err(AppError::not_found(format!("policy {id} not found")));
        }
        Ok(())
    }

    /// Fetch a policy by id.
    pub async fn get(&self, id: i64) -> AppResult<NotificationPolicy> {
        self.policies
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("policy {id} not found")))
    }

    /// Fetch a policy by name within a project.
    pub async fn get_by_name_and_project(
        &self,
        name: &str,
        project_id: i64,
    ) -> AppResult<Option<NotificationPolicy>> {
        self.policies.find_by_name_and_project(name, project_id).await
    }

    /// List a project's policies.
    pub async fn list(
        &self,
        project_id: i64,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationPolicy>> {
        self.policies.find_by_project(project_id, page).await
    }

    /// When each of a project's policies last produced a delivery job.
    pub async fn last_triggers(&self, project_id: i64) -> AppResult<Vec<PolicyLastTrigger>> {
        let policies = self.policies.find_enabled_by_project(project_id).await?;
        if policies.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = policies.iter().map(|p| p.id).collect();
        self.jobs.last_trigger_times(&ids).await
    }

    fn validate(&self, data: &CreatePolicy) -> AppResult<()> {
        data.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        for event_type in &data.event_types {
            if !topic::is_known(event_type) {
                return Err(AppError::validation(format!(
                    "unknown event type '{event_type}'"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyProvider for PolicyService {
    async fn related_policies(
        &self,
        project_id: i64,
        topic: &str,
    ) -> AppResult<Vec<NotificationPolicy>> {
        let enabled = self.policies.find_enabled_by_project(project_id).await?;
        Ok(enabled
            .into_iter()
            .filter(|p| p.subscribes_to(topic))
            .collect())
    }
}
