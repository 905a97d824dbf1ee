//! Database-backed user name resolution for common events.

use async_trait::async_trait;

use moorage_core::result::AppResult;
use moorage_database::repositories::project::UserRepository;

use super::registry::ResourceNameLookup;

/// [`ResourceNameLookup`] over the `user_account` table.
pub struct DatabaseUserNameLookup {
    users: UserRepository,
}

impl DatabaseUserNameLookup {
    /// Create a lookup backed by the given repository.
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl ResourceNameLookup for DatabaseUserNameLookup {
    async fn name_of(&self, id: i64) -> AppResult<Option<String>> {
        self.users.find_username(id).await
    }
}
