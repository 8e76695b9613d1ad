//! # User Repository
//!
//! Data access for the user store backing the authenticated principal:
//! lookups, the sales-agent roster, and role toggling.

use crate::error::RepositoryError;
use crate::models::user::{ActiveModel as UserActiveModel, Column, Entity as User, Model};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Repository for User database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a user by id
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<Model>, RepositoryError> {
        let user = User::find_by_id(user_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(user)
    }

    /// Fetch a user by id, failing with NotFound when absent
    pub async fn require_user(&self, user_id: Uuid) -> Result<Model, RepositoryError> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))
    }

    /// All users holding the sales-agent role, ordered by username
    pub async fn list_sales_agents(&self) -> Result<Vec<Model>, RepositoryError> {
        let agents = User::find()
            .filter(Column::IsSalesAgent.eq(true))
            .order_by_asc(Column::Username)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(agents)
    }

    /// Grant or revoke the sales-agent role on a user
    pub async fn set_sales_agent_role(
        &self,
        user_id: Uuid,
        enabled: bool,
    ) -> Result<Model, RepositoryError> {
        let user = self.require_user(user_id).await?;

        let mut active: UserActiveModel = user.into();
        active.is_sales_agent = Set(enabled);

        let updated = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(updated)
    }
}
