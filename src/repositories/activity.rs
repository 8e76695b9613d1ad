//! # Activity Repository
//!
//! Read access to the append-only activity ledger plus the single insert
//! helper every mutation path shares. Ledger rows are never updated or
//! deleted here; consistency with status changes comes from appending inside
//! the caller's transaction.

use crate::error::RepositoryError;
use crate::models::lead_activity::{
    ActiveModel as ActivityActiveModel, ActivityType, Column, Entity as LeadActivity, Model,
};
use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Start of the current UTC day, for same-day KPI windows.
pub(crate) fn utc_day_start() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Append one ledger row. Runs on whatever connection the caller holds, so
/// transactional paths stay atomic with their status mutation.
pub(crate) async fn append<C: ConnectionTrait>(
    conn: &C,
    lead_id: Uuid,
    user_id: Option<Uuid>,
    activity_type: ActivityType,
    message: String,
) -> Result<Model, sea_orm::DbErr> {
    let activity = ActivityActiveModel {
        id: Set(Uuid::new_v4()),
        lead_id: Set(lead_id),
        user_id: Set(user_id),
        activity_type: Set(activity_type),
        message: Set(message),
        created_at: Set(Utc::now().into()),
    };

    activity.insert(conn).await
}

/// Repository for LeadActivity database operations
pub struct ActivityRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new ActivityRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Activities for a lead, newest first, optionally filtered by type
    pub async fn list_for_lead(
        &self,
        lead_id: Uuid,
        type_filter: Option<ActivityType>,
    ) -> Result<Vec<Model>, RepositoryError> {
        let mut query = LeadActivity::find().filter(Column::LeadId.eq(lead_id));

        if let Some(activity_type) = type_filter {
            query = query.filter(Column::ActivityType.eq(activity_type));
        }

        let activities = query
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(activities)
    }

    /// Activities recorded by a user, newest first, optionally filtered by
    /// type. Backs the sales dashboard activity feed.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        type_filter: Option<ActivityType>,
    ) -> Result<Vec<Model>, RepositoryError> {
        let mut query = LeadActivity::find().filter(Column::UserId.eq(user_id));

        if let Some(activity_type) = type_filter {
            query = query.filter(Column::ActivityType.eq(activity_type));
        }

        let activities = query
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(activities)
    }

    /// Count of all activities recorded since the start of the current UTC
    /// day
    pub async fn count_today(&self) -> Result<u64, RepositoryError> {
        let count = LeadActivity::find()
            .filter(Column::CreatedAt.gte(utc_day_start()))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count)
    }

    /// Count of activities a specific user recorded today (UTC)
    pub async fn count_today_for_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let count = LeadActivity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CreatedAt.gte(utc_day_start()))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count)
    }
}
