//! # Note Repository
//!
//! Free-form notes attached to a lead. Adding a note also appends a
//! note-type row to the activity ledger in the same transaction, so the
//! lead's timeline stays complete.

use crate::auth::Principal;
use crate::error::RepositoryError;
use crate::models::lead_activity::ActivityType;
use crate::models::note::{ActiveModel as NoteActiveModel, Column, Entity as Note, Model};
use crate::repositories::activity;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Repository for Note database operations
pub struct NoteRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NoteRepository<'a> {
    /// Create a new NoteRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach a note to a lead the actor can see, mirroring it into the
    /// activity ledger.
    pub async fn add_note(
        &self,
        lead_id: Uuid,
        content: &str,
        actor: &Principal,
    ) -> Result<Model, RepositoryError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RepositoryError::Validation(
                "Note content is required".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let lead = super::lead::find_visible(&txn, lead_id, actor).await?;

        let note = NoteActiveModel {
            id: Set(Uuid::new_v4()),
            lead_id: Set(lead.id),
            user_id: Set(Some(actor.id)),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let inserted = note
            .insert(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        activity::append(
            &txn,
            lead.id,
            Some(actor.id),
            ActivityType::Note,
            content.to_string(),
        )
        .await
        .map_err(RepositoryError::database_error)?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok(inserted)
    }

    /// Notes for a lead, newest first
    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        let notes = Note::find()
            .filter(Column::LeadId.eq(lead_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(notes)
    }
}
