//! Note entity model
//!
//! Notes are user-authored free-text annotations on a lead, distinct from the
//! structured activity ledger. Creating a note also appends a `note`-type
//! activity row.

use super::lead::Entity as Lead;
use super::user::Entity as User;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Note entity: append-only free text authored by an agent on a lead
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Note)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    /// Unique identifier for the note (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Lead this note belongs to
    pub lead_id: Uuid,

    /// Authoring user; null if the user has since been removed
    pub user_id: Option<Uuid>,

    /// Note body
    pub content: String,

    /// Timestamp when the note was written
    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Lead",
        from = "Column::LeadId",
        to = "super::lead::Column::Id"
    )]
    Lead,
    #[sea_orm(
        belongs_to = "User",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<Lead> for Entity {
    fn to() -> RelationDef {
        Relation::Lead.def()
    }
}

impl Related<User> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
