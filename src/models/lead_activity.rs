//! Lead activity entity model
//!
//! This module contains the SeaORM entity model for the lead_activities
//! table, the append-only audit ledger of actions taken on a lead.

use super::lead::Entity as Lead;
use super::user::Entity as User;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of action recorded in the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "call")]
    Call,
    #[sea_orm(string_value = "whatsapp")]
    Whatsapp,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "note")]
    Note,
    #[sea_orm(string_value = "status")]
    Status,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Call => "call",
            ActivityType::Whatsapp => "whatsapp",
            ActivityType::Email => "email",
            ActivityType::Note => "note",
            ActivityType::Status => "status",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity entity: one immutable ledger row describing an action on a lead.
///
/// Rows are only ever inserted, never updated or deleted on their own; they
/// cascade with their lead.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = LeadActivity)]
#[sea_orm(table_name = "lead_activities")]
pub struct Model {
    /// Unique identifier for the activity (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Lead this activity belongs to
    pub lead_id: Uuid,

    /// Acting user; null if the user has since been removed
    pub user_id: Option<Uuid>,

    /// Kind of action recorded
    pub activity_type: ActivityType,

    /// Free-text description of the action
    pub message: String,

    /// Timestamp when the activity was recorded
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
