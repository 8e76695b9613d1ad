//! Lead entity model
//!
//! This module contains the SeaORM entity model for the leads table, plus the
//! closed `LeadStatus` and `LeadSource` enums. Representing these as tagged
//! enums keeps illegal pipeline values unrepresentable instead of merely
//! validated.

use super::user::Entity as User;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Pipeline stage of a lead.
///
/// The allowed movements between stages are defined in [`crate::lifecycle`];
/// this type only enumerates the states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "contacted")]
    Contacted,
    #[sea_orm(string_value = "awaiting")]
    Awaiting,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "lost")]
    Lost,
}

impl LeadStatus {
    /// Stable wire/database spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Assigned => "assigned",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Awaiting => "awaiting",
            LeadStatus::Closed => "closed",
            LeadStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intake channel a lead arrived through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    #[sea_orm(string_value = "whatsapp")]
    Whatsapp,
    #[sea_orm(string_value = "website")]
    Website,
    #[sea_orm(string_value = "manual")]
    Manual,
}

impl LeadSource {
    /// Parse a raw source string, falling back to `Manual` for anything
    /// unknown. Import rows use this so a bad source never fails a row.
    pub fn parse_or_manual(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => LeadSource::Whatsapp,
            "website" => LeadSource::Website,
            _ => LeadSource::Manual,
        }
    }
}

/// Lead entity representing a prospective customer in the sales pipeline
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Lead)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    /// Unique identifier for the lead (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Full name of the prospect (required, non-empty)
    pub full_name: String,

    /// Contact email, if known
    pub email: Option<String>,

    /// Contact phone number, unique across all leads
    pub phone: String,

    /// Intake channel the lead arrived through
    pub source: LeadSource,

    /// Current pipeline stage
    pub status: LeadStatus,

    /// Owning sales agent, if assigned
    pub assigned_to: Option<Uuid>,

    /// When the lead was last assigned to an agent
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub assigned_at: Option<DateTimeWithTimeZone>,

    /// When the lead was first contacted
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub contacted_at: Option<DateTimeWithTimeZone>,

    /// When the lead entered the awaiting list
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub awaiting_at: Option<DateTimeWithTimeZone>,

    /// When the lead left the pipeline (closed or lost)
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub closed_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the lead was created
    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the lead was last updated
    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::AssignedTo",
        to = "super::user::Column::Id"
    )]
    AssignedAgent,
    #[sea_orm(has_many = "super::lead_activity::Entity")]
    Activities,
    #[sea_orm(has_many = "super::note::Entity")]
    Notes,
}

impl Related<User> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedAgent.def()
    }
}

impl Related<super::lead_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
