//! User entity model
//!
//! Users back the externally authenticated principal. Only identity and role
//! flags live here; login and session handling belong to the surrounding
//! system.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity carrying the role flags the core authorizes against
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Name shown in dashboards and activity messages
    pub display_name: String,

    /// Admin capability: assign leads, import, manage roles
    pub is_admin: bool,

    /// Sales-agent role: owns and acts on assigned leads
    pub is_sales_agent: bool,

    /// CEO role: read-only executive summary
    pub is_ceo: bool,

    /// Timestamp when the user was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lead::Entity")]
    AssignedLeads,
}

impl Related<super::lead::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedLeads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
