//! Shared fixtures for repository and handler tests: an isolated in-memory
//! database with migrations applied, plus seed helpers.

use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::models::{LeadSource, LeadStatus, lead, user};

/// Fresh sqlite::memory: database with all migrations applied.
pub(crate) async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");

    db
}

pub(crate) async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    is_admin: bool,
    is_sales_agent: bool,
    is_ceo: bool,
) -> user::Model {
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        display_name: Set(format!("{} Display", username)),
        is_admin: Set(is_admin),
        is_sales_agent: Set(is_sales_agent),
        is_ceo: Set(is_ceo),
        created_at: Set(Utc::now().into()),
    };

    user.insert(db).await.expect("Failed to seed user")
}

pub(crate) async fn seed_lead(
    db: &DatabaseConnection,
    full_name: &str,
    phone: &str,
    status: LeadStatus,
    assigned_to: Option<Uuid>,
) -> lead::Model {
    let now = Utc::now();
    let lead = lead::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(full_name.to_string()),
        email: Set(None),
        phone: Set(phone.to_string()),
        source: Set(LeadSource::Manual),
        status: Set(status),
        assigned_to: Set(assigned_to),
        assigned_at: Set(assigned_to.map(|_| now.into())),
        contacted_at: Set(None),
        awaiting_at: Set(None),
        closed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    lead.insert(db).await.expect("Failed to seed lead")
}
