//! Migration to create the lead_activities table.
//!
//! Activities are the append-only audit ledger of a lead. They cascade with
//! their lead and keep a nullable author so removing a user keeps the ledger.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeadActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeadActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeadActivities::LeadId).uuid().not_null())
                    .col(ColumnDef::new(LeadActivities::UserId).uuid().null())
                    .col(
                        ColumnDef::new(LeadActivities::ActivityType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeadActivities::Message).text().not_null())
                    .col(
                        ColumnDef::new(LeadActivities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_activities_lead_id")
                            .from(LeadActivities::Table, LeadActivities::LeadId)
                            .to(Leads::Table, Leads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_activities_user_id")
                            .from(LeadActivities::Table, LeadActivities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Ledger reads are per lead, newest first
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_lead_activities_lead_created ON lead_activities (lead_id, created_at DESC)".to_string(),
            ))
            .await?;

        // Same-day activity KPIs filter by author and created_at
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_lead_activities_user_created ON lead_activities (user_id, created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_lead_activities_lead_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_lead_activities_user_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LeadActivities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeadActivities {
    Table,
    Id,
    LeadId,
    UserId,
    ActivityType,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
