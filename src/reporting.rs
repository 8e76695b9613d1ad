//! # Aggregation and Reporting
//!
//! Read-side rollups behind the dashboards. Nothing here mutates; every
//! number is computed from the lead store and the activity ledger at request
//! time.

use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::lead::{Column, Entity as Lead, Model as LeadModel};
use crate::models::lead_activity::{ActivityType, Model as ActivityModel};
use crate::models::user::Model as UserModel;
use crate::models::{LeadSource, LeadStatus};
use crate::repositories::activity::{ActivityRepository, utc_day_start};
use crate::repositories::UserRepository;

/// Round a rate to 2 decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` over `whole`, 0 when the denominator is 0.
fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Pipeline-wide key figures.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GlobalKpis {
    pub total: u64,
    pub active: u64,
    pub closed: u64,
    pub lost: u64,
    /// closed over total, percent, 2 decimals
    pub conversion_rate: f64,
    pub leads_today: u64,
    pub activities_today: u64,
}

/// Rollup for one sales agent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentPerformance {
    pub agent_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub assigned: u64,
    pub active: u64,
    pub awaiting: u64,
    pub closed: u64,
    pub lost: u64,
    /// closed over assigned, percent, 2 decimals
    pub conversion_rate: f64,
    pub activities_today: u64,
}

/// Executive headline numbers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CeoSummary {
    pub total: u64,
    pub assigned: u64,
    pub unassigned: u64,
}

/// An agent's leads bucketed by pipeline stage.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageBuckets {
    pub assigned: Vec<LeadModel>,
    pub contacted: Vec<LeadModel>,
    pub awaiting: Vec<LeadModel>,
    pub closed: Vec<LeadModel>,
    pub lost: Vec<LeadModel>,
}

/// Everything the sales dashboard shows for one agent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesSnapshot {
    pub stages: StageBuckets,
    pub kpis: AgentPerformance,
    pub activities: Vec<ActivityModel>,
}

/// Combinable lead filters. Exact filters AND together; the text search is
/// itself an OR across name, email and phone.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub agent: Option<Uuid>,
    pub source: Option<LeadSource>,
    pub search: Option<String>,
}

/// Read-only report queries over leads and activities
pub struct Reports<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> Reports<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn count_status(&self, status: LeadStatus) -> Result<u64, RepositoryError> {
        let count = Lead::find()
            .filter(Column::Status.eq(status))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count)
    }

    /// Pipeline-wide KPIs for the admin dashboard
    pub async fn global_kpis(&self) -> Result<GlobalKpis, RepositoryError> {
        let total = Lead::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let closed = self.count_status(LeadStatus::Closed).await?;
        let lost = self.count_status(LeadStatus::Lost).await?;
        let active = total - closed - lost;

        let leads_today = Lead::find()
            .filter(Column::CreatedAt.gte(utc_day_start()))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let activities_today = ActivityRepository::new(self.db).count_today().await?;

        Ok(GlobalKpis {
            total,
            active,
            closed,
            lost,
            conversion_rate: rate(closed, total),
            leads_today,
            activities_today,
        })
    }

    async fn performance_for(&self, agent: &UserModel) -> Result<AgentPerformance, RepositoryError> {
        let base = || Lead::find().filter(Column::AssignedTo.eq(agent.id));

        let assigned = base()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let awaiting = base()
            .filter(Column::Status.eq(LeadStatus::Awaiting))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let closed = base()
            .filter(Column::Status.eq(LeadStatus::Closed))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let lost = base()
            .filter(Column::Status.eq(LeadStatus::Lost))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let activities_today = ActivityRepository::new(self.db)
            .count_today_for_user(agent.id)
            .await?;

        Ok(AgentPerformance {
            agent_id: agent.id,
            username: agent.username.clone(),
            display_name: agent.display_name.clone(),
            assigned,
            active: assigned - closed - lost,
            awaiting,
            closed,
            lost,
            conversion_rate: rate(closed, assigned),
            activities_today,
        })
    }

    /// Per-agent rollup over every user holding the sales-agent role
    pub async fn agent_performance(&self) -> Result<Vec<AgentPerformance>, RepositoryError> {
        let agents = UserRepository::new(self.db).list_sales_agents().await?;

        let mut rollups = Vec::with_capacity(agents.len());
        for agent in &agents {
            rollups.push(self.performance_for(agent).await?);
        }

        Ok(rollups)
    }

    /// Headline counts for the executive dashboard
    pub async fn ceo_summary(&self) -> Result<CeoSummary, RepositoryError> {
        let total = Lead::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let unassigned = Lead::find()
            .filter(Column::AssignedTo.is_null())
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(CeoSummary {
            total,
            assigned: total - unassigned,
            unassigned,
        })
    }

    /// One agent's dashboard: leads bucketed by stage, their KPIs, and their
    /// activity feed (newest first, optionally filtered by type).
    pub async fn sales_snapshot(
        &self,
        agent: &UserModel,
        activity_filter: Option<ActivityType>,
    ) -> Result<SalesSnapshot, RepositoryError> {
        let leads = Lead::find()
            .filter(Column::AssignedTo.eq(agent.id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let mut stages = StageBuckets {
            assigned: Vec::new(),
            contacted: Vec::new(),
            awaiting: Vec::new(),
            closed: Vec::new(),
            lost: Vec::new(),
        };
        for lead in leads {
            match lead.status {
                // Unassigned leads never carry this agent's id, so `new`
                // cannot occur here.
                LeadStatus::New | LeadStatus::Assigned => stages.assigned.push(lead),
                LeadStatus::Contacted => stages.contacted.push(lead),
                LeadStatus::Awaiting => stages.awaiting.push(lead),
                LeadStatus::Closed => stages.closed.push(lead),
                LeadStatus::Lost => stages.lost.push(lead),
            }
        }

        let kpis = self.performance_for(agent).await?;
        let activities = ActivityRepository::new(self.db)
            .list_for_user(agent.id, activity_filter)
            .await?;

        Ok(SalesSnapshot {
            stages,
            kpis,
            activities,
        })
    }

    /// Filtered lead listing for the admin dashboard, newest first
    pub async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<LeadModel>, RepositoryError> {
        let mut query = Lead::find();

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(agent) = filter.agent {
            query = query.filter(Column::AssignedTo.eq(agent));
        }
        if let Some(source) = filter.source {
            query = query.filter(Column::Source.eq(source));
        }
        if let Some(search) = filter.search.as_deref() {
            let search = search.trim();
            if !search.is_empty() {
                // LOWER(...) LIKE keeps the match case-insensitive on both
                // backends.
                let pattern = format!("%{}%", search.to_lowercase());
                query = query.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(Column::FullName)))
                                .like(pattern.clone()),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(Column::Email)))
                                .like(pattern.clone()),
                        )
                        .add(Expr::expr(Func::lower(Expr::col(Column::Phone))).like(pattern)),
                );
            }
        }

        let leads = query
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(leads)
    }

    /// Leads without an owner, newest first, for the assignment panel
    pub async fn unassigned_leads(&self) -> Result<Vec<LeadModel>, RepositoryError> {
        let leads = Lead::find()
            .filter(Column::AssignedTo.is_null())
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::models::lead;
    use crate::repositories::test_support::{seed_lead, seed_user, setup_db};
    use sea_orm::{ActiveModelTrait, Set};

    #[test]
    fn rates_round_and_never_fault() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(1, 3), 33.33);
        assert_eq!(rate(2, 3), 66.67);
        assert_eq!(rate(3, 3), 100.0);
    }

    #[tokio::test]
    async fn global_kpis_split_active_and_terminal() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;

        seed_lead(&db, "A", "+1", LeadStatus::New, None).await;
        seed_lead(&db, "B", "+2", LeadStatus::Contacted, Some(agent.id)).await;
        seed_lead(&db, "C", "+3", LeadStatus::Closed, Some(agent.id)).await;
        seed_lead(&db, "D", "+4", LeadStatus::Lost, Some(agent.id)).await;

        let kpis = Reports::new(&db).global_kpis().await.unwrap();

        assert_eq!(kpis.total, 4);
        assert_eq!(kpis.active, 2);
        assert_eq!(kpis.closed, 1);
        assert_eq!(kpis.lost, 1);
        assert_eq!(kpis.conversion_rate, 25.0);
        assert_eq!(kpis.leads_today, 4);
    }

    #[tokio::test]
    async fn empty_store_yields_zero_conversion() {
        let db = setup_db().await;
        let kpis = Reports::new(&db).global_kpis().await.unwrap();

        assert_eq!(kpis.total, 0);
        assert_eq!(kpis.conversion_rate, 0.0);
    }

    #[tokio::test]
    async fn agent_rollup_is_scoped_to_each_agent() {
        let db = setup_db().await;
        let alice = seed_user(&db, "alice", false, true, false).await;
        let bob = seed_user(&db, "bob", false, true, false).await;

        seed_lead(&db, "A", "+1", LeadStatus::Assigned, Some(alice.id)).await;
        seed_lead(&db, "B", "+2", LeadStatus::Closed, Some(alice.id)).await;
        seed_lead(&db, "C", "+3", LeadStatus::Awaiting, Some(bob.id)).await;

        let rollups = Reports::new(&db).agent_performance().await.unwrap();
        assert_eq!(rollups.len(), 2);

        let alice_rollup = &rollups[0];
        assert_eq!(alice_rollup.username, "alice");
        assert_eq!(alice_rollup.assigned, 2);
        assert_eq!(alice_rollup.closed, 1);
        assert_eq!(alice_rollup.conversion_rate, 50.0);

        let bob_rollup = &rollups[1];
        assert_eq!(bob_rollup.assigned, 1);
        assert_eq!(bob_rollup.awaiting, 1);
        assert_eq!(bob_rollup.conversion_rate, 0.0);
    }

    #[tokio::test]
    async fn ceo_summary_counts_ownership() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;

        seed_lead(&db, "A", "+1", LeadStatus::New, None).await;
        seed_lead(&db, "B", "+2", LeadStatus::Assigned, Some(agent.id)).await;
        seed_lead(&db, "C", "+3", LeadStatus::Closed, Some(agent.id)).await;

        let summary = Reports::new(&db).ceo_summary().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.assigned, 2);
        assert_eq!(summary.unassigned, 1);
    }

    #[tokio::test]
    async fn sales_snapshot_buckets_by_stage() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;
        let other = seed_user(&db, "other", false, true, false).await;

        seed_lead(&db, "A", "+1", LeadStatus::Assigned, Some(agent.id)).await;
        seed_lead(&db, "B", "+2", LeadStatus::Awaiting, Some(agent.id)).await;
        seed_lead(&db, "C", "+3", LeadStatus::Awaiting, Some(other.id)).await;

        let snapshot = Reports::new(&db)
            .sales_snapshot(&agent, None)
            .await
            .unwrap();

        assert_eq!(snapshot.stages.assigned.len(), 1);
        assert_eq!(snapshot.stages.awaiting.len(), 1);
        assert!(snapshot.stages.closed.is_empty());
        assert_eq!(snapshot.kpis.assigned, 2);
    }

    #[tokio::test]
    async fn filters_compose_with_and_semantics() {
        let db = setup_db().await;
        let alice = seed_user(&db, "alice", false, true, false).await;
        let bob = seed_user(&db, "bob", false, true, false).await;

        seed_lead(&db, "Ada Lovelace", "+1", LeadStatus::Awaiting, Some(alice.id)).await;
        seed_lead(&db, "Grace Hopper", "+2", LeadStatus::Awaiting, Some(bob.id)).await;
        seed_lead(&db, "Joan Clarke", "+3", LeadStatus::Closed, Some(alice.id)).await;

        let reports = Reports::new(&db);

        let filter = LeadFilter {
            status: Some(LeadStatus::Awaiting),
            agent: Some(alice.id),
            ..Default::default()
        };
        let leads = reports.list_leads(&filter).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let db = setup_db().await;

        let lead = seed_lead(&db, "Ada Lovelace", "+2348000000001", LeadStatus::New, None).await;
        let mut active: lead::ActiveModel = lead.into();
        active.email = Set(Some("ada@example.com".to_string()));
        active.update(&db).await.unwrap();
        seed_lead(&db, "Grace Hopper", "+2348000000002", LeadStatus::New, None).await;

        let reports = Reports::new(&db);

        let by_name = reports
            .list_leads(&LeadFilter {
                search: Some("LOVELACE".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_email = reports
            .list_leads(&LeadFilter {
                search: Some("ada@".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);

        let by_phone = reports
            .list_leads(&LeadFilter {
                search: Some("000002".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].full_name, "Grace Hopper");

        let nothing = reports
            .list_leads(&LeadFilter {
                search: Some("turing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn unassigned_listing_excludes_owned_leads() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;

        seed_lead(&db, "A", "+1", LeadStatus::New, None).await;
        seed_lead(&db, "B", "+2", LeadStatus::Assigned, Some(agent.id)).await;

        let leads = Reports::new(&db).unassigned_leads().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].full_name, "A");
    }

    #[tokio::test]
    async fn snapshot_activity_feed_respects_type_filter() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;
        let lead = seed_lead(&db, "Ada", "+1", LeadStatus::Assigned, Some(agent.id)).await;
        let principal = Principal::from(agent.clone());

        let repo = crate::repositories::LeadRepository::new(&db);
        repo.record_activity(lead.id, ActivityType::Call, "rang", None, &principal)
            .await
            .unwrap();
        repo.record_activity(lead.id, ActivityType::Email, "mailed", None, &principal)
            .await
            .unwrap();

        let snapshot = Reports::new(&db)
            .sales_snapshot(&agent, Some(ActivityType::Call))
            .await
            .unwrap();

        assert_eq!(snapshot.activities.len(), 1);
        assert_eq!(snapshot.activities[0].message, "rang");
    }
}
