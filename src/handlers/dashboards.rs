//! # Dashboard Handlers
//!
//! Role-gated read-only views: the admin pipeline overview, the executive
//! summary, and the per-agent sales dashboard.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Json;
use crate::auth::Principal;
use crate::error::{ApiError, validation_error};
use crate::models::lead::Model as LeadModel;
use crate::models::lead_activity::ActivityType;
use crate::models::{LeadSource, LeadStatus};
use crate::reporting::{
    AgentPerformance, CeoSummary, GlobalKpis, LeadFilter, Reports, SalesSnapshot,
};
use crate::repositories::UserRepository;
use crate::server::AppState;

/// Query parameters for the admin dashboard lead listing
#[derive(Debug, Default, Deserialize)]
pub struct AdminDashboardQuery {
    pub status: Option<LeadStatus>,
    pub agent: Option<Uuid>,
    pub source: Option<LeadSource>,
    pub search: Option<String>,
}

/// Admin dashboard payload
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardDto {
    pub kpis: GlobalKpis,
    pub agents: Vec<AgentPerformance>,
    pub leads: Vec<LeadModel>,
    pub unassigned: Vec<LeadModel>,
}

/// Admin pipeline overview with filterable lead listing
#[utoipa::path(
    get,
    path = "/api/v1/dashboards/admin",
    params(
        ("status" = Option<LeadStatus>, Query, description = "Exact stage filter"),
        ("agent" = Option<Uuid>, Query, description = "Exact owning-agent filter"),
        ("source" = Option<LeadSource>, Query, description = "Exact source filter"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on name, email or phone")
    ),
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardDto),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "dashboards"
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<AdminDashboardQuery>,
) -> Result<Json<AdminDashboardDto>, ApiError> {
    principal.require_admin()?;

    let reports = Reports::new(&state.db);
    let filter = LeadFilter {
        status: query.status,
        agent: query.agent,
        source: query.source,
        search: query.search,
    };

    let kpis = reports.global_kpis().await?;
    let agents = reports.agent_performance().await?;
    let leads = reports.list_leads(&filter).await?;
    let unassigned = reports.unassigned_leads().await?;

    Ok(Json(AdminDashboardDto {
        kpis,
        agents,
        leads,
        unassigned,
    }))
}

/// Executive summary
#[utoipa::path(
    get,
    path = "/api/v1/dashboards/ceo",
    responses(
        (status = 200, description = "Executive summary", body = CeoSummary),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "CEO access required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "dashboards"
)]
pub async fn ceo_dashboard(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CeoSummary>, ApiError> {
    principal.require_ceo()?;

    let summary = Reports::new(&state.db).ceo_summary().await?;

    Ok(Json(summary))
}

/// Query parameters for the sales dashboard
#[derive(Debug, Default, Deserialize)]
pub struct SalesDashboardQuery {
    /// Restrict the activity feed to one type
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    /// Admin-only: view another agent's dashboard
    pub agent_id: Option<Uuid>,
}

/// Per-agent sales dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboards/sales",
    params(
        ("type" = Option<ActivityType>, Query, description = "Restrict the activity feed to one type"),
        ("agent_id" = Option<Uuid>, Query, description = "Admin-only: inspect another agent")
    ),
    responses(
        (status = 200, description = "Sales dashboard", body = SalesSnapshot),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "Sales agent access required", body = ApiError),
        (status = 404, description = "Requested agent not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "dashboards"
)]
pub async fn sales_dashboard(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<SalesDashboardQuery>,
) -> Result<Json<SalesSnapshot>, ApiError> {
    principal.require_sales_agent()?;

    let users = UserRepository::new(&state.db);
    let agent = match query.agent_id {
        Some(agent_id) if agent_id != principal.id => {
            // Only admins may look over another agent's shoulder.
            principal.require_admin()?;
            let user = users.require_user(agent_id).await?;
            if !user.is_sales_agent {
                return Err(validation_error(
                    "Requested user is not a sales agent",
                    serde_json::json!({ "agent_id": agent_id }),
                ));
            }
            user
        }
        _ => users.require_user(principal.id).await?,
    };

    let snapshot = Reports::new(&state.db)
        .sales_snapshot(&agent, query.activity_type)
        .await?;

    Ok(Json(snapshot))
}
