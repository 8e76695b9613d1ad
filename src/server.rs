//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Leadpipe
//! CRM API.

use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::actor_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/leads/assign", post(handlers::leads::assign_lead))
        .route("/leads/import", post(handlers::leads::import_leads))
        .route(
            "/leads/{id}/contacted",
            post(handlers::activities::mark_contacted),
        )
        .route("/leads/{id}/notes", post(handlers::activities::add_note))
        .route(
            "/leads/{id}/activities",
            post(handlers::activities::log_activity).get(handlers::activities::list_activities),
        )
        .route(
            "/dashboards/admin",
            get(handlers::dashboards::admin_dashboard),
        )
        .route("/dashboards/ceo", get(handlers::dashboards::ceo_dashboard))
        .route(
            "/dashboards/sales",
            get(handlers::dashboards::sales_dashboard),
        )
        .route("/users/{id}/role", post(handlers::users::toggle_agent_role))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            actor_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let profile = config.profile.clone();
    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Router over an in-memory database for handler tests.
#[cfg(test)]
pub(crate) fn test_app(db: DatabaseConnection) -> Router {
    let state = AppState {
        config: Arc::new(AppConfig::default()),
        db,
    };
    create_app(state)
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::leads::assign_lead,
        crate::handlers::leads::import_leads,
        crate::handlers::activities::mark_contacted,
        crate::handlers::activities::add_note,
        crate::handlers::activities::log_activity,
        crate::handlers::activities::list_activities,
        crate::handlers::dashboards::admin_dashboard,
        crate::handlers::dashboards::ceo_dashboard,
        crate::handlers::dashboards::sales_dashboard,
        crate::handlers::users::toggle_agent_role,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::lead::Model,
            crate::models::lead::LeadStatus,
            crate::models::lead::LeadSource,
            crate::models::lead_activity::Model,
            crate::models::lead_activity::ActivityType,
            crate::models::note::Model,
            crate::error::ApiError,
            crate::import::LeadImportRow,
            crate::import::RowError,
            crate::import::ImportSummary,
            crate::reporting::GlobalKpis,
            crate::reporting::AgentPerformance,
            crate::reporting::CeoSummary,
            crate::reporting::StageBuckets,
            crate::reporting::SalesSnapshot,
            crate::handlers::HealthResponse,
            crate::handlers::leads::AssignLeadRequestDto,
            crate::handlers::leads::AssignLeadResponseDto,
            crate::handlers::leads::ImportLeadsRequestDto,
            crate::handlers::activities::AddNoteRequestDto,
            crate::handlers::activities::LogActivityRequestDto,
            crate::handlers::activities::LogActivityResponseDto,
            crate::handlers::dashboards::AdminDashboardDto,
            crate::handlers::users::RoleAction,
            crate::handlers::users::ToggleRoleRequestDto,
            crate::handlers::users::ToggleRoleResponseDto,
        )
    ),
    info(
        title = "Leadpipe CRM API",
        description = "API for lead pipeline management",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
