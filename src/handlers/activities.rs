//! # Lead Interaction Handlers
//!
//! Owner-scoped endpoints on a single lead: contact confirmation, notes, and
//! the activity ledger. Every route resolves the lead through the visibility
//! rule, so non-owners receive 404 rather than a hint the lead exists.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Json;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::models::LeadStatus;
use crate::models::lead::Model as LeadModel;
use crate::models::lead_activity::{ActivityType, Model as ActivityModel};
use crate::models::note::Model as NoteModel;
use crate::repositories::{ActivityRepository, LeadRepository, NoteRepository};
use crate::server::AppState;

/// Mark a lead as contacted
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/contacted",
    params(("id" = Uuid, Path, description = "Lead UUID")),
    responses(
        (status = 200, description = "Lead marked contacted", body = LeadModel),
        (status = 400, description = "Lead is not in the assigned stage", body = ApiError),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 404, description = "Lead not found or not owned by the actor", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn mark_contacted(
    State(state): State<AppState>,
    principal: Principal,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<LeadModel>, ApiError> {
    let repo = LeadRepository::new(&state.db);
    let lead = repo.mark_contacted(lead_id, &principal).await?;

    Ok(Json(lead))
}

/// Request payload for adding a note to a lead
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddNoteRequestDto {
    /// Note body
    pub text: String,
}

/// Attach a note to a lead
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/notes",
    params(("id" = Uuid, Path, description = "Lead UUID")),
    request_body = AddNoteRequestDto,
    responses(
        (status = 201, description = "Note created", body = NoteModel),
        (status = 400, description = "Note body empty", body = ApiError),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 404, description = "Lead not found or not owned by the actor", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn add_note(
    State(state): State<AppState>,
    principal: Principal,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<AddNoteRequestDto>,
) -> Result<(axum::http::StatusCode, Json<NoteModel>), ApiError> {
    let repo = NoteRepository::new(&state.db);
    let note = repo.add_note(lead_id, &request.text, &principal).await?;

    Ok((axum::http::StatusCode::CREATED, Json(note)))
}

/// Request payload for logging an interaction with a lead
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LogActivityRequestDto {
    /// Kind of interaction
    pub activity_type: ActivityType,
    /// Free-text description of the interaction
    pub message: String,
    /// Optional stage to move the lead into in the same transaction
    #[serde(default)]
    pub new_stage: Option<LeadStatus>,
}

/// Response payload after logging an interaction
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogActivityResponseDto {
    /// Ledger row created for the interaction
    pub activity_id: Uuid,
    /// Lead stage after any requested transition
    pub lead_status: LeadStatus,
}

/// Log an interaction, optionally advancing the lead's stage
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/activities",
    params(("id" = Uuid, Path, description = "Lead UUID")),
    request_body = LogActivityRequestDto,
    responses(
        (status = 201, description = "Activity recorded", body = LogActivityResponseDto),
        (status = 400, description = "Empty message or illegal stage movement", body = ApiError),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 404, description = "Lead not found or not owned by the actor", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn log_activity(
    State(state): State<AppState>,
    principal: Principal,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<LogActivityRequestDto>,
) -> Result<(axum::http::StatusCode, Json<LogActivityResponseDto>), ApiError> {
    let repo = LeadRepository::new(&state.db);
    let (lead, activity) = repo
        .record_activity(
            lead_id,
            request.activity_type,
            &request.message,
            request.new_stage,
            &principal,
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(LogActivityResponseDto {
            activity_id: activity.id,
            lead_status: lead.status,
        }),
    ))
}

/// Query parameters for listing a lead's activities
#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    /// Restrict the listing to one activity type
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
}

/// List a lead's activities, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}/activities",
    params(
        ("id" = Uuid, Path, description = "Lead UUID"),
        ("type" = Option<ActivityType>, Query, description = "Restrict to one activity type")
    ),
    responses(
        (status = 200, description = "Activities newest first", body = Vec<ActivityModel>),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 404, description = "Lead not found or not owned by the actor", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    principal: Principal,
    Path(lead_id): Path<Uuid>,
    Query(query): Query<ActivityListQuery>,
) -> Result<Json<Vec<ActivityModel>>, ApiError> {
    // Visibility check first so non-owners cannot probe ledger existence.
    LeadRepository::new(&state.db)
        .require_visible(lead_id, &principal)
        .await?;

    let activities = ActivityRepository::new(&state.db)
        .list_for_lead(lead_id, query.activity_type)
        .await?;

    Ok(Json(activities))
}
