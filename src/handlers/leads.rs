//! # Lead Administration Handlers
//!
//! Admin-only endpoints: assigning leads to agents and bulk import.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Json;
use crate::auth::Principal;
use crate::error::{ApiError, validation_error};
use crate::import::{ImportSummary, LeadImportRow, import_rows};
use crate::models::LeadStatus;
use crate::repositories::{LeadRepository, UserRepository};
use crate::server::AppState;

/// Request payload for assigning a lead to a sales agent
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignLeadRequestDto {
    /// Lead to assign
    pub lead_id: Uuid,
    /// Receiving sales agent
    pub agent_id: Uuid,
}

/// Response payload for a completed assignment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignLeadResponseDto {
    /// Lead that was assigned
    pub lead_id: Uuid,
    /// Agent now owning the lead
    pub agent_id: Uuid,
    /// Display name of the owning agent
    pub agent_name: String,
    /// Stage after assignment (always `assigned`)
    pub status: LeadStatus,
}

/// Assign or reassign a lead to a sales agent
#[utoipa::path(
    post,
    path = "/api/v1/leads/assign",
    request_body = AssignLeadRequestDto,
    responses(
        (status = 200, description = "Lead assigned", body = AssignLeadResponseDto),
        (status = 400, description = "Assignee is not a sales agent", body = ApiError),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Lead or agent not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn assign_lead(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<AssignLeadRequestDto>,
) -> Result<Json<AssignLeadResponseDto>, ApiError> {
    principal.require_admin()?;

    let repo = LeadRepository::new(&state.db);
    let lead = repo
        .assign(request.lead_id, request.agent_id, &principal)
        .await?;

    let agent = UserRepository::new(&state.db)
        .require_user(request.agent_id)
        .await?;

    Ok(Json(AssignLeadResponseDto {
        lead_id: lead.id,
        agent_id: agent.id,
        agent_name: agent.display_name,
        status: lead.status,
    }))
}

/// Request payload for bulk lead import
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ImportLeadsRequestDto {
    /// Lead rows to ingest, processed in order
    pub rows: Vec<LeadImportRow>,
}

/// Import a batch of leads
#[utoipa::path(
    post,
    path = "/api/v1/leads/import",
    request_body = ImportLeadsRequestDto,
    responses(
        (status = 200, description = "Batch processed", body = ImportSummary),
        (status = 400, description = "Batch empty or too large", body = ApiError),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn import_leads(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<ImportLeadsRequestDto>,
) -> Result<Json<ImportSummary>, ApiError> {
    principal.require_admin()?;

    if request.rows.is_empty() {
        return Err(validation_error(
            "Import batch is empty",
            serde_json::json!({ "field": "rows" }),
        ));
    }

    let max_rows = state.config.import_max_rows;
    if request.rows.len() > max_rows {
        return Err(validation_error(
            "Import batch exceeds the row limit",
            serde_json::json!({
                "field": "rows",
                "max_rows": max_rows,
                "actual_rows": request.rows.len()
            }),
        ));
    }

    let summary = import_rows(&state.db, &request.rows).await?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{seed_lead, seed_user, setup_db};
    use crate::server::test_app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, actor: Uuid, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("X-Actor-Id", actor.to_string())
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn assignment_requires_admin() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;
        let lead = seed_lead(&db, "Ada", "+100", LeadStatus::New, None).await;
        let app = test_app(db);

        let request = post(
            "/api/v1/leads/assign",
            agent.id,
            json!({ "lead_id": lead.id, "agent_id": agent.id }),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn admin_assigns_a_lead() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let agent = seed_user(&db, "agent", false, true, false).await;
        let lead = seed_lead(&db, "Ada", "+100", LeadStatus::New, None).await;
        let app = test_app(db);

        let request = post(
            "/api/v1/leads/assign",
            admin.id,
            json!({ "lead_id": lead.id, "agent_id": agent.id }),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["lead_id"], lead.id.to_string());
        assert_eq!(body["agent_name"], "agent Display");
        assert_eq!(body["status"], "assigned");
    }

    #[tokio::test]
    async fn missing_actor_header_is_unauthorized() {
        let db = setup_db().await;
        let lead = seed_lead(&db, "Ada", "+100", LeadStatus::New, None).await;
        let app = test_app(db);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/leads/assign")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "lead_id": lead.id, "agent_id": Uuid::new_v4() }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn import_reports_per_row_errors() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        seed_lead(&db, "Existing", "+200", LeadStatus::New, None).await;
        let app = test_app(db);

        let request = post(
            "/api/v1/leads/import",
            admin.id,
            json!({
                "rows": [
                    { "full_name": "Ada", "phone": "+201", "source": "website" },
                    { "full_name": "Grace", "phone": "" },
                    { "full_name": "Joan", "phone": "+200" },
                    { "full_name": "Mary", "phone": "+202" },
                    { "full_name": "Jean", "phone": "+203" }
                ]
            }),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["created"], 3);
        assert_eq!(body["error_count"], 2);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let app = test_app(db);

        let request = post("/api/v1/leads/import", admin.id, json!({ "rows": [] }));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn unknown_body_fields_fail_validation() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let lead = seed_lead(&db, "Ada", "+100", LeadStatus::New, None).await;
        let app = test_app(db);

        let request = post(
            "/api/v1/leads/assign",
            admin.id,
            json!({ "lead_id": lead.id, "agent_id": Uuid::new_v4(), "force": true }),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
