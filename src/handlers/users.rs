//! # User Administration Handlers
//!
//! Admin-only role management on the user store.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Json;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::server::AppState;

/// Role change direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleAction {
    Add,
    Remove,
}

/// Request payload for toggling the sales-agent role
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ToggleRoleRequestDto {
    pub action: RoleAction,
}

/// Response payload after a role change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleRoleResponseDto {
    pub user_id: Uuid,
    pub action: RoleAction,
    pub is_sales_agent: bool,
}

/// Grant or revoke the sales-agent role
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/role",
    params(("id" = Uuid, Path, description = "User UUID")),
    request_body = ToggleRoleRequestDto,
    responses(
        (status = 200, description = "Role updated", body = ToggleRoleResponseDto),
        (status = 401, description = "Missing or unknown actor", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn toggle_agent_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ToggleRoleRequestDto>,
) -> Result<Json<ToggleRoleResponseDto>, ApiError> {
    principal.require_admin()?;

    let enabled = matches!(request.action, RoleAction::Add);
    let user = UserRepository::new(&state.db)
        .set_sales_agent_role(user_id, enabled)
        .await?;

    tracing::info!(user_id = %user.id, action = ?request.action, "Sales agent role updated");

    Ok(Json(ToggleRoleResponseDto {
        user_id: user.id,
        action: request.action,
        is_sales_agent: user.is_sales_agent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{seed_user, setup_db};
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
    async fn admin_grants_and_revokes_the_role() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let user = seed_user(&db, "dave", false, false, false).await;
        let app = test_app(db);

        let uri = format!("/api/v1/users/{}/role", user.id);

        let response = app
            .clone()
            .oneshot(post(&uri, admin.id, json!({ "action": "add" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["is_sales_agent"], true);

        let response = app
            .oneshot(post(&uri, admin.id, json!({ "action": "remove" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["is_sales_agent"], false);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let db = setup_db().await;
        let agent = seed_user(&db, "agent", false, true, false).await;
        let user = seed_user(&db, "dave", false, false, false).await;
        let app = test_app(db);

        let response = app
            .oneshot(post(
                &format!("/api/v1/users/{}/role", user.id),
                agent.id,
                json!({ "action": "add" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let app = test_app(db);

        let response = app
            .oneshot(post(
                &format!("/api/v1/users/{}/role", Uuid::new_v4()),
                admin.id,
                json!({ "action": "add" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_action_fails_validation() {
        let db = setup_db().await;
        let admin = seed_user(&db, "admin", true, false, false).await;
        let user = seed_user(&db, "dave", false, false, false).await;
        let app = test_app(db);

        let response = app
            .oneshot(post(
                &format!("/api/v1/users/{}/role", user.id),
                admin.id,
                json!({ "action": "promote" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
