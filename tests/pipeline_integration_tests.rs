//! End-to-end pipeline test: import, assignment, contact, stage progression
//! and dashboards, all through the HTTP surface.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use leadpipe::config::AppConfig;
use leadpipe::migration::{Migrator, MigratorTrait};
use leadpipe::models::user;
use leadpipe::server::{AppState, create_app};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (DatabaseConnection, axum::Router) {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");

    let state = AppState {
        config: Arc::new(AppConfig::default()),
        db: db.clone(),
    };

    (db.clone(), create_app(state))
}

async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    is_admin: bool,
    is_sales_agent: bool,
    is_ceo: bool,
) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        display_name: Set(username.to_string()),
        is_admin: Set(is_admin),
        is_sales_agent: Set(is_sales_agent),
        is_ceo: Set(is_ceo),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("Failed to seed user")
}

fn post(uri: &str, actor: Uuid, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Actor-Id", actor.to_string())
        .header("Content-Type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str, actor: Uuid) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Actor-Id", actor.to_string())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn lead_travels_the_whole_pipeline() {
    let (db, app) = setup().await;
    let admin = seed_user(&db, "admin", true, false, false).await;
    let agent = seed_user(&db, "agent", false, true, false).await;
    let ceo = seed_user(&db, "ceo", false, false, true).await;

    // Admin imports a small batch; one row has no phone.
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/leads/import",
            admin.id,
            Some(json!({
                "rows": [
                    { "full_name": "Ada Lovelace", "phone": "+2348000000001", "source": "website" },
                    { "full_name": "Broken Row", "phone": "" }
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["created"], 1);
    assert_eq!(summary["error_count"], 1);

    // The imported lead shows up as unassigned on the admin dashboard.
    let response = app
        .clone()
        .oneshot(get("/api/v1/dashboards/admin", admin.id))
        .await
        .unwrap();
    let dashboard = body_json(response).await;
    let lead_id = dashboard["unassigned"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(dashboard["unassigned"][0]["status"], "new");

    // Admin assigns it to the agent.
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/leads/assign",
            admin.id,
            Some(json!({ "lead_id": lead_id, "agent_id": agent.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The agent works the lead: contact, proposal, close.
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/contacted", lead_id),
            agent.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/activities", lead_id),
            agent.id,
            Some(json!({
                "activity_type": "whatsapp",
                "message": "Sent the proposal",
                "new_stage": "awaiting"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/activities", lead_id),
            agent.id,
            Some(json!({
                "activity_type": "call",
                "message": "Verbal agreement, deal closed",
                "new_stage": "closed"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["lead_status"], "closed");

    // The ledger tells the whole story, newest first.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/leads/{}/activities", lead_id), agent.id))
        .await
        .unwrap();
    let activities = body_json(response).await;
    let messages: Vec<String> = activities
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages.len(), 6);
    assert!(messages.contains(&"Lead assigned to agent".to_string()));
    assert!(messages.contains(&"Lead was contacted".to_string()));
    assert!(messages.contains(&"Stage changed from awaiting to closed".to_string()));

    // The close is visible in every dashboard.
    let response = app
        .clone()
        .oneshot(get("/api/v1/dashboards/admin", admin.id))
        .await
        .unwrap();
    let dashboard = body_json(response).await;
    assert_eq!(dashboard["kpis"]["closed"], 1);
    assert_eq!(dashboard["kpis"]["conversion_rate"], 100.0);
    assert_eq!(dashboard["agents"][0]["closed"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/v1/dashboards/ceo", ceo.id))
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["unassigned"], 0);

    let response = app
        .oneshot(get("/api/v1/dashboards/sales", agent.id))
        .await
        .unwrap();
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["stages"]["closed"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["kpis"]["conversion_rate"], 100.0);
}

#[tokio::test]
async fn terminal_leads_can_be_reassigned_but_not_advanced() {
    let (db, app) = setup().await;
    let admin = seed_user(&db, "admin", true, false, false).await;
    let alice = seed_user(&db, "alice", false, true, false).await;
    let bob = seed_user(&db, "bob", false, true, false).await;

    // Create and close a lead through the API.
    app.clone()
        .oneshot(post(
            "/api/v1/leads/import",
            admin.id,
            Some(json!({ "rows": [{ "full_name": "Ada", "phone": "+1" }] })),
        ))
        .await
        .unwrap();

    let dashboard = body_json(
        app.clone()
            .oneshot(get("/api/v1/dashboards/admin", admin.id))
            .await
            .unwrap(),
    )
    .await;
    let lead_id = dashboard["unassigned"][0]["id"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(post(
            "/api/v1/leads/assign",
            admin.id,
            Some(json!({ "lead_id": lead_id, "agent_id": alice.id })),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/contacted", lead_id),
            alice.id,
            None,
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/activities", lead_id),
            alice.id,
            Some(json!({ "activity_type": "email", "message": "proposal", "new_stage": "awaiting" })),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/activities", lead_id),
            alice.id,
            Some(json!({ "activity_type": "call", "message": "went cold", "new_stage": "lost" })),
        ))
        .await
        .unwrap();

    // The owner cannot resurrect a lost lead.
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/v1/leads/{}/contacted", lead_id),
            alice.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    // But the assignment engine can put it back in play with a new owner.
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/leads/assign",
            admin.id,
            Some(json!({ "lead_id": lead_id, "agent_id": bob.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "assigned");

    // Ownership moved: alice now gets 404 on her old lead.
    let response = app
        .oneshot(post(
            &format!("/api/v1/leads/{}/contacted", lead_id),
            alice.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
