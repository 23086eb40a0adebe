//! REST surface tests, mostly driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bpmn_collab::config::Config;
use bpmn_collab::db::{seed::seed_examples, DocumentStore, MemoryStore};
use bpmn_collab::routes::create_router;
use bpmn_collab::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, AppState) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let state = AppState::new(Config::default(), store);
    (create_router(state.clone()), state)
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_and_health() {
    let (app, _) = app();

    let (status, body) = call(app.clone(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "BPMN Collaborator API", "status": "running"}));

    let (status, body) = call(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_then_fetch_and_list() {
    let (app, _) = app();

    let (status, created) = call(
        app.clone(),
        post_json("/api/diagrams", json!({"name": "Onboarding", "initial_xml": "<x/>"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Onboarding");
    assert_eq!(created["xml"], "<x/>");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = call(app.clone(), get(&format!("/api/diagrams/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());
    assert_eq!(fetched["xml"], "<x/>");

    let (status, list) = call(app, get("/api/diagrams")).await;
    assert_eq!(status, StatusCode::OK);
    let diagrams = list["diagrams"].as_array().unwrap();
    assert_eq!(diagrams.len(), 1);
    assert_eq!(diagrams[0]["name"], "Onboarding");
    assert!(diagrams[0].get("xml").is_none());
}

#[tokio::test]
async fn created_without_body_gets_blank_diagram() {
    let (app, _) = app();
    let (status, created) =
        call(app, post_json("/api/diagrams", json!({"name": "Blank"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["xml"].as_str().unwrap().contains("bpmn2:definitions"));
}

#[tokio::test]
async fn invalid_names_are_rejected() {
    let (app, state) = app();

    let (status, body) = call(app.clone(), post_json("/api/diagrams", json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);

    let long = "x".repeat(201);
    let (status, _) = call(app, post_json("/api/diagrams", json!({"name": long}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(state.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_diagrams_and_routes_are_404() {
    let (app, _) = app();

    let (status, body) = call(
        app.clone(),
        get("/api/diagrams/6f1c1c8e-5a55-4d8a-9e52-3c0d5b1f6a10"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Diagram not found");

    let (status, _) = call(app.clone(), get("/api/diagrams/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(app, get("/no/such/route")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not Found"}));
}

#[tokio::test]
async fn diagnostics_reports_room_counters() {
    let (app, _) = app();
    let (status, body) = call(app, get("/api/diagnostics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_rooms"], 0);
    assert_eq!(body["n_conn"], 0);
    assert_eq!(body["n_locks"], 0);
}

#[tokio::test]
async fn seeded_examples_over_http() {
    let (app, state) = app();
    seed_examples(state.store.as_ref()).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let list: Value = reqwest::get(format!("http://{}/api/diagrams", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = list["diagrams"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Simple Approval Process"));
    assert!(names.contains(&"Multi-Step Request Workflow"));
}
