use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use noteverse::{
    api::router,
    blobs::EmbeddedBlobStore,
    clock::SystemClock,
    notify::ChangeNotifier,
    repository::ContentRepository,
    state::AppState,
    store::MemoryStore,
};
use futures::StreamExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup_app_with(store: Arc<MemoryStore>) -> Router {
    let repo = ContentRepository::new(
        store,
        ChangeNotifier::new(16),
        Arc::new(EmbeddedBlobStore),
        Arc::new(SystemClock),
    );
    router(AppState { repo })
}

fn setup_app() -> Router {
    setup_app_with(Arc::new(MemoryStore::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not json")
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = setup_app();
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_default_semesters() {
    let app = setup_app();
    let (status, body) = send(&app, "GET", "/semesters", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Semester 1", "Semester 2", "Semester 3", "Semester 4"]);
}

#[tokio::test]
async fn test_create_subject_and_announcement() {
    let app = setup_app();

    let (status, subject) = send(
        &app,
        "POST",
        "/semesters/sem1/subjects",
        Some(json!({ "name": "Thermodynamics" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subject["name"], "Thermodynamics");
    assert_eq!(subject["pdfs"], json!([]));

    let (_, announcement) = send(&app, "GET", "/announcement", None).await;
    assert!(announcement["text"].as_str().unwrap().contains("Thermodynamics"));
    assert!(announcement["lastUpdatedDate"].is_string());
}

#[tokio::test]
async fn test_validation_and_not_found_errors() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        "POST",
        "/semesters/sem1/subjects",
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("must not be empty"));

    let (status, _) = send(&app, "GET", "/semesters/sem42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/semesters/sem1/subjects/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_pdf_as_base64() {
    let app = setup_app();

    let (status, pdf) = send(
        &app,
        "POST",
        "/semesters/sem1/subjects/sem1-sub1/pdfs",
        Some(json!({
            "title": "Limits",
            "category": "note",
            "fileName": "limits.pdf",
            "data": "JVBERi0xLjQ="
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pdf["category"], "note");
    assert_eq!(pdf["url"], "data:application/pdf;base64,JVBERi0xLjQ=");

    let (status, _) = send(
        &app,
        "POST",
        "/semesters/sem1/subjects/sem1-sub1/pdfs",
        Some(json!({ "title": "Both", "category": "exam", "url": "https://x/y.pdf", "data": "JVBERi0xLjQ=" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, subject) = send(&app, "GET", "/semesters/sem1/subjects/sem1-sub1", None).await;
    assert_eq!(subject["pdfs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_edit_forbidden_after_permission_change() {
    let app = setup_app();

    let (status, user) = send(
        &app,
        "PATCH",
        "/users/admin/permissions",
        Some(json!({ "canChangeName": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["canChangeName"], false);

    let (status, _) = send(
        &app,
        "PATCH",
        "/users/admin/profile",
        Some(json!({ "name": "Root" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_round_trip() {
    let app = setup_app();

    let (_, nobody) = send(&app, "GET", "/session", None).await;
    assert_eq!(nobody, Value::Null);

    let (status, user) = send(&app, "POST", "/session", Some(json!({ "userId": "admin" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "admin");

    let (_, current) = send(&app, "GET", "/session", None).await;
    assert_eq!(current["id"], "admin");

    let (status, _) = send(&app, "DELETE", "/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unavailable_storage_is_503() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app_with(store.clone());
    store.disable();

    let (status, body) = send(&app, "GET", "/semesters", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Storage is unavailable");
}

#[tokio::test]
async fn test_events_stream_delivers_other_context_changes() {
    let app = setup_app();

    let request = Request::builder()
        .uri("/events?keys=semesters")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"), "{}", content_type);

    let (status, _) = send(
        &app,
        "POST",
        "/semesters/sem2/subjects",
        Some(json!({ "name": "Signals" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut frames = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(2), frames.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .expect("Failed to read frame");
    let text = String::from_utf8_lossy(&frame);
    assert!(text.contains("event: semesters"), "{}", text);
    assert!(text.contains("update-note-text"), "{}", text);
}
