//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::InMemoryDatabase;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_state(Arc::new(InMemoryDatabase::new()));
    api::create_app(state, get_metrics_handle())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_service_request(app: &axum::Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/servicerequest",
            json!({
                "buildingCode": "123",
                "description": "Turn up the heat!",
                "createdBy": "Aaron"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_service_request() {
    let app = setup();

    let json = create_service_request(&app).await;

    assert_eq!(json["buildingCode"], "123");
    assert_eq!(json["description"], "Turn up the heat!");
    assert_eq!(json["createdBy"], "Aaron");
    assert_eq!(json["currentStatus"], "Created");
    assert!(json["id"].as_str().is_some());
    assert_ne!(json["id"], "00000000-0000-0000-0000-000000000000");
}

#[tokio::test]
async fn test_create_with_missing_field_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/servicerequest",
            json!({ "buildingCode": "123", "createdBy": "Aaron" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_whitespace_only_fields_is_bad_request() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/servicerequest",
            json!({ "buildingCode": "   ", "description": "\t", "createdBy": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(empty_request("GET", "/api/servicerequest"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_create_with_oversized_fields_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/servicerequest",
            json!({
                "buildingCode": "1".repeat(33),
                "description": "d".repeat(257),
                "createdBy": "a".repeat(33)
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_empty_is_no_content() {
    let app = setup();

    let response = app
        .oneshot(empty_request("GET", "/api/servicerequest"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_list_returns_created() {
    let app = setup();
    let created = create_service_request(&app).await;

    let response = app
        .oneshot(empty_request("GET", "/api/servicerequest"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_get_by_id() {
    let app = setup();
    let created = create_service_request(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(empty_request("GET", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);
}

#[tokio::test]
async fn test_get_nonexistent_is_not_found() {
    let app = setup();
    let id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(empty_request("GET", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_format_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(empty_request("GET", "/api/servicerequest/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_service_request() {
    let app = setup();
    let created = create_service_request(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/servicerequest/{id}"),
            json!({
                "modifiedBy": "Aaron Jaeger",
                "description": "Now it's too hot!",
                "currentStatus": "InProgress"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["buildingCode"], "123");
    assert_eq!(json["description"], "Now it's too hot!");
    assert_eq!(json["currentStatus"], "InProgress");
    assert_eq!(json["lastModifiedBy"], "Aaron Jaeger");
    assert!(json["lastModifiedDate"].is_string());
}

#[tokio::test]
async fn test_update_with_out_of_range_status_changes_nothing() {
    let app = setup();
    let created = create_service_request(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/servicerequest/{id}"),
            json!({
                "modifiedBy": "Aaron Jaeger",
                "buildingCode": "456",
                "currentStatus": 45
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(empty_request("GET", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, created);
}

#[tokio::test]
async fn test_update_nonexistent_is_not_found() {
    let app = setup();
    let id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/servicerequest/{id}"),
            json!({ "modifiedBy": "Aaron Jaeger", "currentStatus": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = setup();
    let created = create_service_request(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_nonexistent_is_not_found() {
    let app = setup();
    let id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(empty_request("DELETE", &format!("/api/servicerequest/{id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_service_request(&app).await;

    let response = app.oneshot(empty_request("GET", "/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
