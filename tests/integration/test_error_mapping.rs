//! End-to-end tests for the error-mapping middleware.
//!
//! Builds a small router whose handlers fail in each of the ways the mapper
//! classifies, and checks the rendered envelopes over `axum-test`.

use anyhow::Context;
use auth_service_api::routes::{ApiError, ApiRoutes, ValidatedJson};
use auth_service_api::services::{ErrorMapper, FixedClock};
use axum::{
    Json,
    extract::{Path, Query},
    http::{Method, StatusCode},
};
use axum_extra::extract::WithRejection;
use axum_test::TestServer;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Deserialize)]
struct NewUser {
    username: String,
    email: String,
}

#[derive(Deserialize)]
struct SearchParams {
    limit: u32,
}

async fn list_users() -> Json<Value> {
    Json(json!([{"id": 1, "username": "admin"}]))
}

async fn get_user(Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    if id == 1 {
        Ok(Json(json!({"id": 1, "username": "admin"})))
    } else {
        Err(ApiError::resource_not_found("User", "id", id))
    }
}

async fn search_users(Query(params): Query<SearchParams>) -> Json<Value> {
    Json(json!({"limit": params.limit, "users": []}))
}

async fn export_audit_log() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn create_user(
    WithRejection(Json(user), _): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut errors = Vec::new();
    if user.username.trim().is_empty() {
        errors.push(("username", "must not be blank"));
    }
    if !user.email.contains('@') {
        errors.push(("email", "must be a well-formed email address"));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_with_errors("Invalid user payload", errors));
    }
    Ok((StatusCode::CREATED, Json(json!({"username": user.username}))))
}

async fn current_tenant() -> String {
    let tenant: Option<String> = None;
    tenant.expect("tenant resolved from session")
}

async fn sync_directory() -> Result<Json<Value>, ApiError> {
    let size: u32 = "eleven"
        .parse()
        .context("parsing directory size reported by upstream")?;
    Ok(Json(json!({"synced": size})))
}

async fn login() -> Result<Json<Value>, ApiError> {
    Err(ApiError::bad_request("Missing Authorization header"))
}

fn create_test_server() -> TestServer {
    let now = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    let router = ApiRoutes::new()
        .route("/api/users", Method::GET, list_users)
        .route("/api/users", Method::POST, create_user)
        .route("/api/users/search", Method::GET, search_users)
        .route("/api/users/{id}", Method::GET, get_user)
        .route("/api/tenants/current", Method::GET, current_tenant)
        .route("/api/directory/sync", Method::POST, sync_directory)
        .route("/api/audit/export", Method::GET, export_audit_log)
        .route("/api/auth/login", Method::POST, login)
        .with_error_mapping(ErrorMapper::new(FixedClock(now)));
    TestServer::new(router).unwrap()
}

#[tokio::test]
async fn test_successful_requests_pass_through() {
    let server = create_test_server();

    let response = server.get("/api/users/1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], "admin");
}

#[tokio::test]
async fn test_missing_user_renders_not_found_envelope() {
    let server = create_test_server();

    let response = server.get("/api/users/42").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "title": "Resource Not Found",
            "message": "User not found with id: '42'",
            "path": "/api/users/42",
            "status": 404,
            "timestamp": "2025-01-15T10:30:00",
            "details": {
                "resourceName": "User",
                "fieldName": "id",
                "fieldValue": 42
            }
        })
    );
}

#[tokio::test]
async fn test_validation_failure_renders_field_errors() {
    let server = create_test_server();

    let response = server
        .post("/api/users")
        .json(&json!({"username": " ", "email": "not-an-email"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["title"], "Validation Error");
    assert_eq!(body["message"], "Invalid user payload");
    assert_eq!(
        body["details"]["validationErrors"],
        json!({
            "username": "must not be blank",
            "email": "must be a well-formed email address"
        })
    );
}

#[tokio::test]
async fn test_valid_payload_is_created() {
    let server = create_test_server();

    let response = server
        .post("/api/users")
        .json(&json!({"username": "maria", "email": "maria@example.com"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_json_rejection_renders_bad_request() {
    let server = create_test_server();

    let response = server.post("/api/users").text("username=maria").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["path"], "/api/users");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_explicit_bad_request() {
    let server = create_test_server();

    let response = server.post("/api/auth/login").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Missing Authorization header");
}

#[tokio::test]
async fn test_unsupported_method_renders_envelope() {
    let server = create_test_server();

    let response = server.patch("/api/users").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let body: Value = response.json();
    assert_eq!(body["status"], 405);
    assert_eq!(body["title"], "Method Not Allowed");
    assert_eq!(
        body["message"],
        "Method 'PATCH' is not supported for this request. Supported methods: GET, POST"
    );
    assert_eq!(body["path"], "/api/users");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_unsupported_method_on_parameterised_route() {
    let server = create_test_server();

    let response = server.delete("/api/users/42").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Method 'DELETE' is not supported for this request. Supported methods: GET"
    );
    assert_eq!(body["path"], "/api/users/42");
}

#[tokio::test]
async fn test_path_rejection_renders_bad_request() {
    let server = create_test_server();

    let response = server.get("/api/users/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.header("content-type"), "application/json");

    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "title": "Bad Request",
            "message": "Invalid URL: Cannot parse `abc` to a `i64`",
            "path": "/api/users/abc",
            "status": 400,
            "timestamp": "2025-01-15T10:30:00"
        })
    );
}

#[tokio::test]
async fn test_query_rejection_renders_bad_request() {
    let server = create_test_server();

    let response = server.get("/api/users/search").add_query_param("limit", "many").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["path"], "/api/users/search");
    assert!(body["message"].as_str().unwrap().contains("limit"));
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_bare_server_error_status_renders_internal_error() {
    let server = create_test_server();

    let response = server.get("/api/audit/export").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["title"], "Internal Server Error");
    assert_eq!(body["message"], "An internal server error occurred");
    assert_eq!(body["path"], "/api/audit/export");
}

#[tokio::test]
async fn test_unknown_route_renders_endpoint_not_found() {
    let server = create_test_server();

    let response = server.get("/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["title"], "Endpoint Not Found");
    assert_eq!(body["message"], "Endpoint 'GET /nope' not found");
    assert_eq!(body["path"], "/nope");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_panic_in_handler_renders_internal_error() {
    let server = create_test_server();

    let response = server.get("/api/tenants/current").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "title": "Internal Server Error",
            "message": "An internal server error occurred",
            "path": "/api/tenants/current",
            "status": 500,
            "timestamp": "2025-01-15T10:30:00"
        })
    );
    assert!(!response.text().contains("tenant resolved"));
}

#[tokio::test]
async fn test_unexpected_error_renders_internal_error() {
    let server = create_test_server();

    let response = server.post("/api/directory/sync").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let text = response.text();
    assert!(!text.contains("upstream"));
    assert!(!text.contains("invalid digit"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["message"], "An internal server error occurred");
}
