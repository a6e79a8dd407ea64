//! Integration tests for API endpoints.
//!
//! The router is driven in-process with `oneshot`. Most tests run against the
//! in-memory key-value store; a few use a temporary SQLite database or a mock
//! repository.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{AppError, DatabaseConfig};
use domain::{Argon2Hasher, IdentityScheme, UuidGenerator};
use gateway_lib::{config::GatewayConfig, routes::create_router, state::AppState};
use user_service_lib::infra::Database;
use user_service_lib::repository::kv::MemoryEngine;
use user_service_lib::repository::{KvUserStore, MockUserRepository, SqlUserStore, UserRepository};
use user_service_lib::service::UserManager;

// =============================================================================
// Helpers
// =============================================================================

fn app_with(repo: Arc<dyn UserRepository>) -> Router {
    let users = Arc::new(UserManager::new(
        repo,
        Arc::new(Argon2Hasher::insecure_fast()),
        Arc::new(UuidGenerator),
    ));
    create_router(AppState::new(users, GatewayConfig::default()))
}

fn memory_app() -> Router {
    app_with(Arc::new(KvUserStore::new(Arc::new(MemoryEngine::new()))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn john() -> Value {
    json!({
        "username": "johndoe",
        "password": "password",
        "firstName": "John",
        "lastName": "Doe"
    })
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_user_returns_201_without_secrets() {
    let app = memory_app();

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "johndoe");
    assert_eq!(body["name"], "John Doe");
    assert!(body["created_at"].as_i64().unwrap() > 0);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("email").is_none());
}

#[tokio::test]
async fn test_create_duplicate_user_returns_400_conflict() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, list) = send(&app, Method::GET, "/api/v1/users", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_short_password_names_field() {
    let app = memory_app();
    let mut input = john();
    input["password"] = json!("short");

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(input)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let details = body["error"]["details"].as_array().unwrap();
    assert_eq!(details[0]["field"], "password");
    assert!(!body.to_string().contains("short"));

    let (_, list) = send(&app, Method::GET, "/api/v1/users", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_email_on_username_store_is_rejected() {
    let app = memory_app();
    let mut input = john();
    input["email"] = json!("johndoe@example.com");

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(input)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|d| d["field"] == "email" && d["rule"] == "unsupported"));
}

#[tokio::test]
async fn test_create_malformed_json_returns_bad_request() {
    let app = memory_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_get_user_found_and_missing() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/users/johndoe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "John Doe");

    let (status, body) = send(&app, Method::GET, "/api/v1/users/nobody99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_users_filters_by_prefix() {
    let app = memory_app();
    for username in ["alice_1", "alice_2", "bobby_1"] {
        let mut input = john();
        input["username"] = json!(username);
        send(&app, Method::POST, "/api/v1/users", Some(input)).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(&app, Method::GET, "/api/v1/users?prefix=alice", None).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["alice_1", "alice_2"]);
}

// =============================================================================
// Update / delete
// =============================================================================

#[tokio::test]
async fn test_patch_user_updates_only_supplied_fields() {
    let app = memory_app();
    let (_, created) = send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/johndoe",
        Some(json!({ "name": "Jane Smith" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jane Smith");
    assert_eq!(body["created_at"], created["created_at"]);
}

#[tokio::test]
async fn test_patch_user_errors() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/nobody99",
        Some(json!({ "name": "Jane Smith" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/johndoe",
        Some(json!({ "name": "R2D2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_delete_user_then_404() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, body) = send(&app, Method::DELETE, "/api/v1/users/johndoe", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, "/api/v1/users/johndoe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/users/johndoe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Lists
// =============================================================================

#[tokio::test]
async fn test_user_lists_round_trip() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/johndoe/lists",
        Some(json!({ "name": "groceries" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "name": "groceries", "todoCount": 0 }));

    let (status, body) = send(&app, Method::GET, "/api/v1/users/johndoe/lists/groceries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "groceries");

    let (status, body) = send(&app, Method::GET, "/api/v1/users/johndoe/lists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, users) = send(&app, Method::GET, "/api/v1/users", None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_list_errors() {
    let app = memory_app();
    send(&app, Method::POST, "/api/v1/users", Some(john())).await;
    let chores = json!({ "name": "chores" });

    let (status, _) = send(&app, Method::POST, "/api/v1/users/nobody99/lists", Some(chores.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/v1/users/nobody99/lists", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::POST, "/api/v1/users/johndoe/lists", Some(chores.clone())).await;
    let (status, body) = send(&app, Method::POST, "/api/v1/users/johndoe/lists", Some(chores)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/johndoe/lists",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "name");

    let (status, _) = send(&app, Method::GET, "/api/v1/users/johndoe/lists/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// SQL backend
// =============================================================================

#[tokio::test]
async fn test_sqlite_backend_keys_by_generated_id() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("users.db").display()),
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&config).await.unwrap();
    let app = app_with(Arc::new(SqlUserStore::new(db.get_connection())));

    let input = json!({
        "email": "johndoe@example.com",
        "password": "password",
        "displayName": "John Doe"
    });
    let (status, created) = send(&app, Method::POST, "/api/v1/users", Some(input.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "johndoe@example.com");
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "John Doe");

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(input)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

// =============================================================================
// Health and docs
// =============================================================================

#[tokio::test]
async fn test_health_check_healthy() {
    let app = memory_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["identity"], "username");
}

#[tokio::test]
async fn test_health_check_reports_unavailable_store() {
    let mut repo = MockUserRepository::new();
    repo.expect_identity_scheme()
        .return_const(IdentityScheme::Email);
    repo.expect_ping()
        .returning(|| Err(AppError::storage("connection refused")));
    let app = app_with(Arc::new(repo));

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "STORAGE_ERROR");
}

#[tokio::test]
async fn test_storage_failure_returns_500() {
    let mut repo = MockUserRepository::new();
    repo.expect_list()
        .returning(|_| Err(AppError::storage("corrupt record at user/x")));
    let app = app_with(Arc::new(repo));

    let (status, body) = send(&app, Method::GET, "/api/v1/users", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
    assert!(!body.to_string().contains("user/x"));
}

#[tokio::test]
async fn test_openapi_document_lists_user_routes() {
    let app = memory_app();

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/v1/users").is_some());
    assert!(body["paths"].get("/api/v1/users/{id}").is_some());
    assert!(body["paths"].get("/api/v1/users/{id}/lists").is_some());
}
