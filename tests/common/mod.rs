//! Shared helpers for the integration tests
//!
//! Tests that go through the DI container are serialized because they share the global test
//! pool, see `DatabaseConnection::set_test_pool`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use di::Ref;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use studio_portal_api::infrastructure::database::DatabaseConnection;
use studio_portal_api::infrastructure::entities::Role;
use tower::ServiceExt;
use uuid::Uuid;

/// Counter for unique test database URIs
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Fresh in-memory database with migrations applied.
pub async fn test_pool() -> SqlitePool {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    // Shared cache so every pooled connection sees the same database
    let db_url = format!(
        "sqlite:file:portal-test-{}-{db_num}?mode=memory&cache=shared",
        std::process::id()
    );

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

/// File-backed database for tests that need real cross-connection locking.
///
/// Returns the database path so the caller can remove it with [`remove_file_db`].
pub async fn file_pool(max_connections: u32) -> (SqlitePool, PathBuf) {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "portal-test-{}-{db_num}.db",
        std::process::id()
    ));

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    (pool, path)
}

pub async fn remove_file_db(pool: SqlitePool, path: PathBuf) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

/// Like [`test_pool`], and makes the DI container use it.
pub async fn setup_test_db() -> SqlitePool {
    let pool = test_pool().await;
    DatabaseConnection::set_test_pool(pool.clone());
    pool
}

pub fn cleanup_test_db() {
    DatabaseConnection::clear_test_pool();
}

pub fn connection(pool: &SqlitePool) -> Ref<DatabaseConnection> {
    Ref::new(DatabaseConnection::from_pool(pool.clone()))
}

/// Test app, using the global test pool set by `setup_test_db()`
pub fn create_test_app() -> axum::Router {
    let provider = studio_portal_api::services().build_provider().unwrap();
    studio_portal_api::app(provider)
}

pub async fn insert_user(pool: &SqlitePool, role: Role, name: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(user_id)
        .bind(name)
        .bind(format!("{user_id}@example.com"))
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    user_id
}

pub async fn insert_project(pool: &SqlitePool, client_id: Uuid, name: &str) -> Uuid {
    let project_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO projects (id, name, status, client_id, manager_id, created_at) VALUES (?, ?, 'ACTIVE', ?, NULL, ?)",
    )
    .bind(project_id)
    .bind(name)
    .bind(client_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
    project_id
}

pub fn request(
    method: Method,
    uri: &str,
    session: Option<(Uuid, Role)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = session {
        builder = builder
            .header("X-User-ID", user_id.to_string())
            .header("X-User-Role", role.as_str());
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request to a fresh app and decodes the JSON response (Null for empty bodies).
pub async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = create_test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}
