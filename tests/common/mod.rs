#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use tower_sessions::MemoryStore;

use rifa::api::middleware::session::{create_session_layer, AppState};
use rifa::config::Config;
use rifa::services::ledger::SlotLedger;

pub const ADMIN_PASS: &str = "test-admin-pass";

/// SQLite database in a temporary directory, removed on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("rifa.db").display());

    let pool = rifa::db::create_pool(&url)
        .await
        .expect("Failed to create test database");
    rifa::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    TestDb { pool, _dir: dir }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: "public".to_string(),
        slot_digits: 2,
        admin_pass: Secret::new(ADMIN_PASS.to_string()),
        session_hours: 8,
        secure_cookies: false,
    }
}

pub fn test_ledger(db: &TestDb) -> SlotLedger {
    SlotLedger::new(db.pool.clone(), 2)
}

pub fn test_app(db: &TestDb) -> Router {
    let config = test_config();
    let session_layer = create_session_layer(MemoryStore::default(), &config);
    let state = AppState::new(db.pool.clone(), config).expect("Failed to build state");

    rifa::api::router().layer(session_layer).with_state(state)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Logs in as administrator and returns the session cookie pair
pub async fn admin_cookie(app: &Router) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/login",
        Some(serde_json::json!({ "pass": ADMIN_PASS })),
        None,
    )
    .await;

    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Login should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}
