//! Shared helpers for the integration tests.
//!
//! The `more-di` container creates its own `DatabaseConnection` and `Settings`, so tests hand
//! it their pool and settings through the process-global test overrides. Tests using these
//! helpers must be `#[serial]`.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chatbot_admin_api::api;
use chatbot_admin_api::core::password::hash_password;
use chatbot_admin_api::infrastructure::database::DatabaseConnection;
use chatbot_admin_api::infrastructure::settings::Settings;
use chatbot_admin_api::service_collection;
use chrono::{DateTime, Utc};
use di_axum::RouterServiceProviderExtensions;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

/// Fresh in-memory database with migrations applied, installed as the DI pool.
///
/// A single never-recycled connection keeps the in-memory database alive for the whole test.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    DatabaseConnection::set_test_pool(pool.clone());

    pool
}

/// Installs settings pointing the model gateway at `ollama_url`.
pub fn use_settings(ollama_url: &str) -> Settings {
    let settings = Settings {
        ollama_url: ollama_url.to_owned(),
        ollama_timeout_secs: 5,
        jwt_secret: "integration-test-secret".to_owned(),
        ..Settings::default()
    };
    Settings::set_test_settings(settings.clone());
    settings
}

pub fn cleanup() {
    DatabaseConnection::clear_test_pool();
    Settings::clear_test_settings();
}

pub fn create_test_app() -> Router {
    let provider = service_collection().build_provider().unwrap();

    api::router().with_provider(provider)
}

/// Sends one request through a fresh app and returns the status and JSON body.
pub async fn send(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(method, uri, body, &[]).await
}

pub async fn send_with_headers(
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = create_test_app().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

pub async fn insert_user(pool: &SqlitePool, email: &str, password: &str, active: bool) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, first_name, full_name, department, position, role, active, verified, onboarding_state, onboarding_progress) \
         VALUES (?, ?, ?, 'Ana', 'Ana Pérez', 'TI', 'Analista', 'empleado', ?, TRUE, 'en_progreso', 40)",
    )
    .bind(id)
    .bind(email)
    .bind(hash_password(password).unwrap())
    .bind(active)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn insert_faq(pool: &SqlitePool, question: &str, answer: &str) {
    sqlx::query("INSERT INTO faqs (id, question, answer) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4())
        .bind(question)
        .bind(answer)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_conversation(
    pool: &SqlitePool,
    user_id: &str,
    started_at: DateTime<Utc>,
    active: bool,
    satisfaction: Option<i64>,
    message_count: i64,
) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO conversations (id, user_id, started_at, last_message_at, active, resolved, satisfaction) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(started_at)
    .bind(started_at)
    .bind(active)
    .bind(satisfaction.is_some())
    .bind(satisfaction)
    .execute(pool)
    .await
    .unwrap();

    for position in 0..message_count {
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, position, kind, content, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(position)
        .bind(if position % 2 == 0 { 1 } else { 2 })
        .bind(format!("mensaje {position}"))
        .bind(started_at)
        .execute(pool)
        .await
        .unwrap();
    }

    id
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
