#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use api_ingress::{ApiIngress, ApiIngressConfig};
use db::{ConnectOpts, DbHandle};
use students::{config::StudentsConfig, Students};

/// Fresh in-memory SQLite database with migrations applied.
pub async fn test_db() -> DatabaseConnection {
    let handle = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    let conn = handle.sea();
    Students::migrate(&conn)
        .await
        .expect("Failed to run migrations");
    conn
}

/// Full HTTP stack (ingress middleware + fallback) over the real module.
pub fn app_for(conn: DatabaseConnection) -> Router {
    let students =
        Students::new(conn, StudentsConfig::default()).expect("Failed to build students module");
    ApiIngress::new(ApiIngressConfig::default())
        .build_router(students.register_rest(Router::new()))
        .expect("Failed to build router")
}

pub async fn test_app() -> Router {
    app_for(test_db().await)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
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

pub async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, "POST", uri, body).await
}

/// Create a student through the API and return its JSON record.
pub async fn create(app: &Router, name: &str, email: &str, age: Option<i32>) -> Value {
    let body = match age {
        Some(a) => serde_json::json!({ "name": name, "email": email, "age": a }),
        None => serde_json::json!({ "name": name, "email": email }),
    };
    let (status, json) = post(app, "/student", &body.to_string()).await;
    assert_eq!(status, StatusCode::OK, "create failed: {json}");
    json["data"].clone()
}

pub fn ages(data: &Value) -> Vec<i64> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|s| s["age"].as_i64().unwrap())
        .collect()
}
