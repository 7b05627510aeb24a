use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tokio::sync::watch;

use sentinel_auth::router::build_router;
use sentinel_auth::state::AppState;
use sentinel_core::middleware::X_REQUEST_ID;

use crate::helpers::{codec, test_hasher};

/// Router over stores that are never reachable. Only paths that finish before
/// touching a store can succeed.
fn offline_server() -> (TestServer, watch::Sender<bool>) {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        codec: codec(),
        hasher: test_hasher(),
        totp_issuer: "Sentinel".to_owned(),
        request_timeout: Duration::from_secs(2),
        shutdown: shutdown_rx,
    };
    (TestServer::new(build_router(state)).unwrap(), shutdown_tx)
}

fn request_id() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

#[tokio::test]
async fn should_answer_healthz() {
    let (server, _shutdown) = offline_server();

    let response = server.get("/healthz").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_unready_stores() {
    let (server, _shutdown) = offline_server();

    let response = server.get("/readyz").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["ready"], false);
    assert_ne!(body["checks"]["database"], "ok");
    assert_ne!(body["checks"]["redis"], "ok");
}

#[tokio::test]
async fn should_reject_protected_route_without_token() {
    let (server, _shutdown) = offline_server();

    let response = server.get("/api/v1/auth/profile").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "UNAUTHORIZED");
    assert_eq!(body["message"], "unauthorized: missing authorization header");
}

#[tokio::test]
async fn should_reject_refresh_token_on_protected_route() {
    let (server, _shutdown) = offline_server();
    let refresh = codec().issue_refresh(1).unwrap();

    let response = server
        .post("/api/v1/auth/logout/all")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {refresh}")).unwrap(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "unauthorized: wrong token type");
}

#[tokio::test]
async fn should_treat_bad_token_as_anonymous_on_whoami() {
    let (server, _shutdown) = offline_server();

    let anonymous = server.get("/api/v1/auth/whoami").await;
    assert_eq!(anonymous.status_code(), StatusCode::OK);
    assert_eq!(anonymous.json::<Value>(), serde_json::json!({ "authenticated": false }));

    let garbage = server
        .get("/api/v1/auth/whoami")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        )
        .await;
    assert_eq!(garbage.status_code(), StatusCode::OK);
    assert_eq!(garbage.json::<Value>()["authenticated"], false);
}

#[tokio::test]
async fn should_assign_and_echo_request_id() {
    let (server, _shutdown) = offline_server();

    let assigned = server.get("/healthz").await;
    assert!(!assigned.header(request_id()).is_empty());

    let echoed = server
        .get("/healthz")
        .add_header(request_id(), HeaderValue::from_static("req-123"))
        .await;
    assert_eq!(echoed.header(request_id()), "req-123");
}

#[tokio::test]
async fn should_cancel_store_calls_after_shutdown() {
    let (server, shutdown) = offline_server();
    shutdown.send(true).unwrap();

    let response = server
        .post("/api/v1/auth/password/reset")
        .json(&serde_json::json!({ "email": "alice@example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["kind"], "CANCELLED");
}
