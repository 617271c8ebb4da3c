// crates/toolgate-mcp/tests/http_routes.rs
// ============================================================================
// Module: HTTP Route Tests
// Description: Axum routes exercised in-process with tower oneshot.
// ============================================================================
//! ## Overview
//! Validates `POST /rpc`, `GET /health`, and `GET /audit`, including caller
//! identity taken from headers.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;
use toolgate_mcp::build_router;

use crate::common::fixture;
use crate::common::rpc;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_rpc(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .header("x-user-id", "alice")
        .header("x-session-id", "s-42")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn rpc_call_records_header_identity() {
    let fixture = fixture(false);
    let app = build_router(fixture.server.handler().clone());

    let body =
        rpc(7, "tools/call", &json!({"name": "ping", "arguments": {}, "request_id": "http-1"}));
    let (status, response) = send(app.clone(), post_rpc(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], json!(7));
    assert_eq!(response["result"]["success"], json!(true));
    assert_eq!(response["result"]["output"], json!({"message": "ok"}));

    let (status, audit) = send(app, get("/audit?request_id=http-1&event_type=tool_call")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["count"], json!(1));
    assert_eq!(audit["events"][0]["user_id"], json!("alice"));
    assert_eq!(audit["events"][0]["session_id"], json!("s-42"));
}

#[tokio::test]
async fn health_route_reports_policy_version() {
    let fixture = fixture(false);
    let (status, health) = send(build_router(fixture.server.handler().clone()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["policy_version"], json!("v1"));
}

#[tokio::test]
async fn malformed_rpc_body_is_bad_request() {
    let fixture = fixture(false);
    let app = build_router(fixture.server.handler().clone());
    let (status, response) = send(app, post_rpc(b"{".to_vec())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], json!(-32600));
    assert_eq!(response["id"], Value::Null);
}

#[tokio::test]
async fn audit_route_rejects_bad_time_bounds() {
    let fixture = fixture(false);
    let app = build_router(fixture.server.handler().clone());
    let (status, body) = send(app, get("/audit?since=last-week")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("since must be RFC 3339"));
}
