// crates/toolgate-mcp/tests/rpc_methods.rs
// ============================================================================
// Module: JSON-RPC Method Tests
// Description: Method dispatch against a config-file backed runtime.
// ============================================================================
//! ## Overview
//! Covers tool listing, gated calls, audit queries, health, protocol errors,
//! and admin policy reload.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;
use toolgate_mcp::JsonRpcResponse;
use toolgate_mcp::RequestContext;

use crate::common::Fixture;
use crate::common::fixture;
use crate::common::rpc;
use crate::common::write_config;

async fn call(fixture: &Fixture, method: &str, params: &Value) -> (StatusCode, JsonRpcResponse) {
    fixture.server.handler().handle_bytes(&RequestContext::default(), &rpc(1, method, params)).await
}

async fn result(fixture: &Fixture, method: &str, params: &Value) -> Value {
    let (status, response) = call(fixture, method, params).await;
    assert_eq!(status, StatusCode::OK, "{}", serde_json::to_string(&response).unwrap());
    response.result.unwrap()
}

async fn error_code(fixture: &Fixture, method: &str, params: &Value) -> i64 {
    call(fixture, method, params).await.1.error.unwrap().code
}

// ============================================================================
// SECTION: Tools
// ============================================================================

#[tokio::test]
async fn tools_list_reports_policy_status() {
    let fixture = fixture(false);
    let listed = result(&fixture, "tools/list", &Value::Null).await;
    let tools = listed["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|tool| tool["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["answer", "echo", "ping", "search_docs", "summarize"]);
    let echo = tools.iter().find(|tool| tool["name"] == "echo").unwrap();
    assert_eq!(echo["allowed"], json!(true));
    assert_eq!(echo["timeout_seconds"], json!(5.0));
    let summarize = tools.iter().find(|tool| tool["name"] == "summarize").unwrap();
    assert_eq!(summarize["allowed"], json!(false));
    assert_eq!(listed["policy_version"], json!("v1"));
}

#[tokio::test]
async fn allowed_echo_returns_tool_result() {
    let fixture = fixture(false);
    let value = result(
        &fixture,
        "tools/call",
        &json!({"name": "echo", "arguments": {"text": "hi"}, "request_id": "req-1"}),
    )
    .await;
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["denied"], json!(false));
    assert_eq!(value["output"], json!("hi"));
    assert_eq!(value["request_id"], json!("req-1"));
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn unlisted_tool_is_denied_and_audited() {
    let fixture = fixture(false);
    let value = result(
        &fixture,
        "tools/call",
        &json!({"name": "shell_exec", "arguments": {"cmd": "ls"}, "request_id": "req-deny"}),
    )
    .await;
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["denied"], json!(true));
    assert_eq!(value["error"], json!("not allowed by security policy"));
    assert!(value.get("output").is_none());

    let audit = result(&fixture, "audit/query", &json!({"request_id": "req-deny"})).await;
    assert_eq!(audit["count"], json!(1));
    assert_eq!(audit["events"][0]["event_type"], json!("security_event"));
    assert_eq!(audit["events"][0]["outcome"], json!("denied"));
}

// ============================================================================
// SECTION: Protocol Errors
// ============================================================================

#[tokio::test]
async fn protocol_violations_map_to_error_codes() {
    let fixture = fixture(false);
    let handler = fixture.server.handler();
    let context = RequestContext::default();

    let bad_version = br#"{"jsonrpc":"1.0","id":1,"method":"health"}"#;
    let (status, response) = handler.handle_bytes(&context, bad_version).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error.unwrap().code, -32600);

    let (_, response) = handler.handle_bytes(&context, b"not json").await;
    assert_eq!(response.error.unwrap().code, -32600);

    assert_eq!(error_code(&fixture, "tools/delete", &Value::Null).await, -32601);
    assert_eq!(error_code(&fixture, "tools/call", &json!({"arguments": {}})).await, -32602);
    assert_eq!(
        error_code(&fixture, "tools/call", &json!({"name": "echo", "arguments": [1]})).await,
        -32602
    );
    assert_eq!(error_code(&fixture, "audit/query", &json!({"since": "yesterday"})).await, -32602);
}

#[tokio::test]
async fn oversize_body_is_rejected() {
    let fixture = fixture(false);
    let text = "x".repeat(4096);
    let body = rpc(1, "tools/call", &json!({"name": "echo", "arguments": {"text": text}}));
    let (status, response) =
        fixture.server.handler().handle_bytes(&RequestContext::default(), &body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.error.unwrap().code, -32070);
}

#[tokio::test]
async fn reused_request_id_is_invalid_params() {
    let fixture = fixture(false);
    let params = json!({"name": "echo", "arguments": {"text": "hi"}, "request_id": "req-dup"});
    let first = result(&fixture, "tools/call", &params).await;
    assert_eq!(first["success"], json!(true));

    let (status, response) = call(&fixture, "tools/call", &params).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "duplicate request_id: req-dup");

    let events = result(&fixture, "audit/query", &json!({"request_id": "req-dup", "event_type": "tool_call"})).await;
    assert_eq!(events["count"], json!(1));
}

// ============================================================================
// SECTION: Health and Admin
// ============================================================================

#[tokio::test]
async fn health_reports_policy_identity() {
    let fixture = fixture(false);
    let health = result(&fixture, "health", &Value::Null).await;
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["policy_version"], json!("v1"));
    assert_eq!(health["policy_digest"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn policy_reload_requires_admin() {
    let fixture = fixture(false);
    assert_eq!(error_code(&fixture, "admin/policy_reload", &Value::Null).await, -32003);
}

#[tokio::test]
async fn policy_reload_swaps_the_table() {
    let fixture = fixture(true);
    let before = result(&fixture, "health", &Value::Null).await;
    write_config(&fixture.config_path, &fixture.dir.path().join("audit"), "v2", false, true);

    let reloaded = result(&fixture, "admin/policy_reload", &Value::Null).await;
    assert_eq!(reloaded["previous_version"], json!("v1"));
    assert_eq!(reloaded["policy_version"], json!("v2"));

    let after = result(&fixture, "health", &Value::Null).await;
    assert_ne!(before["policy_digest"], after["policy_digest"]);
    let denied =
        result(&fixture, "tools/call", &json!({"name": "echo", "arguments": {"text": "hi"}})).await;
    assert_eq!(denied["denied"], json!(true));

    let system = result(&fixture, "audit/query", &json!({"event_type": "system_event"})).await;
    assert_eq!(system["count"], json!(1));
}
