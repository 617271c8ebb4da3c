// crates/toolgate-mcp/tests/stdio_transport.rs
// ============================================================================
// Module: Stdio Transport Tests
// Description: Framed JSON-RPC served over in-memory streams.
// ============================================================================
//! ## Overview
//! Drives `serve_framed` with a scripted input stream and checks the framed
//! responses, including recovery after an oversized frame.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncReadExt;
use toolgate_mcp::Frame;
use toolgate_mcp::read_framed;
use toolgate_mcp::serve_framed;

use crate::common::fixture;
use crate::common::rpc;

fn framed(payload: &[u8]) -> Vec<u8> {
    let mut out = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
    out.extend_from_slice(payload);
    out
}

async fn serve(input: Vec<u8>) -> Vec<Value> {
    let fixture = fixture(false);
    let (mut client, server_side) = tokio::io::duplex(64 * 1024);
    serve_framed(fixture.server.handler().clone(), input.as_slice(), server_side).await.unwrap();

    let mut output = Vec::new();
    client.read_to_end(&mut output).await.unwrap();
    let mut reader = output.as_slice();
    let mut responses = Vec::new();
    while let Some(frame) = read_framed(&mut reader, usize::MAX).await.unwrap() {
        let Frame::Payload(bytes) = frame else {
            panic!("response frames are never oversized");
        };
        responses.push(serde_json::from_slice(&bytes).unwrap());
    }
    responses
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversized_frame_gets_an_error_and_serving_continues() {
    let text = "x".repeat(4096);
    let mut input = framed(&rpc(1, "tools/call", &json!({"name": "echo", "arguments": {"text": text}})));
    input.extend(framed(&rpc(2, "tools/call", &json!({"name": "echo", "arguments": {"text": "hi"}}))));
    input.extend(framed(&rpc(3, "health", &Value::Null)));

    let responses = serve(input).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["error"]["code"], json!(-32070));
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], json!(2));
    assert_eq!(responses[1]["result"]["output"], json!("hi"));
    assert_eq!(responses[2]["id"], json!(3));
    assert_eq!(responses[2]["result"]["ok"], json!(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn responses_keep_request_order() {
    let mut input = Vec::new();
    for id in 1..=16_u64 {
        let params = json!({"name": "echo", "arguments": {"text": format!("n{id}")}});
        input.extend(framed(&rpc(id, "tools/call", &params)));
    }

    let responses = serve(input).await;

    let ids: Vec<u64> = responses.iter().map(|response| response["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, (1..=16).collect::<Vec<u64>>());
    for (index, response) in responses.iter().enumerate() {
        assert_eq!(response["result"]["output"], json!(format!("n{}", index + 1)));
    }
}

#[tokio::test]
async fn empty_input_ends_cleanly() {
    assert!(serve(Vec::new()).await.is_empty());
}
