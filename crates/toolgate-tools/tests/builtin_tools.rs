// crates/toolgate-tools/tests/builtin_tools.rs
// ============================================================================
// Module: Built-in Tool Tests
// Description: Argument handling and outputs of the built-in tools.
// ============================================================================
//! ## Overview
//! Exercises each built-in through the registry, the same path the
//! dispatcher uses.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::ToolError;
use toolgate_core::ToolRegistry;
use toolgate_tools::BuiltinToolsConfig;
use toolgate_tools::Corpus;
use toolgate_tools::Document;
use toolgate_tools::registry_with_corpus;

fn corpus() -> Arc<Corpus> {
    let documents = vec![
        Document {
            id: "retention".to_string(),
            text: "Audit files are compressed after seven days. Files older than thirty days are removed."
                .to_string(),
            title: None,
        },
        Document {
            id: "policy".to_string(),
            text: "Unknown tools are denied by default. Each tool has a timeout.".to_string(),
            title: Some("Allowlist".to_string()),
        },
    ];
    Arc::new(Corpus::new(documents).unwrap())
}

async fn call(tool: &str, arguments: Value) -> Result<Value, ToolError> {
    let registry = registry_with_corpus(&BuiltinToolsConfig::default(), corpus()).unwrap();
    let map: Map<String, Value> = arguments.as_object().cloned().unwrap_or_default();
    registry.resolve(tool).unwrap().call(map).await
}

#[test]
fn registry_lists_every_builtin() {
    let registry = registry_with_corpus(&BuiltinToolsConfig::default(), corpus()).unwrap();
    let names: Vec<String> = registry.describe().into_iter().map(|tool| tool.name).collect();
    assert_eq!(names, vec!["answer", "echo", "ping", "search_docs", "summarize"]);
}

#[tokio::test]
async fn echo_returns_text() {
    assert_eq!(call("echo", json!({"text": "hi"})).await.unwrap(), json!("hi"));
    assert_eq!(
        call("echo", json!({"text": 5})).await,
        Err(ToolError::InvalidArguments("text must be a string".to_string()))
    );
}

#[tokio::test]
async fn ping_defaults_to_ok() {
    assert_eq!(call("ping", json!({})).await.unwrap(), json!({"message": "ok"}));
    assert_eq!(call("ping", json!({"message": "pong"})).await.unwrap(), json!({"message": "pong"}));
}

#[tokio::test]
async fn summarize_respects_sentence_budget() {
    let text = "Alpha beta. Gamma delta. Epsilon zeta.";
    let output = call("summarize", json!({"text": text, "max_sentences": 5})).await.unwrap();
    assert_eq!(output["summary"], json!(text));
    assert_eq!(output["method"], json!("extractive"));
    let rejected = call("summarize", json!({"text": text, "max_sentences": 0})).await;
    assert!(matches!(rejected, Err(ToolError::InvalidArguments(_))));
}

#[tokio::test]
async fn search_docs_ranks_relevant_documents() {
    let output = call("search_docs", json!({"query": "when are audit files compressed", "top_k": 2}))
        .await
        .unwrap();
    assert_eq!(output["total_results"], json!(1));
    assert_eq!(output["results"][0]["id"], json!("retention"));
    assert_eq!(output["results"][0]["rank"], json!(1));

    let titled = call("search_docs", json!({"query": "allowlist"})).await.unwrap();
    assert_eq!(titled["results"][0]["id"], json!("policy"));
}

#[tokio::test]
async fn search_docs_rejects_blank_query() {
    let result = call("search_docs", json!({"query": "  "})).await;
    assert_eq!(result, Err(ToolError::InvalidArguments("query must be non-empty".to_string())));
}

#[tokio::test]
async fn answer_extracts_best_sentence_and_cites_it() {
    let output = call(
        "answer",
        json!({
            "question": "How long until audit files are removed?",
            "contexts": [
                {"id": "policy", "text": "Unknown tools are denied by default."},
                {"id": "retention", "text": "Audit files are compressed after seven days. Files older than thirty days are removed."}
            ]
        }),
    )
    .await
    .unwrap();
    assert_eq!(output["answer"], json!("Audit files are compressed after seven days."));
    assert_eq!(output["citations"], json!(["retention"]));
    assert_eq!(output["grounded"], json!(true));
}

#[tokio::test]
async fn answer_without_overlap_is_ungrounded() {
    let output = call("answer", json!({"question": "zebra?", "contexts": ["Nothing relevant here."]}))
        .await
        .unwrap();
    assert_eq!(output["answer"], json!(""));
    assert_eq!(output["grounded"], json!(false));
}
