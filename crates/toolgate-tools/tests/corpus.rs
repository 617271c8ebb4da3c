// crates/toolgate-tools/tests/corpus.rs
// ============================================================================
// Module: Corpus Loading Tests
// Description: JSONL corpus loading guards and ranking stability.
// ============================================================================
//! ## Overview
//! Validates that malformed corpora fail to load and that ranking is
//! deterministic.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::fs;

use tempfile::TempDir;
use toolgate_tools::Corpus;
use toolgate_tools::CorpusError;
use toolgate_tools::Document;

fn write(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("corpus.jsonl");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_documents_and_skips_blank_lines() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "{\"id\": \"a\", \"text\": \"first doc\"}\n\n{\"id\": \"b\", \"text\": \"second doc\"}\n",
    );
    let corpus = Corpus::load_jsonl(&path, 1024).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.get("b").map(|doc| doc.text.as_str()), Some("second doc"));
}

#[test]
fn malformed_line_reports_its_number() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "{\"id\": \"a\", \"text\": \"ok\"}\n{\"id\": \"b\"}\n");
    let err = Corpus::load_jsonl(&path, 1024).unwrap_err();
    assert!(matches!(&err, CorpusError::Parse(message) if message.starts_with("line 2:")));
}

#[test]
fn duplicate_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "{\"id\": \"a\", \"text\": \"x\"}\n{\"id\": \"a\", \"text\": \"y\"}\n");
    assert_eq!(
        Corpus::load_jsonl(&path, 1024).unwrap_err(),
        CorpusError::Invalid("duplicate document id: a".to_string())
    );
}

#[test]
fn oversized_corpus_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &format!("{{\"id\": \"a\", \"text\": \"{}\"}}\n", "x".repeat(200)));
    assert_eq!(
        Corpus::load_jsonl(&path, 64).unwrap_err(),
        CorpusError::Invalid("corpus exceeds size limit".to_string())
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Corpus::load_jsonl(&dir.path().join("absent.jsonl"), 1024).unwrap_err();
    assert!(matches!(err, CorpusError::Io(_)));
}

#[test]
fn equal_scores_keep_corpus_order() {
    let documents = ["d1", "d2", "d3"]
        .into_iter()
        .map(|id| Document {
            id: id.to_string(),
            text: "gateway timeout policy".to_string(),
            title: None,
        })
        .collect();
    let corpus = Corpus::new(documents).unwrap();
    let ids: Vec<String> = corpus.search("timeout", 2).into_iter().map(|hit| hit.id).collect();
    assert_eq!(ids, vec!["d1", "d2"]);
}
