// crates/toolgate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `toolgate config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example enables the built-in tools, keeps output redaction on, and
//! carries the release gate table used in CI.

/// Returns a canonical example `toolgate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
transport = "stdio"
max_body_bytes = 1048576
admin_enabled = false
# transport = "http"
# bind = "127.0.0.1:8080"

[policy]
version = "2026-10-01"

[policy.tools.echo]
allowed = true
timeout_seconds = 5
max_payload_bytes = 8192

[policy.tools.ping]
allowed = true
timeout_seconds = 1
max_payload_bytes = 1024

[policy.tools.summarize]
allowed = true
timeout_seconds = 30
max_payload_bytes = 65536

[policy.tools.search_docs]
allowed = true
timeout_seconds = 10
max_payload_bytes = 4096

[policy.tools.answer]
allowed = true
timeout_seconds = 30
max_payload_bytes = 262144

[policy.tools.shell_exec]
allowed = false

[redaction]
builtin = true

[[redaction.custom]]
kind = "api_key"
pattern = "\\bsk-[A-Za-z0-9]{20,}\\b"

[guardian]
redact_outputs = true

[audit]
dir = "logs/audit"
prefix = "audit"
compress_after_days = 7
remove_after_days = 30
# archive_dir = "logs/archive"

[tools]
corpus_path = "data/corpus.jsonl"
summarize_max_sentences = 3

[evaluation]
seed = 42
k_values = [5, 10]
max_concurrency = 4
retrieval_tool = "search_docs"
answer_tool = "answer"
context_size = 5

[[evaluation.gates]]
metric_name = "recall@5"
comparison = "gte"
threshold = 0.85

[[evaluation.gates]]
metric_name = "recall@10"
comparison = "gte"
threshold = 0.92

[[evaluation.gates]]
metric_name = "mrr@10"
comparison = "gte"
threshold = 0.60

[[evaluation.gates]]
metric_name = "answer_f1"
comparison = "gte"
threshold = 0.55

[[evaluation.gates]]
metric_name = "hallucination"
comparison = "lte"
threshold = 0.05

[[evaluation.gates]]
metric_name = "context_utilization"
comparison = "gte"
threshold = 0.90

[[evaluation.gates]]
metric_name = "latency_p95_ms"
comparison = "lte"
threshold = 3500
"#,
    )
}
