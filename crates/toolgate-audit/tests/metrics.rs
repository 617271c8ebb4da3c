// crates/toolgate-audit/tests/metrics.rs
// ============================================================================
// Module: Audit Metrics Tests
// Description: Error rates, latency, and activity summaries.
// ============================================================================
//! ## Overview
//! Validates that only terminal events are counted, that denials count as
//! failures without latency, and that the Markdown report renders.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
#![allow(clippy::float_cmp, reason = "Rates are exact ratios of small integers.")]

use toolgate_audit::AuditMetrics;
use toolgate_core::AuditEvent;
use toolgate_core::AuditOutcome;
use toolgate_core::ToolRequest;

mod common;

use common::call;
use common::denial;
use common::march;

fn sample_events() -> Vec<AuditEvent> {
    let admitted = AuditEvent::security(
        &ToolRequest::new("echo", serde_json::Map::new()),
        AuditOutcome::Admitted,
        "allowed",
    )
    .at(march(5, 9, 0, 0));
    vec![
        admitted,
        call("echo", AuditOutcome::Success, march(5, 9, 0, 1), 10.0),
        call("echo", AuditOutcome::Success, march(5, 9, 30, 0), 20.0),
        call("search_docs", AuditOutcome::Error, march(5, 10, 5, 0), 30.0),
        call("search_docs", AuditOutcome::Timeout, march(5, 10, 6, 0), 5000.0),
        denial("shell_exec", Some("mallory"), march(5, 10, 7, 0)),
    ]
}

#[test]
fn counts_terminal_events_only() {
    let metrics = AuditMetrics::from_events(&sample_events());
    assert_eq!(metrics.total_events, 6);
    assert_eq!(metrics.terminal_events, 5);
    assert_eq!(metrics.successes, 2);
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.timeouts, 1);
    assert_eq!(metrics.denied, 1);
    assert_eq!(metrics.error_rate, 0.6);
}

#[test]
fn latency_excludes_denials() {
    let metrics = AuditMetrics::from_events(&sample_events());
    let latency = metrics.latency.unwrap();
    assert_eq!(latency.count, 4);
    assert_eq!(latency.p50_ms, 20.0);
    assert_eq!(latency.p99_ms, 5000.0);
}

#[test]
fn tools_rank_by_error_rate() {
    let metrics = AuditMetrics::from_events(&sample_events());
    let top: Vec<&str> =
        metrics.top_failing_tools(5).iter().map(|tool| tool.tool_name.as_str()).collect();
    assert_eq!(top, vec!["search_docs", "shell_exec"]);
    assert_eq!(metrics.top_failing_tools(1).len(), 1);
    assert_eq!(metrics.tools.last().map(|tool| tool.tool_name.as_str()), Some("echo"));
}

#[test]
fn volume_and_users_are_bucketed() {
    let metrics = AuditMetrics::from_events(&sample_events());
    assert_eq!(metrics.volume_by_hour.get("2026-03-05T09:00Z"), Some(&2));
    assert_eq!(metrics.volume_by_hour.get("2026-03-05T10:00Z"), Some(&3));
    assert_eq!(metrics.user_activity.get("mallory"), Some(&1));
    assert_eq!(metrics.user_activity.get("anonymous"), Some(&4));
}

#[test]
fn empty_input_has_zero_error_rate() {
    let metrics = AuditMetrics::from_events(&[]);
    assert_eq!(metrics.error_rate, 0.0);
    assert!(metrics.latency.is_none());
    assert!(metrics.to_markdown(5).starts_with("# Audit Report"));
}

#[test]
fn markdown_report_lists_failing_tools() {
    let report = AuditMetrics::from_events(&sample_events()).to_markdown(3);
    assert!(report.contains("| Error rate | 60.00% |"));
    assert!(report.contains("## Top Failing Tools"));
    assert!(report.contains("| search_docs | 2 | 2 | 100.00% |"));
    assert!(report.contains("| mallory | 1 |"));
}
