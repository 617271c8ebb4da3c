// crates/toolgate-audit/tests/file_log.rs
// ============================================================================
// Module: File Audit Log Tests
// Description: Partitioning, querying, and concurrency of the file log.
// ============================================================================
//! ## Overview
//! Validates UTC day partitioning, filtered chronological queries across
//! plain and compressed files, and that concurrent appends lose nothing.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use toolgate_audit::FileAuditLog;
use toolgate_audit::RetentionPolicy;
use toolgate_core::AuditEvent;
use toolgate_core::AuditEventType;
use toolgate_core::AuditFilter;
use toolgate_core::AuditLog;
use toolgate_core::AuditOutcome;
use toolgate_core::ToolName;

mod common;

use common::call;
use common::denial;
use common::march;

fn line_count(path: &std::path::Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn events_are_partitioned_by_utc_day() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::open(dir.path(), "audit").unwrap();
    log.try_append(&call("echo", AuditOutcome::Success, march(4, 23, 59, 59), 3.0)).unwrap();
    log.try_append(&call("echo", AuditOutcome::Success, march(5, 0, 0, 0), 4.0)).unwrap();

    let partitions = log.partitions().unwrap();
    let names: Vec<String> = partitions
        .iter()
        .map(|partition| partition.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["audit-2026-03-04.jsonl", "audit-2026-03-05.jsonl"]);
    for partition in &partitions {
        assert_eq!(line_count(&partition.path), 1);
    }
}

#[test]
fn query_filters_and_orders_chronologically() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::open(dir.path(), "audit").unwrap();
    let late = call("search_docs", AuditOutcome::Error, march(5, 11, 0, 0), 9.0);
    let early = call("echo", AuditOutcome::Success, march(4, 9, 0, 0), 1.0);
    let middle = denial("shell_exec", Some("u1"), march(5, 8, 0, 0));
    for event in [&late, &early, &middle] {
        log.try_append(event).unwrap();
    }

    let all = log.query(&AuditFilter::default()).unwrap();
    assert_eq!(all, vec![early.clone(), middle.clone(), late.clone()]);

    let by_tool = log.query(&AuditFilter::by_tool(ToolName::new("echo"))).unwrap();
    assert_eq!(by_tool, vec![early.clone()]);

    let by_request =
        log.query(&AuditFilter::by_request(late.request_id.clone().unwrap())).unwrap();
    assert_eq!(by_request, vec![late.clone()]);

    let security = AuditFilter {
        event_type: Some(AuditEventType::SecurityEvent),
        ..AuditFilter::default()
    };
    assert_eq!(log.query(&security).unwrap(), vec![middle.clone()]);

    let window = AuditFilter {
        since: Some(march(5, 0, 0, 0)),
        until: Some(march(5, 10, 0, 0)),
        ..AuditFilter::default()
    };
    assert_eq!(log.query(&window).unwrap(), vec![middle.clone()]);

    assert_eq!(log.query(&AuditFilter::recent(2)).unwrap(), vec![middle, late]);
}

#[test]
fn malformed_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::open(dir.path(), "audit").unwrap();
    let event = call("echo", AuditOutcome::Success, march(4, 12, 0, 0), 2.0);
    log.try_append(&event).unwrap();
    let path = dir.path().join("audit-2026-03-04.jsonl");
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{{not json").unwrap();
    writeln!(file).unwrap();

    assert_eq!(log.query(&AuditFilter::default()).unwrap(), vec![event]);
}

#[test]
fn compressed_partitions_remain_queryable() {
    let dir = TempDir::new().unwrap();
    let log = FileAuditLog::open(dir.path(), "audit")
        .unwrap()
        .with_retention(RetentionPolicy::default());
    let old = call("echo", AuditOutcome::Success, march(1, 6, 0, 0), 2.0);
    let recent = call("echo", AuditOutcome::Timeout, march(9, 6, 0, 0), 5000.0);
    log.try_append(&recent).unwrap();
    log.try_append(&old).unwrap();

    let report = log.maintain(march(9, 12, 0, 0)).unwrap();
    assert_eq!(report.compressed, vec![dir.path().join("audit-2026-03-01.jsonl")]);
    assert!(dir.path().join("audit-2026-03-01.jsonl.gz").exists());
    assert!(!dir.path().join("audit-2026-03-01.jsonl").exists());

    assert_eq!(log.query(&AuditFilter::default()).unwrap(), vec![old, recent.clone()]);

    let after = call("echo", AuditOutcome::Success, march(9, 13, 0, 0), 1.0);
    log.try_append(&after).unwrap();
    assert_eq!(log.query(&AuditFilter::recent(2)).unwrap(), vec![recent, after]);
}

#[test]
fn rolling_forward_applies_retention() {
    let dir = TempDir::new().unwrap();
    let policy = RetentionPolicy {
        compress_after_days: 1,
        remove_after_days: 30,
        archive_dir: None,
    };
    let log = FileAuditLog::open(dir.path(), "audit").unwrap().with_retention(policy);
    log.try_append(&call("echo", AuditOutcome::Success, march(1, 6, 0, 0), 2.0)).unwrap();
    log.try_append(&call("echo", AuditOutcome::Success, march(3, 6, 0, 0), 2.0)).unwrap();

    assert!(dir.path().join("audit-2026-03-01.jsonl.gz").exists());
    assert!(dir.path().join("audit-2026-03-03.jsonl").exists());
    assert_eq!(log.query(&AuditFilter::default()).unwrap().len(), 2);
}

#[test]
fn concurrent_appends_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(FileAuditLog::open(dir.path(), "audit").unwrap());
    let mut workers = Vec::new();
    for worker in 0..8_u8 {
        let log = Arc::clone(&log);
        workers.push(thread::spawn(move || {
            for index in 0..50_u8 {
                let event = AuditEvent::system(format!("worker {worker} event {index}"))
                    .at(march(6, 12, worker, index % 60));
                log.append(&event);
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(line_count(&dir.path().join("audit-2026-03-06.jsonl")), 400);
    assert_eq!(log.query(&AuditFilter::default()).unwrap().len(), 400);
}
