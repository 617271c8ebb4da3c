// crates/toolgate-audit/tests/retention.rs
// ============================================================================
// Module: Audit Retention Tests
// Description: Compression and expiry thresholds for audit partitions.
// ============================================================================
//! ## Overview
//! Validates threshold boundaries, archive versus delete, and appending a
//! late plain file into an existing compressed partition.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use toolgate_audit::FileAuditLog;
use toolgate_audit::RetentionPolicy;
use toolgate_audit::maintain;
use toolgate_core::AuditFilter;
use toolgate_core::AuditLog;
use toolgate_core::AuditOutcome;

mod common;

use common::call;
use common::march;
use common::march_date;

fn seed_day(dir: &Path, day: u8) {
    let log = FileAuditLog::open(dir, "audit").unwrap();
    log.try_append(&call("echo", AuditOutcome::Success, march(day, 8, 0, 0), 1.0)).unwrap();
}

fn policy(archive_dir: Option<&Path>) -> RetentionPolicy {
    RetentionPolicy {
        compress_after_days: 7,
        remove_after_days: 20,
        archive_dir: archive_dir.map(Path::to_path_buf),
    }
}

#[test]
fn compression_starts_at_threshold_age() {
    let dir = TempDir::new().unwrap();
    seed_day(dir.path(), 3);
    seed_day(dir.path(), 4);

    let report = maintain(dir.path(), "audit", &policy(None), march_date(10)).unwrap();

    assert_eq!(report.compressed, vec![dir.path().join("audit-2026-03-03.jsonl")]);
    assert!(dir.path().join("audit-2026-03-03.jsonl.gz").exists());
    assert!(dir.path().join("audit-2026-03-04.jsonl").exists());
    assert!(report.removed.is_empty());
}

#[test]
fn expiry_deletes_beyond_removal_threshold() {
    let dir = TempDir::new().unwrap();
    seed_day(dir.path(), 1);
    seed_day(dir.path(), 2);

    let report = maintain(dir.path(), "audit", &policy(None), march_date(22)).unwrap();

    assert_eq!(report.removed, vec![dir.path().join("audit-2026-03-01.jsonl")]);
    assert!(!dir.path().join("audit-2026-03-01.jsonl").exists());
    assert_eq!(report.compressed, vec![dir.path().join("audit-2026-03-02.jsonl")]);
}

#[test]
fn expiry_archives_when_configured() {
    let dir = TempDir::new().unwrap();
    let archive = TempDir::new().unwrap();
    seed_day(dir.path(), 1);
    maintain(dir.path(), "audit", &policy(None), march_date(9)).unwrap();

    let report =
        maintain(dir.path(), "audit", &policy(Some(archive.path())), march_date(25)).unwrap();

    let archived = archive.path().join("audit-2026-03-01.jsonl.gz");
    assert_eq!(report.archived, vec![archived.clone()]);
    assert!(archived.exists());
    assert!(!dir.path().join("audit-2026-03-01.jsonl.gz").exists());
}

#[test]
fn late_plain_file_is_appended_to_existing_archive_member() {
    let dir = TempDir::new().unwrap();
    seed_day(dir.path(), 1);
    maintain(dir.path(), "audit", &policy(None), march_date(9)).unwrap();
    seed_day(dir.path(), 1);
    maintain(dir.path(), "audit", &policy(None), march_date(9)).unwrap();

    assert!(!dir.path().join("audit-2026-03-01.jsonl").exists());
    let log = FileAuditLog::open(dir.path(), "audit").unwrap();
    assert_eq!(log.query(&AuditFilter::default()).unwrap().len(), 2);
}

#[test]
fn unrelated_files_are_untouched() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "keep").unwrap();
    fs::write(dir.path().join("other-2026-03-01.jsonl"), "{}\n").unwrap();

    let report = maintain(dir.path(), "audit", &policy(None), march_date(30)).unwrap();

    assert!(report.is_empty());
    assert!(dir.path().join("notes.txt").exists());
    assert!(dir.path().join("other-2026-03-01.jsonl").exists());
}

#[test]
fn missing_directory_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent");
    let report = maintain(&missing, "audit", &policy(None), march_date(30)).unwrap();
    assert!(report.is_empty());
}
