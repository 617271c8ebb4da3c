// crates/toolgate-core/tests/policy_store.rs
// ============================================================================
// Module: Policy Store Tests
// Description: Default-deny and atomic reload behavior of the policy store.
// ============================================================================
//! ## Overview
//! Checks that unknown tools are always denied and that concurrent readers
//! never observe a mix of two policy tables.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;

use proptest::prelude::*;
use serde_json::Map;
use toolgate_core::Decision;
use toolgate_core::Guardian;
use toolgate_core::InMemoryAuditLog;
use toolgate_core::PolicyEntry;
use toolgate_core::PolicyStore;
use toolgate_core::PolicyTable;
use toolgate_core::Redactor;
use toolgate_core::ToolName;
use toolgate_core::ToolRequest;

fn entry(name: &str, timeout_seconds: f64) -> PolicyEntry {
    PolicyEntry {
        tool_name: ToolName::new(name),
        allowed: true,
        timeout_seconds,
        max_payload_bytes: 4096,
    }
}

fn generation(version: &str, timeout_seconds: f64) -> PolicyTable {
    PolicyTable::new(
        version,
        vec![entry("echo", timeout_seconds), entry("ping", timeout_seconds)],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn unknown_tools_are_always_denied(name in "[a-z_]{1,24}") {
        prop_assume!(name != "echo" && name != "ping");
        let store = Arc::new(PolicyStore::new(generation("v1", 1.0)));
        prop_assert!(!store.is_allowed(&name));
        let guardian = Guardian::new(
            store,
            Arc::new(Redactor::with_builtin().unwrap()),
            Arc::new(InMemoryAuditLog::new()),
        );
        let decision = guardian.admit(&ToolRequest::new(name.as_str(), Map::new()));
        prop_assert!(!decision.is_allowed());
        let is_deny = matches!(decision, Decision::Deny { .. });
        prop_assert!(is_deny);
    }
}

#[test]
fn readers_never_see_mixed_tables() {
    let store = Arc::new(PolicyStore::new(generation("v1", 1.0)));
    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        readers.push(thread::spawn(move || {
            let mut observed = 0_u64;
            while !stop.load(Ordering::Relaxed) {
                let snapshot = store.snapshot();
                let echo = snapshot.get("echo").unwrap().timeout_seconds;
                let ping = snapshot.get("ping").unwrap().timeout_seconds;
                assert!((echo - ping).abs() < f64::EPSILON, "mixed snapshot");
                let expected = if snapshot.version() == "v1" { 1.0 } else { 2.0 };
                assert!((echo - expected).abs() < f64::EPSILON, "version mismatch");
                observed += 1;
            }
            observed
        }));
    }
    for round in 0..200 {
        let table =
            if round % 2 == 0 { generation("v2", 2.0) } else { generation("v1", 1.0) };
        let _ = store.reload(table);
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0 || store.snapshot().len() == 2);
    }
}
