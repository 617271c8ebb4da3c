// crates/toolgate-core/src/runtime/policy_store.rs
// ============================================================================
// Module: Toolgate Policy Store
// Description: Live allowlist with atomic whole-table reload.
// Purpose: Answer allow/lookup queries against a consistent policy snapshot.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The store holds an `Arc<PolicyTable>` behind a read/write lock. Readers
//! clone the `Arc` and work against that snapshot, so a concurrent
//! [`PolicyStore::reload`] is observed either entirely or not at all.
//! Tools without an entry are denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::RwLock;

use crate::core::PolicyEntry;
use crate::core::PolicyError;
use crate::core::PolicyTable;

// ============================================================================
// SECTION: Policy Store
// ============================================================================

/// Process-wide allowlist.
#[derive(Debug)]
pub struct PolicyStore {
    /// Current policy table.
    table: RwLock<Arc<PolicyTable>>,
}

impl PolicyStore {
    /// Creates a store serving `table`.
    #[must_use]
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Returns the current table.
    ///
    /// The lock only guards an `Arc` swap, so a poisoned lock still holds a
    /// complete table and is read through.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PolicyTable> {
        match self.table.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Returns true when `tool_name` is listed and allowed.
    #[must_use]
    pub fn is_allowed(&self, tool_name: &str) -> bool {
        self.snapshot().get(tool_name).is_some_and(|entry| entry.allowed)
    }

    /// Returns the policy entry for `tool_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] when the tool is not listed.
    pub fn get_policy(&self, tool_name: &str) -> Result<PolicyEntry, PolicyError> {
        self.snapshot()
            .get(tool_name)
            .cloned()
            .ok_or_else(|| PolicyError::NotFound(tool_name.to_string()))
    }

    /// Replaces the whole table and returns the previous one.
    pub fn reload(&self, table: PolicyTable) -> Arc<PolicyTable> {
        let next = Arc::new(table);
        let mut guard = match self.table.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
