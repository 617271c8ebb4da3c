// crates/toolgate-core/src/runtime/audit_memory.rs
// ============================================================================
// Module: Toolgate In-Memory Audit Log
// Description: Process-local audit log for tests and ephemeral runs.
// Purpose: Provide an AuditLog with the same ordering semantics as durable sinks.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Events are kept in arrival order behind a mutex. Queries return matches in
//! timestamp order with arrival order breaking ties.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::AuditEvent;
use crate::core::AuditFilter;
use crate::interfaces::AuditError;
use crate::interfaces::AuditLog;

// ============================================================================
// SECTION: In-Memory Audit Log
// ============================================================================

/// In-memory audit log.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditLog {
    /// Events in arrival order.
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored event in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Lock`] when the mutex is poisoned.
    pub fn events(&self) -> Result<Vec<AuditEvent>, AuditError> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| AuditError::Lock("audit mutex poisoned".to_string()))
    }
}

impl AuditLog for InMemoryAuditLog {
    fn try_append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .map_err(|_| AuditError::Lock("audit mutex poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(filter.apply(self.events()?))
    }
}
