// crates/toolgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Toolgate Interfaces
// Description: Backend-agnostic traits for tools, tool registries, and audit logs.
// Purpose: Define the seams where concrete tools and sinks plug into the runtime.
// Dependencies: async-trait, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The runtime resolves tools by name through a [`ToolRegistry`] and records
//! events through an [`AuditLog`]. Both are object safe so deployments and
//! tests can swap implementations without touching the dispatcher.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::AuditEvent;
use crate::core::AuditFilter;
use crate::core::RequestId;

// ============================================================================
// SECTION: Tools
// ============================================================================

/// Errors returned by tool implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Arguments were missing or malformed.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Tool ran and failed.
    #[error("{0}")]
    Failed(String),
}

/// Executable tool capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the registered tool name.
    fn name(&self) -> &str;

    /// Returns a one-line description for tool listings.
    fn description(&self) -> &str;

    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when arguments are invalid or execution fails.
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// Tool listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
}

/// Name-keyed tool lookup.
pub trait ToolRegistry: Send + Sync {
    /// Resolves a tool by name.
    fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// Lists registered tools in name order.
    fn describe(&self) -> Vec<ToolDescriptor>;
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Audit sink errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// Filesystem failure.
    #[error("audit io error: {0}")]
    Io(String),
    /// Event encoding or decoding failure.
    #[error("audit serialization error: {0}")]
    Serialization(String),
    /// Writer lock poisoned.
    #[error("audit lock error: {0}")]
    Lock(String),
}

/// Append-only audit log.
pub trait AuditLog: Send + Sync {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the event cannot be persisted.
    fn try_append(&self, event: &AuditEvent) -> Result<(), AuditError>;

    /// Returns events matching `filter` in chronological order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when stored events cannot be read.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;

    /// Appends an event on the request path.
    ///
    /// Failures are reported on the diagnostic channel and swallowed so a
    /// logging fault never becomes a tool failure.
    fn append(&self, event: &AuditEvent) {
        if let Err(err) = self.try_append(event) {
            tracing::warn!(
                error = %err,
                event_type = event.event_type.as_str(),
                request_id = event.request_id.as_ref().map_or("", RequestId::as_str),
                "audit append failed"
            );
        }
    }
}
