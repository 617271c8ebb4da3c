// crates/toolgate-core/src/lib.rs
// ============================================================================
// Module: Toolgate Core Library
// Description: Public API surface for the Toolgate core.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Toolgate core provides policy-gated tool invocation: a default-deny policy
//! store, a deterministic PII redactor, the guardian that admits or denies
//! requests, and the dispatcher that runs tools under a timeout and records
//! exactly one terminal audit event per request. It also holds the gate
//! evaluation primitives shared by the evaluation engine.
//!
//! Transport, persistence, and concrete tools live in sibling crates and plug
//! in through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuditError;
pub use interfaces::AuditLog;
pub use interfaces::Tool;
pub use interfaces::ToolDescriptor;
pub use interfaces::ToolError;
pub use interfaces::ToolRegistry;
pub use runtime::Decision;
pub use runtime::DispatchError;
pub use runtime::GateEvaluator;
pub use runtime::GateReport;
pub use runtime::Guardian;
pub use runtime::InMemoryAuditLog;
pub use runtime::LatencySummary;
pub use runtime::PolicyStore;
pub use runtime::RedactionError;
pub use runtime::RedactionRule;
pub use runtime::Redactor;
pub use runtime::Reducer;
pub use runtime::RegistryError;
pub use runtime::RequestLedger;
pub use runtime::StaticToolRegistry;
pub use runtime::ToolDispatcher;
pub use runtime::percentile;
