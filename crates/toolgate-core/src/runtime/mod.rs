// crates/toolgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Toolgate Runtime
// Description: Policy enforcement, redaction, dispatch, and gate evaluation.
// Purpose: Implement the request path and evaluation primitives.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires the request path together: [`PolicyStore`] holds the
//! live allowlist, [`Redactor`] scrubs payloads, [`Guardian`] admits or
//! denies, and [`ToolDispatcher`] runs admitted tools under their budget.
//! [`GateEvaluator`] and the statistics helpers serve evaluation runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit_memory;
pub mod dispatcher;
pub mod gate;
pub mod guardian;
pub mod policy_store;
pub mod redactor;
pub mod registry;
pub mod request_ledger;
pub mod stats;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit_memory::InMemoryAuditLog;
pub use dispatcher::TIMEOUT_ERROR;
pub use dispatcher::ToolDispatcher;
pub use gate::GateEvaluator;
pub use gate::GateReport;
pub use guardian::DENY_NOT_ALLOWED;
pub use guardian::DENY_PAYLOAD_TOO_LARGE;
pub use guardian::Decision;
pub use guardian::Guardian;
pub use policy_store::PolicyStore;
pub use redactor::RedactionError;
pub use redactor::RedactionRule;
pub use redactor::Redactor;
pub use registry::RegistryError;
pub use registry::StaticToolRegistry;
pub use request_ledger::DEFAULT_LEDGER_CAPACITY;
pub use request_ledger::DispatchError;
pub use request_ledger::RequestLedger;
pub use stats::LatencySummary;
pub use stats::Reducer;
pub use stats::percentile;
