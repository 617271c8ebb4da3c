// crates/toolgate-core/src/core/mod.rs
// ============================================================================
// Module: Toolgate Core Types
// Description: Canonical request, policy, audit, and evaluation structures.
// Purpose: Provide stable, serializable types shared by every Toolgate crate.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Toolgate core types define tool requests and results, policy entries, audit
//! events, and evaluation runs. These types are the source of truth for the
//! JSON shapes exposed over JSON-RPC and written to audit files.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod evaluation;
pub mod hashing;
pub mod identifiers;
pub mod policy;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditEventType;
pub use audit::AuditFilter;
pub use audit::AuditOutcome;
pub use audit::sort_chronological;
pub use evaluation::Comparison;
pub use evaluation::EvaluationRun;
pub use evaluation::GateSpec;
pub use evaluation::GateVerdict;
pub use evaluation::QuestionResult;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use identifiers::RequestId;
pub use identifiers::ToolName;
pub use identifiers::is_valid_tool_name;
pub use policy::PolicyEntry;
pub use policy::PolicyError;
pub use policy::PolicyTable;
pub use request::ToolRequest;
pub use request::ToolResult;
