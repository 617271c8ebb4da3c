// crates/toolgate-audit/src/lib.rs
// ============================================================================
// Module: Toolgate Audit Library
// Description: File-backed audit log with rotation, retention, and metrics.
// Purpose: Persist audit events and derive operational reports from them.
// Dependencies: toolgate-core, flate2, serde_json, time
// ============================================================================

//! ## Overview
//! [`FileAuditLog`] writes one JSON object per line into a file per UTC day.
//! [`maintain`] compresses and expires old partitions, and [`AuditMetrics`]
//! summarizes events for reports.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod file_log;
pub mod metrics;
pub mod partition;
pub mod retention;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use file_log::FileAuditLog;
pub use metrics::AuditMetrics;
pub use metrics::ToolErrorRate;
pub use partition::Partition;
pub use retention::MaintenanceReport;
pub use retention::RetentionPolicy;
pub use retention::maintain;
