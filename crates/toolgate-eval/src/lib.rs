// crates/toolgate-eval/src/lib.rs
// ============================================================================
// Module: Toolgate Eval Library
// Description: Evaluation gate engine.
// Purpose: Run retrieval and answer tools over a dataset and gate the result.
// Dependencies: toolgate-core, toolgate-tools, rand, tokio
// ============================================================================

//! ## Overview
//! [`EvaluationEngine`] loads a JSONL dataset, processes items in an order
//! fixed by the seed, calls the retrieval and answer tools through the same
//! [`toolgate_core::ToolDispatcher`] path as live traffic, aggregates
//! per-item metrics, and evaluates the gate table. [`write_artifacts`]
//! persists the run for CI.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifacts;
pub mod dataset;
pub mod engine;
pub mod metrics;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifacts::ArtifactPaths;
pub use artifacts::render_report;
pub use artifacts::write_artifacts;
pub use dataset::DatasetItem;
pub use dataset::load_dataset;
pub use dataset::processing_order;
pub use engine::EvalError;
pub use engine::EvalSettings;
pub use engine::EvaluationEngine;
