// crates/toolgate-config/src/lib.rs
// ============================================================================
// Module: Toolgate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for toolgate.toml semantics.
// Dependencies: toolgate-core, serde, toml
// ============================================================================

//! ## Overview
//! `toolgate-config` defines the configuration model for Toolgate: the tool
//! allowlist, redaction rules, audit retention, evaluation gates, and server
//! transport. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
