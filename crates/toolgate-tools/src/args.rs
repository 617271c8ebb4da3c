// crates/toolgate-tools/src/args.rs
// ============================================================================
// Module: Tool Arguments
// Description: Typed extraction of tool arguments.
// Purpose: Uniform argument errors across built-in tools.
// Dependencies: serde_json, toolgate-core
// ============================================================================

//! ## Overview
//! Helpers return [`ToolError::InvalidArguments`] with the argument name so
//! callers see which field was wrong.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use toolgate_core::ToolError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a required string argument.
pub fn required_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<&'a str, ToolError> {
    match arguments.get(key) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ToolError::InvalidArguments(format!("{key} must be a string"))),
        None => Err(ToolError::InvalidArguments(format!("{key} is required"))),
    }
}

/// Returns an optional string argument.
pub fn optional_str<'a>(
    arguments: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, ToolError> {
    match arguments.get(key) {
        Some(Value::String(value)) => Ok(Some(value)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ToolError::InvalidArguments(format!("{key} must be a string"))),
    }
}

/// Returns an optional positive integer argument bounded by `max`.
pub fn optional_count(
    arguments: &Map<String, Value>,
    key: &str,
    max: usize,
) -> Result<Option<usize>, ToolError> {
    let Some(value) = arguments.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let count = value
        .as_u64()
        .and_then(|count| usize::try_from(count).ok())
        .filter(|count| (1..=max).contains(count))
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!("{key} must be an integer in 1..={max}"))
        })?;
    Ok(Some(count))
}
