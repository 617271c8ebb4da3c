// crates/toolgate-tools/src/basic.rs
// ============================================================================
// Module: Basic Tools
// Description: `echo` and `ping` diagnostics tools.
// Purpose: Minimal tools for smoke tests and health checks.
// Dependencies: async-trait, serde_json, toolgate-core
// ============================================================================

//! ## Overview
//! `echo` returns `arguments.text` unchanged. `ping` returns
//! `{"message": <message>}` with `message` defaulting to `"ok"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::Tool;
use toolgate_core::ToolError;

use crate::args::optional_str;
use crate::args::required_str;

// ============================================================================
// SECTION: Echo
// ============================================================================

/// Returns its `text` argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Return the `text` argument unchanged."
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(Value::String(required_str(&arguments, "text")?.to_string()))
    }
}

// ============================================================================
// SECTION: Ping
// ============================================================================

/// Health check tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PingTool;

#[async_trait]
impl Tool for PingTool {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Health check; returns `message` (default \"ok\")."
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let message = optional_str(&arguments, "message")?.unwrap_or("ok");
        Ok(json!({ "message": message }))
    }
}
