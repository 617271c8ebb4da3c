// crates/toolgate-core/src/core/request.rs
// ============================================================================
// Module: Toolgate Requests and Results
// Description: Tool invocation request and terminal result structures.
// Purpose: Define the caller-facing contract for every tool invocation.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! A [`ToolRequest`] names a tool and carries a JSON object of arguments. A
//! [`ToolResult`] is produced exactly once per request by the dispatcher and
//! is never mutated afterwards: `output` is present only on success and
//! `error` only on failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::RequestId;
use crate::core::identifiers::ToolName;

// ============================================================================
// SECTION: Tool Request
// ============================================================================

/// Tool invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Tool to invoke.
    pub tool_name: ToolName,
    /// Tool arguments (may be empty).
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Correlation identifier, generated when the caller omits one.
    #[serde(default = "RequestId::generate")]
    pub request_id: RequestId,
    /// Calling user when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Calling session when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Time the request entered the runtime.
    #[serde(default = "OffsetDateTime::now_utc", with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

impl ToolRequest {
    /// Creates a request with a generated id, received now.
    #[must_use]
    pub fn new(tool_name: impl Into<ToolName>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            request_id: RequestId::generate(),
            user_id: None,
            session_id: None,
            received_at: OffsetDateTime::now_utc(),
        }
    }

    /// Replaces the request id with a caller-supplied one.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attaches the calling user.
    #[must_use]
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Attaches the calling session.
    #[must_use]
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Returns the arguments as a JSON value.
    #[must_use]
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }

    /// Returns the serialized size of the arguments in bytes.
    ///
    /// A value that fails to serialize is reported as `usize::MAX` so it can
    /// never pass a size limit.
    #[must_use]
    pub fn payload_bytes(&self) -> usize {
        serde_json::to_vec(&self.arguments).map_or(usize::MAX, |bytes| bytes.len())
    }
}

// ============================================================================
// SECTION: Tool Result
// ============================================================================

/// Terminal result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Correlation identifier echoed from the request.
    pub request_id: RequestId,
    /// True when the tool completed successfully.
    pub success: bool,
    /// Tool output (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure or denial reason (failure only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed time from admission to completion.
    pub duration_ms: f64,
    /// True when the guardian refused the request.
    pub denied: bool,
}

impl ToolResult {
    /// Builds a successful result.
    #[must_use]
    pub fn succeeded(request_id: RequestId, output: Value, duration_ms: f64) -> Self {
        Self {
            request_id,
            success: true,
            output: Some(output),
            error: None,
            duration_ms,
            denied: false,
        }
    }

    /// Builds a failed (admitted but unsuccessful) result.
    #[must_use]
    pub fn failed(request_id: RequestId, error: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            request_id,
            success: false,
            output: None,
            error: Some(error.into()),
            duration_ms,
            denied: false,
        }
    }

    /// Builds a denied result.
    #[must_use]
    pub fn denied(request_id: RequestId, reason: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            request_id,
            success: false,
            output: None,
            error: Some(reason.into()),
            duration_ms,
            denied: true,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only serialization assertions.")]

    use serde_json::Map;
    use serde_json::Value;
    use serde_json::json;

    use super::ToolRequest;
    use super::ToolResult;
    use crate::core::identifiers::RequestId;

    #[test]
    fn missing_request_id_is_generated() {
        let request: ToolRequest =
            serde_json::from_value(json!({"tool_name": "echo", "arguments": {}})).unwrap();
        assert!(!request.request_id.as_str().is_empty());
        assert!(request.user_id.is_none());
    }

    #[test]
    fn success_result_omits_error_field() {
        let result = ToolResult::succeeded(RequestId::new("r-1"), json!("hi"), 1.0);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["output"], json!("hi"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn denied_result_omits_output_field() {
        let result = ToolResult::denied(RequestId::new("r-2"), "payload too large", 0.0);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("output").is_none());
        assert_eq!(value["denied"], Value::Bool(true));
    }

    #[test]
    fn payload_bytes_matches_serialized_arguments() {
        let mut arguments = Map::new();
        arguments.insert("text".to_string(), json!("hi"));
        let request = ToolRequest::new("echo", arguments);
        assert_eq!(request.payload_bytes(), br#"{"text":"hi"}"#.len());
    }
}
