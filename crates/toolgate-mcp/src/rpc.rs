// crates/toolgate-mcp/src/rpc.rs
// ============================================================================
// Module: JSON-RPC Handling
// Description: JSON-RPC 2.0 envelopes and method dispatch.
// Purpose: Map protocol requests onto the dispatcher and audit log.
// Dependencies: toolgate-core, toolgate-config, axum, serde_json
// ============================================================================

//! ## Overview
//! Supported methods:
//! - `tools/list`: registered tools with their policy status
//! - `tools/call`: one gated invocation; the result is the `ToolResult`
//! - `health`: liveness plus the active policy version and digest
//! - `audit/query`: filtered audit events
//! - `admin/policy_reload`: re-read the config file and swap the policy
//!
//! Tool failures are never protocol errors. A denied or failed call is a
//! successful JSON-RPC response carrying `success: false`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use toolgate_config::ToolgateConfig;
use toolgate_core::AuditEvent;
use toolgate_core::AuditEventType;
use toolgate_core::AuditFilter;
use toolgate_core::DispatchError;
use toolgate_core::RequestId;
use toolgate_core::ToolDispatcher;
use toolgate_core::ToolName;
use toolgate_core::ToolRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Protocol version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";
/// Malformed envelope or wrong protocol version.
pub const INVALID_REQUEST: i64 = -32600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Parameters failed to parse or validate.
pub const INVALID_PARAMS: i64 = -32602;
/// Admin method called while admin methods are disabled.
pub const ADMIN_DISABLED: i64 = -32003;
/// Server-side failure.
pub const INTERNAL_ERROR: i64 = -32050;
/// Response could not be encoded.
pub const SERIALIZATION_ERROR: i64 = -32060;
/// Request body exceeded the configured limit.
pub const BODY_TOO_LARGE: i64 = -32070;
/// Upper bound on events returned by one audit query.
pub const MAX_AUDIT_QUERY_LIMIT: usize = 1000;

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Incoming JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version; must be `2.0`.
    pub jsonrpc: String,
    /// Request identifier, echoed in the response.
    #[serde(default)]
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version.
    pub jsonrpc: String,
    /// Request identifier.
    pub id: Value,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Caller identity supplied by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller user id.
    pub user_id: Option<String>,
    /// Caller session id.
    pub session_id: Option<String>,
}

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Tool arguments object.
    #[serde(default)]
    arguments: Option<Value>,
    /// Caller-chosen correlation id.
    #[serde(default)]
    request_id: Option<String>,
    /// Caller user id; overrides the transport's.
    #[serde(default)]
    user_id: Option<String>,
    /// Caller session id; overrides the transport's.
    #[serde(default)]
    session_id: Option<String>,
}

/// Audit query parameters shared by `audit/query` and `GET /audit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditQuery {
    /// Match one request.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Match one tool.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Match one event category.
    #[serde(default)]
    pub event_type: Option<AuditEventType>,
    /// Inclusive RFC 3339 lower bound.
    #[serde(default)]
    pub since: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    #[serde(default)]
    pub until: Option<String>,
    /// Most recent matches to keep.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Converts the query into an audit filter.
    ///
    /// The limit defaults to, and is capped at, [`MAX_AUDIT_QUERY_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns a message when a time bound is not RFC 3339.
    pub fn to_filter(&self) -> Result<AuditFilter, String> {
        Ok(AuditFilter {
            request_id: self.request_id.clone().map(RequestId::new),
            tool_name: self.tool_name.clone().map(ToolName::new),
            event_type: self.event_type,
            since: parse_time("since", self.since.as_deref())?,
            until: parse_time("until", self.until.as_deref())?,
            limit: Some(self.limit.unwrap_or(MAX_AUDIT_QUERY_LIMIT).min(MAX_AUDIT_QUERY_LIMIT)),
        })
    }
}

/// Parses an optional RFC 3339 bound.
fn parse_time(field: &str, value: Option<&str>) -> Result<Option<OffsetDateTime>, String> {
    value
        .map(|text| {
            OffsetDateTime::parse(text, &Rfc3339).map_err(|_| format!("{field} must be RFC 3339"))
        })
        .transpose()
}

/// `audit/query` result payload.
#[derive(Debug, Serialize)]
struct AuditQueryResult {
    /// Number of events returned.
    count: usize,
    /// Matching events in timestamp order.
    events: Vec<AuditEvent>,
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Protocol-level method failures.
#[derive(Debug, thiserror::Error)]
enum RpcFailure {
    /// Unknown method.
    #[error("method not found")]
    MethodNotFound,
    /// Bad parameters.
    #[error("{0}")]
    InvalidParams(String),
    /// Admin methods are disabled.
    #[error("admin methods are disabled")]
    AdminDisabled,
    /// Server-side failure.
    #[error("{0}")]
    Internal(String),
    /// Result encoding failed.
    #[error("serialization failed")]
    Serialization,
}

impl RpcFailure {
    /// Maps the failure onto an HTTP status and JSON-RPC error.
    fn into_response(self, id: Value) -> (StatusCode, JsonRpcResponse) {
        let (status, code) = match &self {
            Self::MethodNotFound => (StatusCode::BAD_REQUEST, METHOD_NOT_FOUND),
            Self::InvalidParams(_) => (StatusCode::BAD_REQUEST, INVALID_PARAMS),
            Self::AdminDisabled => (StatusCode::FORBIDDEN, ADMIN_DISABLED),
            Self::Internal(_) => (StatusCode::OK, INTERNAL_ERROR),
            Self::Serialization => (StatusCode::OK, SERIALIZATION_ERROR),
        };
        (status, JsonRpcResponse::failure(id, code, self.to_string()))
    }
}

/// Encodes a method result.
fn to_result<T: Serialize>(value: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(value).map_err(|_| RpcFailure::Serialization)
}

/// Decodes method parameters; absent parameters decode as `{}`.
fn parse_params<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, RpcFailure> {
    let params = match params {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(params).map_err(|err| RpcFailure::InvalidParams(err.to_string()))
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// JSON-RPC method router over a dispatcher.
#[derive(Clone)]
pub struct RpcHandler {
    /// Request path.
    dispatcher: ToolDispatcher,
    /// Configuration the runtime was built from.
    config: Arc<ToolgateConfig>,
}

impl RpcHandler {
    /// Creates a handler.
    #[must_use]
    pub const fn new(dispatcher: ToolDispatcher, config: Arc<ToolgateConfig>) -> Self {
        Self {
            dispatcher,
            config,
        }
    }

    /// Returns the maximum accepted request size in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.config.server.max_body_bytes
    }

    /// Parses and handles a raw request body.
    pub async fn handle_bytes(
        &self,
        context: &RequestContext,
        bytes: &[u8],
    ) -> (StatusCode, JsonRpcResponse) {
        if bytes.len() > self.max_body_bytes() {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                JsonRpcResponse::failure(Value::Null, BODY_TOO_LARGE, "request body too large"),
            );
        }
        match serde_json::from_slice::<JsonRpcRequest>(bytes) {
            Ok(request) => self.handle(context, request).await,
            Err(_) => (
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::failure(Value::Null, INVALID_REQUEST, "invalid json-rpc request"),
            ),
        }
    }

    /// Handles a parsed request.
    pub async fn handle(
        &self,
        context: &RequestContext,
        request: JsonRpcRequest,
    ) -> (StatusCode, JsonRpcResponse) {
        let id = request.id;
        if request.jsonrpc != JSONRPC_VERSION {
            return (
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::failure(id, INVALID_REQUEST, "invalid json-rpc version"),
            );
        }
        let outcome = match request.method.as_str() {
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(context, request.params).await,
            "health" => to_result(&self.health()),
            "audit/query" => match parse_params::<AuditQuery>(request.params) {
                Ok(query) => self.query_audit(&query).await,
                Err(failure) => Err(failure),
            },
            "admin/policy_reload" => self.reload_policy(),
            _ => Err(RpcFailure::MethodNotFound),
        };
        match outcome {
            Ok(result) => (StatusCode::OK, JsonRpcResponse::success(id, result)),
            Err(failure) => failure.into_response(id),
        }
    }

    /// Returns the health payload.
    #[must_use]
    pub fn health(&self) -> Value {
        let table = self.dispatcher.guardian().policy().snapshot();
        json!({
            "ok": true,
            "version": env!("CARGO_PKG_VERSION"),
            "policy_version": table.version(),
            "policy_digest": table.digest().ok().map(|digest| digest.value),
        })
    }

    /// Runs an audit query off the async workers.
    ///
    /// # Errors
    ///
    /// Returns a message when the query is invalid or the log cannot be read.
    pub async fn audit_events(&self, query: &AuditQuery) -> Result<Vec<AuditEvent>, String> {
        let filter = query.to_filter()?;
        let audit = self.dispatcher.guardian().audit().clone();
        tokio::task::spawn_blocking(move || audit.query(&filter))
            .await
            .map_err(|err| err.to_string())?
            .map_err(|err| err.to_string())
    }

    /// Lists registered tools with their policy status.
    fn list_tools(&self) -> Result<Value, RpcFailure> {
        let table = self.dispatcher.guardian().policy().snapshot();
        let tools: Vec<Value> = self
            .dispatcher
            .describe_tools()
            .into_iter()
            .map(|tool| {
                let entry = table.get(&tool.name);
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "allowed": entry.is_some_and(|entry| entry.allowed),
                    "timeout_seconds": entry.map(|entry| entry.timeout_seconds),
                    "max_payload_bytes": entry.map(|entry| entry.max_payload_bytes),
                })
            })
            .collect();
        Ok(json!({ "tools": tools, "policy_version": table.version() }))
    }

    /// Invokes one tool through the dispatcher.
    async fn call_tool(
        &self,
        context: &RequestContext,
        params: Option<Value>,
    ) -> Result<Value, RpcFailure> {
        let params: ToolCallParams = parse_params(params)?;
        let arguments = match params.arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(RpcFailure::InvalidParams("arguments must be an object".to_string()));
            }
        };
        let mut request = ToolRequest::new(params.name, arguments)
            .with_user_id(params.user_id.or_else(|| context.user_id.clone()))
            .with_session_id(params.session_id.or_else(|| context.session_id.clone()));
        if let Some(request_id) = params.request_id {
            if request_id.trim().is_empty() {
                return Err(RpcFailure::InvalidParams("request_id must be non-empty".to_string()));
            }
            request = request.with_request_id(RequestId::new(request_id));
        }
        let result = self.dispatcher.try_invoke(request).await.map_err(|err| match err {
            DispatchError::DuplicateRequestId(_) => RpcFailure::InvalidParams(err.to_string()),
            DispatchError::Ledger(_) => RpcFailure::Internal(err.to_string()),
        })?;
        to_result(&result)
    }

    /// Runs `audit/query`.
    async fn query_audit(&self, query: &AuditQuery) -> Result<Value, RpcFailure> {
        query.to_filter().map_err(RpcFailure::InvalidParams)?;
        let events = self.audit_events(query).await.map_err(RpcFailure::Internal)?;
        to_result(&AuditQueryResult {
            count: events.len(),
            events,
        })
    }

    /// Runs `admin/policy_reload`.
    fn reload_policy(&self) -> Result<Value, RpcFailure> {
        if !self.config.server.admin_enabled {
            return Err(RpcFailure::AdminDisabled);
        }
        let table = self.config.reload_policy_table().map_err(|err| RpcFailure::Internal(err.to_string()))?;
        let guardian = self.dispatcher.guardian();
        let version = table.version().to_string();
        let tools = table.len();
        let previous = guardian.policy().reload(table);
        tracing::info!(
            previous_version = previous.version(),
            policy_version = version.as_str(),
            tools,
            "policy reloaded"
        );
        guardian.audit().append(&AuditEvent::system(format!(
            "policy reloaded: {} -> {version}",
            previous.version()
        )));
        Ok(json!({
            "previous_version": previous.version(),
            "policy_version": version,
            "tools": tools,
        }))
    }
}
