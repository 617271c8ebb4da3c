// crates/toolgate-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: Stdio and HTTP transports for the JSON-RPC handler.
// Purpose: Serve gated tool invocation to MCP clients.
// Dependencies: axum, tokio, toolgate-config
// ============================================================================

//! ## Overview
//! Stdio reads `Content-Length` frames from stdin and writes responses to
//! stdout; logs go to stderr. Each frame is handled on its own task and
//! responses are written in request order, so a slow tool does not hold up
//! the frames read after it. An oversized frame gets a `BODY_TOO_LARGE`
//! error response and the loop keeps serving. HTTP serves `POST /rpc`, `GET /health`, and
//! `GET /audit`, taking caller identity from the `x-user-id` and
//! `x-session-id` headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncWrite;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use toolgate_config::ServerTransport;
use toolgate_config::ToolgateConfig;
use toolgate_core::AuditEvent;
use toolgate_core::AuditLog;

use crate::framing::Frame;
use crate::framing::read_framed;
use crate::framing::write_framed;
use crate::rpc::AuditQuery;
use crate::rpc::BODY_TOO_LARGE;
use crate::rpc::INTERNAL_ERROR;
use crate::rpc::JsonRpcResponse;
use crate::rpc::RequestContext;
use crate::rpc::RpcHandler;
use crate::runtime::ToolgateRuntime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller user id.
const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller session id.
const SESSION_ID_HEADER: &str = "x-session-id";
/// Stdio requests awaiting their turn to be written.
const MAX_STDIO_IN_FLIGHT: usize = 64;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Assembled request path.
    runtime: ToolgateRuntime,
    /// JSON-RPC handler.
    handler: RpcHandler,
}

impl McpServer {
    /// Builds a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when initialization fails.
    pub fn from_config(config: ToolgateConfig) -> Result<Self, McpServerError> {
        let runtime = ToolgateRuntime::from_config(config)?;
        let handler = RpcHandler::new(runtime.dispatcher().clone(), Arc::clone(runtime.config()));
        Ok(Self {
            runtime,
            handler,
        })
    }

    /// Returns the assembled runtime.
    #[must_use]
    pub const fn runtime(&self) -> &ToolgateRuntime {
        &self.runtime
    }

    /// Returns the JSON-RPC handler.
    #[must_use]
    pub const fn handler(&self) -> &RpcHandler {
        &self.handler
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let server = &self.runtime.config().server;
        let transport = server.transport;
        let label = match transport {
            ServerTransport::Stdio => "stdio",
            ServerTransport::Http => "http",
        };
        tracing::info!(transport = label, admin_enabled = server.admin_enabled, "server starting");
        self.runtime.audit().append(&AuditEvent::system(format!("server started ({label})")));
        match transport {
            ServerTransport::Stdio => serve_stdio(&self.handler).await,
            ServerTransport::Http => {
                let bind = server
                    .bind
                    .clone()
                    .ok_or_else(|| McpServerError::Config("bind address required".to_string()))?;
                serve_http(&bind, self.handler).await
            }
        }
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves JSON-RPC requests over stdin/stdout until stdin closes.
async fn serve_stdio(handler: &RpcHandler) -> Result<(), McpServerError> {
    serve_framed(handler.clone(), BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    tracing::info!("stdin closed; server stopping");
    Ok(())
}

/// Serves framed JSON-RPC read from `reader`, writing responses to `writer`.
///
/// Returns when `reader` reaches a clean end of stream and every pending
/// response has been written.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] for malformed frames or write
/// failures.
pub async fn serve_framed<R, W>(handler: RpcHandler, mut reader: R, mut writer: W) -> Result<(), McpServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (pending_tx, mut pending_rx) = mpsc::channel::<JoinHandle<JsonRpcResponse>>(MAX_STDIO_IN_FLIGHT);
    let writer_task = tokio::spawn(async move {
        while let Some(pending) = pending_rx.recv().await {
            let response = pending.await.unwrap_or_else(|_| {
                JsonRpcResponse::failure(Value::Null, INTERNAL_ERROR, "request handler failed")
            });
            let payload = serde_json::to_vec(&response)
                .map_err(|_| McpServerError::Transport("json-rpc serialization failed".to_string()))?;
            write_framed(&mut writer, &payload).await?;
        }
        Ok::<(), McpServerError>(())
    });

    let limit = handler.max_body_bytes();
    let context = RequestContext::default();
    let read_result = loop {
        let frame = match read_framed(&mut reader, limit).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        };
        let pending = match frame {
            Frame::Payload(bytes) => {
                let handler = handler.clone();
                let context = context.clone();
                tokio::spawn(async move { handler.handle_bytes(&context, &bytes).await.1 })
            }
            Frame::Oversized(len) => {
                tracing::warn!(len, limit, "stdio frame over limit");
                tokio::spawn(async {
                    JsonRpcResponse::failure(Value::Null, BODY_TOO_LARGE, "request body too large")
                })
            }
        };
        if pending_tx.send(pending).await.is_err() {
            break Ok(());
        }
    };
    drop(pending_tx);
    let write_result = writer_task
        .await
        .map_err(|_| McpServerError::Transport("stdio writer failed".to_string()))?;
    read_result?;
    write_result
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Serves JSON-RPC requests over HTTP.
async fn serve_http(bind: &str, handler: RpcHandler) -> Result<(), McpServerError> {
    let addr: SocketAddr =
        bind.parse().map_err(|_| McpServerError::Config("invalid bind address".to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|_| McpServerError::Transport("http bind failed".to_string()))?;
    tracing::info!(%addr, "http listening");
    axum::serve(listener, build_router(handler))
        .await
        .map_err(|_| McpServerError::Transport("http server failed".to_string()))
}

/// Builds the HTTP router.
#[must_use]
pub fn build_router(handler: RpcHandler) -> Router {
    let body_limit = handler.max_body_bytes().saturating_add(1);
    Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/health", get(handle_health))
        .route("/audit", get(handle_audit))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(handler))
}

/// Handles `POST /rpc`.
async fn handle_rpc(
    State(handler): State<Arc<RpcHandler>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> impl IntoResponse {
    let context = http_request_context(&headers);
    let (status, response) = handler.handle_bytes(&context, &bytes).await;
    (status, Json(response))
}

/// Handles `GET /health`.
async fn handle_health(State(handler): State<Arc<RpcHandler>>) -> Json<Value> {
    Json(handler.health())
}

/// Handles `GET /audit`.
async fn handle_audit(
    State(handler): State<Arc<RpcHandler>>,
    Query(query): Query<AuditQuery>,
) -> impl IntoResponse {
    if let Err(message) = query.to_filter() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": message })));
    }
    match handler.audit_events(&query).await {
        Ok(events) => (StatusCode::OK, Json(json!({ "count": events.len(), "events": events }))),
        Err(message) => {
            tracing::warn!(error = message.as_str(), "audit query failed");
            let body = json!({ "error": { "code": INTERNAL_ERROR, "message": message } });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

/// Extracts caller identity from request headers.
fn http_request_context(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    RequestContext {
        user_id: header(USER_ID_HEADER),
        session_id: header(SESSION_ID_HEADER),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
