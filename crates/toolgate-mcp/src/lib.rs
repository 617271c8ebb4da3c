// crates/toolgate-mcp/src/lib.rs
// ============================================================================
// Module: Toolgate MCP
// Description: JSON-RPC 2.0 server for gated tool invocation.
// Purpose: Expose the dispatcher, health, and audit queries over stdio and HTTP.
// Dependencies: toolgate-core, toolgate-config, toolgate-audit, axum, tokio
// ============================================================================

//! ## Overview
//! [`ToolgateRuntime`] assembles the policy store, redactor, file audit log,
//! built-in tools, and dispatcher from a [`toolgate_config::ToolgateConfig`].
//! [`RpcHandler`] maps JSON-RPC methods onto that runtime and [`McpServer`]
//! serves it over `Content-Length` framed stdio or HTTP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod framing;
pub mod rpc;
pub mod runtime;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use framing::Frame;
pub use framing::read_framed;
pub use framing::write_framed;
pub use rpc::AuditQuery;
pub use rpc::JsonRpcError;
pub use rpc::JsonRpcRequest;
pub use rpc::JsonRpcResponse;
pub use rpc::RequestContext;
pub use rpc::RpcHandler;
pub use runtime::ToolgateRuntime;
pub use server::McpServer;
pub use server::McpServerError;
pub use server::build_router;
pub use server::serve_framed;
