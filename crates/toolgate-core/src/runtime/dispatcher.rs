// crates/toolgate-core/src/runtime/dispatcher.rs
// ============================================================================
// Module: Toolgate Tool Dispatcher
// Description: Guarded, time-bounded tool execution.
// Purpose: Turn every tool request into exactly one ToolResult and one terminal event.
// Dependencies: crate::{core, interfaces, runtime}, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ToolDispatcher::invoke`] asks the [`Guardian`] for admission, resolves
//! the tool, and runs it on its own task under the policy timeout. Whatever
//! happens (denial, unknown tool, tool error, panic, timeout) the caller
//! receives a well-formed [`ToolResult`].
//!
//! Event accounting: a denial is recorded by the guardian's `security_event`
//! and nothing else. An admitted request gets exactly one `tool_call` event
//! from the dispatcher. A timed-out task is aborted and its eventual result
//! is dropped without being logged.
//!
//! Request ids are claimed in a [`RequestLedger`] before admission. A reused
//! id is rejected without running the tool or writing any event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::core::AuditEvent;
use crate::core::AuditOutcome;
use crate::core::ToolRequest;
use crate::core::ToolResult;
use crate::interfaces::ToolDescriptor;
use crate::interfaces::ToolRegistry;
use crate::runtime::guardian::Decision;
use crate::runtime::guardian::Guardian;
use crate::runtime::request_ledger::DispatchError;
use crate::runtime::request_ledger::RequestLedger;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error string for invocations that exceed their budget.
pub const TIMEOUT_ERROR: &str = "timeout";

// ============================================================================
// SECTION: Execution Outcome
// ============================================================================

/// Raw execution outcome before redaction.
enum Execution {
    /// Tool returned a value.
    Succeeded(Value),
    /// Tool failed, panicked, or could not be resolved.
    Failed(String),
    /// Tool exceeded its budget.
    TimedOut,
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Request-path entry point.
#[derive(Clone)]
pub struct ToolDispatcher {
    /// Admission control.
    guardian: Arc<Guardian>,
    /// Tool lookup.
    registry: Arc<dyn ToolRegistry>,
    /// Claimed request ids.
    ledger: Arc<RequestLedger>,
}

impl ToolDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(guardian: Arc<Guardian>, registry: Arc<dyn ToolRegistry>) -> Self {
        Self::with_ledger(guardian, registry, RequestLedger::default())
    }

    /// Creates a dispatcher with an explicit request ledger.
    #[must_use]
    pub fn with_ledger(
        guardian: Arc<Guardian>,
        registry: Arc<dyn ToolRegistry>,
        ledger: RequestLedger,
    ) -> Self {
        Self {
            guardian,
            registry,
            ledger: Arc::new(ledger),
        }
    }

    /// Returns the guardian.
    #[must_use]
    pub const fn guardian(&self) -> &Arc<Guardian> {
        &self.guardian
    }

    /// Lists registered tools.
    #[must_use]
    pub fn describe_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.describe()
    }

    /// Invokes a tool and returns its terminal result.
    ///
    /// A rejected request id yields a failed result carrying the rejection
    /// message; no event is written for it.
    pub async fn invoke(&self, request: ToolRequest) -> ToolResult {
        let request_id = request.request_id.clone();
        match self.try_invoke(request).await {
            Ok(result) => result,
            Err(err) => ToolResult::failed(request_id, err.to_string(), 0.0),
        }
    }

    /// Invokes a tool after claiming its request id.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the request id was already claimed.
    pub async fn try_invoke(&self, request: ToolRequest) -> Result<ToolResult, DispatchError> {
        self.ledger.claim(&request.request_id)?;
        Ok(self.run_claimed(request).await)
    }

    /// Admits, runs, and records a request whose id is claimed.
    async fn run_claimed(&self, request: ToolRequest) -> ToolResult {
        let started = Instant::now();
        let timeout = match self.guardian.admit(&request) {
            Decision::Allow {
                timeout,
            } => timeout,
            Decision::Deny {
                reason,
            } => {
                return ToolResult::denied(request.request_id, reason, elapsed_ms(started));
            }
        };
        let execution = self.execute(&request, timeout).await;
        let duration_ms = elapsed_ms(started);
        let input = self.guardian.redact_for_audit(&request.arguments_value());
        let (result, event) = match execution {
            Execution::Succeeded(output) => {
                let logged = self.guardian.redact_for_audit(&output);
                let visible = self.guardian.redact_output(output);
                (
                    ToolResult::succeeded(request.request_id.clone(), visible, duration_ms),
                    AuditEvent::tool_call(&request, AuditOutcome::Success)
                        .with_output(Some(logged)),
                )
            }
            Execution::Failed(message) => (
                ToolResult::failed(request.request_id.clone(), message.clone(), duration_ms),
                AuditEvent::tool_call(&request, AuditOutcome::Error).with_error(Some(message)),
            ),
            Execution::TimedOut => {
                tracing::warn!(
                    tool = request.tool_name.as_str(),
                    request_id = request.request_id.as_str(),
                    timeout_ms = timeout.as_secs_f64() * 1000.0,
                    "tool invocation timed out"
                );
                (
                    ToolResult::failed(request.request_id.clone(), TIMEOUT_ERROR, duration_ms),
                    AuditEvent::tool_call(&request, AuditOutcome::Timeout)
                        .with_error(Some(TIMEOUT_ERROR.to_string())),
                )
            }
        };
        self.guardian.audit().append(&event.with_input(input).with_duration_ms(duration_ms));
        result
    }

    /// Resolves and runs the tool on its own task under `timeout`.
    async fn execute(&self, request: &ToolRequest, timeout: Duration) -> Execution {
        let Some(tool) = self.registry.resolve(request.tool_name.as_str()) else {
            return Execution::Failed(format!("tool not registered: {}", request.tool_name));
        };
        let arguments = request.arguments.clone();
        let mut handle = tokio::spawn(async move { tool.call(arguments).await });
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(output))) => Execution::Succeeded(output),
            Ok(Ok(Err(err))) => Execution::Failed(err.to_string()),
            Ok(Err(join_err)) => {
                let message = if join_err.is_panic() { "tool panicked" } else { "tool cancelled" };
                Execution::Failed(message.to_string())
            }
            Err(_) => {
                handle.abort();
                Execution::TimedOut
            }
        }
    }
}

/// Milliseconds elapsed since `started`.
fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
