// crates/toolgate-core/src/runtime/guardian.rs
// ============================================================================
// Module: Toolgate Guardian
// Description: Policy enforcement point for tool invocations.
// Purpose: Admit or deny requests and record every decision as a security event.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! The guardian reads one policy snapshot per request and decides in order:
//! unlisted or disabled tools are denied, oversized arguments are denied,
//! everything else is admitted with the tool's timeout. Each decision is
//! written to the audit log as a `security_event` carrying the redacted
//! arguments. Denials are final; nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;

use crate::core::AuditEvent;
use crate::core::AuditOutcome;
use crate::core::PolicyTable;
use crate::core::ToolRequest;
use crate::interfaces::AuditLog;
use crate::runtime::policy_store::PolicyStore;
use crate::runtime::redactor::Redactor;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Denial reason for unlisted or disabled tools.
pub const DENY_NOT_ALLOWED: &str = "not allowed by security policy";
/// Denial reason for arguments over the size limit.
pub const DENY_PAYLOAD_TOO_LARGE: &str = "payload too large";
/// Reason recorded on admitted requests.
const ADMIT_REASON: &str = "allowed";

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Guardian verdict for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Request may run within `timeout`.
    Allow {
        /// Execution budget.
        timeout: Duration,
    },
    /// Request is refused.
    Deny {
        /// Denial reason.
        reason: String,
    },
}

impl Decision {
    /// Returns true for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

// ============================================================================
// SECTION: Guardian
// ============================================================================

/// Admission control and payload redaction for the request path.
pub struct Guardian {
    /// Live allowlist.
    policy: Arc<PolicyStore>,
    /// Payload redactor.
    redactor: Arc<Redactor>,
    /// Audit sink for decisions.
    audit: Arc<dyn AuditLog>,
    /// Whether caller-visible outputs are redacted.
    redact_outputs: bool,
}

impl Guardian {
    /// Creates a guardian that redacts caller-visible outputs.
    #[must_use]
    pub fn new(policy: Arc<PolicyStore>, redactor: Arc<Redactor>, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            policy,
            redactor,
            audit,
            redact_outputs: true,
        }
    }

    /// Sets whether caller-visible outputs are redacted.
    #[must_use]
    pub fn with_output_redaction(mut self, enabled: bool) -> Self {
        self.redact_outputs = enabled;
        self
    }

    /// Returns the policy store.
    #[must_use]
    pub const fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    /// Decides whether `request` may run and records the decision.
    #[must_use]
    pub fn admit(&self, request: &ToolRequest) -> Decision {
        let started = Instant::now();
        let snapshot = self.policy.snapshot();
        let decision = decide(&snapshot, request);
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let input = self.redactor.redact(&request.arguments_value());
        let event = match &decision {
            Decision::Allow {
                ..
            } => AuditEvent::security(request, AuditOutcome::Admitted, ADMIT_REASON),
            Decision::Deny {
                reason,
            } => {
                tracing::info!(
                    tool = request.tool_name.as_str(),
                    request_id = request.request_id.as_str(),
                    reason = reason.as_str(),
                    "tool request denied"
                );
                AuditEvent::security(request, AuditOutcome::Denied, reason)
                    .with_error(Some(reason.clone()))
            }
        };
        self.audit.append(&event.with_input(input).with_duration_ms(duration_ms));
        decision
    }

    /// Returns a redacted copy of `value` for the audit log.
    #[must_use]
    pub fn redact_for_audit(&self, value: &Value) -> Value {
        self.redactor.redact(value)
    }

    /// Returns `value` as the caller should see it.
    #[must_use]
    pub fn redact_output(&self, value: Value) -> Value {
        if self.redact_outputs { self.redactor.redact(&value) } else { value }
    }
}

/// Applies the admission rules against one policy snapshot.
fn decide(table: &PolicyTable, request: &ToolRequest) -> Decision {
    let Some(entry) = table.get(request.tool_name.as_str()).filter(|entry| entry.allowed) else {
        return Decision::Deny {
            reason: DENY_NOT_ALLOWED.to_string(),
        };
    };
    if request.payload_bytes() > entry.max_payload_bytes {
        return Decision::Deny {
            reason: DENY_PAYLOAD_TOO_LARGE.to_string(),
        };
    }
    Decision::Allow {
        timeout: entry.timeout(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
