// crates/toolgate-core/src/core/audit.rs
// ============================================================================
// Module: Toolgate Audit Events
// Description: Structured audit records and query filters.
// Purpose: Define the append-only event shape shared by every audit sink.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Audit events record guardian decisions (`security_event`), terminal tool
//! outcomes (`tool_call`), and runtime lifecycle notes (`system_event`).
//! Payload fields hold redacted copies only; callers redact before building
//! an event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::RequestId;
use crate::core::identifiers::ToolName;
use crate::core::request::ToolRequest;

// ============================================================================
// SECTION: Event Classification
// ============================================================================

/// Audit event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Terminal outcome of an admitted tool invocation.
    ToolCall,
    /// Guardian admit/deny decision.
    SecurityEvent,
    /// Runtime lifecycle event (startup, policy reload, maintenance).
    SystemEvent,
}

impl AuditEventType {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToolCall => "tool_call",
            Self::SecurityEvent => "security_event",
            Self::SystemEvent => "system_event",
        }
    }
}

/// Outcome recorded on an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Tool completed successfully.
    Success,
    /// Tool failed.
    Error,
    /// Tool exceeded its budget.
    Timeout,
    /// Guardian refused the request.
    Denied,
    /// Guardian admitted the request; a `tool_call` event follows.
    Admitted,
    /// Informational lifecycle note.
    Info,
}

impl AuditOutcome {
    /// Returns true for outcomes that end a request.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Timeout | Self::Denied)
    }

    /// Returns true for terminal outcomes counted as failures.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Timeout | Self::Denied)
    }
}

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Correlation id of the request (absent for lifecycle events).
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Event category.
    pub event_type: AuditEventType,
    /// Event outcome.
    pub outcome: AuditOutcome,
    /// Tool involved, when any.
    #[serde(default)]
    pub tool_name: Option<ToolName>,
    /// Redacted request arguments.
    #[serde(default)]
    pub input_data: Option<Value>,
    /// Redacted tool output.
    #[serde(default)]
    pub output_data: Option<Value>,
    /// Calling user when known.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Calling session when known.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Elapsed milliseconds for the recorded step.
    #[serde(default)]
    pub duration_ms: Option<f64>,
    /// Failure message.
    #[serde(default)]
    pub error: Option<String>,
    /// Guardian or lifecycle reason label.
    #[serde(default)]
    pub reason: Option<String>,
}

impl AuditEvent {
    /// Builds an event correlated with `request`, stamped now.
    fn for_request(
        request: &ToolRequest,
        event_type: AuditEventType,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            request_id: Some(request.request_id.clone()),
            event_type,
            outcome,
            tool_name: Some(request.tool_name.clone()),
            input_data: None,
            output_data: None,
            user_id: request.user_id.clone(),
            session_id: request.session_id.clone(),
            duration_ms: None,
            error: None,
            reason: None,
        }
    }

    /// Builds a `tool_call` event for a terminal tool outcome.
    #[must_use]
    pub fn tool_call(request: &ToolRequest, outcome: AuditOutcome) -> Self {
        Self::for_request(request, AuditEventType::ToolCall, outcome)
    }

    /// Builds a `security_event` for a guardian decision.
    #[must_use]
    pub fn security(request: &ToolRequest, outcome: AuditOutcome, reason: &str) -> Self {
        let mut event = Self::for_request(request, AuditEventType::SecurityEvent, outcome);
        event.reason = Some(reason.to_string());
        event
    }

    /// Builds a `system_event` lifecycle note.
    #[must_use]
    pub fn system(reason: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            request_id: None,
            event_type: AuditEventType::SystemEvent,
            outcome: AuditOutcome::Info,
            tool_name: None,
            input_data: None,
            output_data: None,
            user_id: None,
            session_id: None,
            duration_ms: None,
            error: None,
            reason: Some(reason.into()),
        }
    }

    /// Sets the redacted input payload.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input_data = Some(input);
        self
    }

    /// Sets the redacted output payload.
    #[must_use]
    pub fn with_output(mut self, output: Option<Value>) -> Self {
        self.output_data = output;
        self
    }

    /// Sets the elapsed time.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the failure message.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Overrides the timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns true when this event is the terminal record of a request.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        match self.event_type {
            AuditEventType::ToolCall => self.outcome.is_terminal(),
            AuditEventType::SecurityEvent => matches!(self.outcome, AuditOutcome::Denied),
            AuditEventType::SystemEvent => false,
        }
    }
}

// ============================================================================
// SECTION: Query Filter
// ============================================================================

/// Audit query filter. All present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Match a single request.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Match a single tool.
    #[serde(default)]
    pub tool_name: Option<ToolName>,
    /// Match a single event category.
    #[serde(default)]
    pub event_type: Option<AuditEventType>,
    /// Inclusive lower time bound.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub since: Option<OffsetDateTime>,
    /// Inclusive upper time bound.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub until: Option<OffsetDateTime>,
    /// Keep only the most recent `limit` matches.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Filter for every event of one request.
    #[must_use]
    pub fn by_request(request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::default()
        }
    }

    /// Filter for every event of one tool.
    #[must_use]
    pub fn by_tool(tool_name: ToolName) -> Self {
        Self {
            tool_name: Some(tool_name),
            ..Self::default()
        }
    }

    /// Filter for the most recent `limit` events.
    #[must_use]
    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Returns true when `event` satisfies every present criterion.
    #[must_use]
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(request_id) = &self.request_id
            && event.request_id.as_ref() != Some(request_id)
        {
            return false;
        }
        if let Some(tool_name) = &self.tool_name
            && event.tool_name.as_ref() != Some(tool_name)
        {
            return false;
        }
        if let Some(event_type) = self.event_type
            && event.event_type != event_type
        {
            return false;
        }
        if let Some(since) = self.since
            && event.timestamp < since
        {
            return false;
        }
        if let Some(until) = self.until
            && event.timestamp > until
        {
            return false;
        }
        true
    }

    /// Applies the filter to `events` and returns matches in chronological order.
    ///
    /// Input order is treated as arrival order and breaks timestamp ties.
    #[must_use]
    pub fn apply(&self, events: impl IntoIterator<Item = AuditEvent>) -> Vec<AuditEvent> {
        let mut matched: Vec<AuditEvent> =
            events.into_iter().filter(|event| self.matches(event)).collect();
        sort_chronological(&mut matched);
        if let Some(limit) = self.limit
            && matched.len() > limit
        {
            matched.drain(..matched.len() - limit);
        }
        matched
    }
}

/// Sorts events by timestamp, preserving arrival order for ties.
pub fn sort_chronological(events: &mut [AuditEvent]) {
    events.sort_by_key(|event| event.timestamp);
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only audit fixtures.")]

    use serde_json::Map;
    use time::Duration;
    use time::OffsetDateTime;

    use super::AuditEvent;
    use super::AuditFilter;
    use super::AuditOutcome;
    use crate::core::identifiers::ToolName;
    use crate::core::request::ToolRequest;

    fn event(tool: &str, offset_secs: i64, reason: &str) -> AuditEvent {
        let request = ToolRequest::new(tool, Map::new());
        let base = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000);
        AuditEvent::security(&request, AuditOutcome::Admitted, reason)
            .at(base + Duration::seconds(offset_secs))
    }

    #[test]
    fn apply_sorts_by_timestamp_and_keeps_arrival_order_for_ties() {
        let events = vec![event("b", 5, "late"), event("a", 1, "first"), event("a", 1, "second")];
        let sorted = AuditFilter::default().apply(events);
        let reasons: Vec<_> = sorted.iter().map(|e| e.reason.clone().unwrap()).collect();
        assert_eq!(reasons, vec!["first", "second", "late"]);
    }

    #[test]
    fn limit_keeps_most_recent_matches() {
        let events = vec![event("a", 1, "one"), event("a", 2, "two"), event("a", 3, "three")];
        let recent = AuditFilter::recent(2).apply(events);
        let reasons: Vec<_> = recent.iter().map(|e| e.reason.clone().unwrap()).collect();
        assert_eq!(reasons, vec!["two", "three"]);
    }

    #[test]
    fn tool_filter_excludes_other_tools() {
        let filter = AuditFilter::by_tool(ToolName::new("a"));
        assert!(filter.matches(&event("a", 0, "x")));
        assert!(!filter.matches(&event("b", 0, "x")));
        assert!(!filter.matches(&AuditEvent::system("startup")));
    }

    #[test]
    fn time_window_is_inclusive() {
        let target = event("a", 10, "x");
        let filter = AuditFilter {
            since: Some(target.timestamp),
            until: Some(target.timestamp),
            ..AuditFilter::default()
        };
        assert!(filter.matches(&target));
    }
}
