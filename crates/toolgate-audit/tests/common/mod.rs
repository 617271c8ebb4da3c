// crates/toolgate-audit/tests/common/mod.rs
// =============================================================================
// Module: Audit Test Helpers
// Description: Event and timestamp fixtures for audit tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Fixtures use fixed, valid calendar values.")]

use serde_json::Map;
use time::Date;
use time::Month;
use time::OffsetDateTime;
use toolgate_core::AuditEvent;
use toolgate_core::AuditOutcome;
use toolgate_core::ToolRequest;

/// Returns a UTC timestamp on March 2026.
pub fn march(day: u8, hour: u8, minute: u8, second: u8) -> OffsetDateTime {
    Date::from_calendar_date(2026, Month::March, day)
        .unwrap()
        .with_hms(hour, minute, second)
        .unwrap()
        .assume_utc()
}

/// Returns the UTC date on March 2026.
pub fn march_date(day: u8) -> Date {
    Date::from_calendar_date(2026, Month::March, day).unwrap()
}

/// Builds a terminal tool call event.
pub fn call(tool: &str, outcome: AuditOutcome, at: OffsetDateTime, duration_ms: f64) -> AuditEvent {
    AuditEvent::tool_call(&ToolRequest::new(tool, Map::new()), outcome)
        .at(at)
        .with_duration_ms(duration_ms)
}

/// Builds a denial event for `tool` from `user`.
pub fn denial(tool: &str, user: Option<&str>, at: OffsetDateTime) -> AuditEvent {
    let request =
        ToolRequest::new(tool, Map::new()).with_user_id(user.map(ToString::to_string));
    AuditEvent::security(&request, AuditOutcome::Denied, "not allowed by security policy").at(at)
}
