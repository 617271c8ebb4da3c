// crates/toolgate-audit/src/metrics.rs
// ============================================================================
// Module: Audit Metrics
// Description: Operational metrics derived from audit events.
// Purpose: Error rates, latency percentiles, and activity summaries.
// Dependencies: serde, time, toolgate-core
// ============================================================================

//! ## Overview
//! Metrics count terminal events only: one per request outcome. Denials
//! count as failures but carry no execution latency, so latency percentiles
//! cover non-denied outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use time::OffsetDateTime;
use time::UtcOffset;
use toolgate_core::AuditEvent;
use toolgate_core::AuditOutcome;
use toolgate_core::LatencySummary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User label for events without a user id.
pub const ANONYMOUS_USER: &str = "anonymous";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-tool failure counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolErrorRate {
    /// Tool name.
    pub tool_name: String,
    /// Terminal events for the tool.
    pub total: usize,
    /// Failed terminal events (error, timeout, denied).
    pub failures: usize,
    /// `failures / total`.
    pub error_rate: f64,
}

/// Summary over a set of audit events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditMetrics {
    /// Events examined.
    pub total_events: usize,
    /// Terminal events (request outcomes).
    pub terminal_events: usize,
    /// Successful outcomes.
    pub successes: usize,
    /// Failed outcomes.
    pub errors: usize,
    /// Timed-out outcomes.
    pub timeouts: usize,
    /// Denied outcomes.
    pub denied: usize,
    /// `(errors + timeouts + denied) / terminal_events`; zero when empty.
    pub error_rate: f64,
    /// Latency over non-denied outcomes carrying a duration.
    pub latency: Option<LatencySummary>,
    /// Tools ordered by error rate, then volume, then name.
    pub tools: Vec<ToolErrorRate>,
    /// Terminal events per UTC hour (`YYYY-MM-DDTHH:00Z`).
    pub volume_by_hour: BTreeMap<String, usize>,
    /// Terminal events per user id.
    pub user_activity: BTreeMap<String, usize>,
}

impl AuditMetrics {
    /// Computes metrics over `events`.
    #[must_use]
    pub fn from_events(events: &[AuditEvent]) -> Self {
        let mut metrics = Self {
            total_events: events.len(),
            ..Self::default()
        };
        let mut durations = Vec::new();
        let mut per_tool: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for event in events.iter().filter(|event| event.is_terminal()) {
            metrics.terminal_events += 1;
            match event.outcome {
                AuditOutcome::Success => metrics.successes += 1,
                AuditOutcome::Error => metrics.errors += 1,
                AuditOutcome::Timeout => metrics.timeouts += 1,
                AuditOutcome::Denied => metrics.denied += 1,
                AuditOutcome::Admitted | AuditOutcome::Info => {}
            }
            if event.outcome != AuditOutcome::Denied
                && let Some(duration_ms) = event.duration_ms
            {
                durations.push(duration_ms);
            }
            if let Some(tool_name) = &event.tool_name {
                let counts = per_tool.entry(tool_name.as_str().to_string()).or_default();
                counts.0 += 1;
                if event.outcome.is_failure() {
                    counts.1 += 1;
                }
            }
            *metrics.volume_by_hour.entry(hour_bucket(event.timestamp)).or_default() += 1;
            let user = event.user_id.as_deref().unwrap_or(ANONYMOUS_USER);
            *metrics.user_activity.entry(user.to_string()).or_default() += 1;
        }
        metrics.error_rate = ratio(
            metrics.errors + metrics.timeouts + metrics.denied,
            metrics.terminal_events,
        );
        metrics.latency = LatencySummary::from_samples(&durations);
        metrics.tools = per_tool
            .into_iter()
            .map(|(tool_name, (total, failures))| ToolErrorRate {
                tool_name,
                total,
                failures,
                error_rate: ratio(failures, total),
            })
            .collect();
        metrics.tools.sort_by(|a, b| {
            b.error_rate
                .total_cmp(&a.error_rate)
                .then(b.total.cmp(&a.total))
                .then(a.tool_name.cmp(&b.tool_name))
        });
        metrics
    }

    /// Returns the `n` tools with the highest error rate that failed at least once.
    #[must_use]
    pub fn top_failing_tools(&self, n: usize) -> Vec<&ToolErrorRate> {
        self.tools.iter().filter(|tool| tool.failures > 0).take(n).collect()
    }

    /// Renders a Markdown report.
    #[must_use]
    pub fn to_markdown(&self, top_n: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Audit Report\n");
        let _ = writeln!(out, "| Metric | Value |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| Events | {} |", self.total_events);
        let _ = writeln!(out, "| Requests | {} |", self.terminal_events);
        let _ = writeln!(out, "| Successes | {} |", self.successes);
        let _ = writeln!(out, "| Errors | {} |", self.errors);
        let _ = writeln!(out, "| Timeouts | {} |", self.timeouts);
        let _ = writeln!(out, "| Denied | {} |", self.denied);
        let _ = writeln!(out, "| Error rate | {:.2}% |", self.error_rate * 100.0);
        if let Some(latency) = &self.latency {
            let _ = writeln!(out, "| Latency p50 | {:.1} ms |", latency.p50_ms);
            let _ = writeln!(out, "| Latency p95 | {:.1} ms |", latency.p95_ms);
            let _ = writeln!(out, "| Latency p99 | {:.1} ms |", latency.p99_ms);
        }

        let failing = self.top_failing_tools(top_n);
        if !failing.is_empty() {
            let _ = writeln!(out, "\n## Top Failing Tools\n");
            let _ = writeln!(out, "| Tool | Requests | Failures | Error rate |");
            let _ = writeln!(out, "|---|---|---|---|");
            for tool in failing {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:.2}% |",
                    tool.tool_name,
                    tool.total,
                    tool.failures,
                    tool.error_rate * 100.0
                );
            }
        }

        if !self.volume_by_hour.is_empty() {
            let _ = writeln!(out, "\n## Volume by Hour\n");
            let _ = writeln!(out, "| Hour (UTC) | Requests |");
            let _ = writeln!(out, "|---|---|");
            for (hour, count) in &self.volume_by_hour {
                let _ = writeln!(out, "| {hour} | {count} |");
            }
        }

        if !self.user_activity.is_empty() {
            let _ = writeln!(out, "\n## User Activity\n");
            let _ = writeln!(out, "| User | Requests |");
            let _ = writeln!(out, "|---|---|");
            for (user, count) in &self.user_activity {
                let _ = writeln!(out, "| {user} | {count} |");
            }
        }
        out
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the UTC hour bucket label for `timestamp`.
fn hour_bucket(timestamp: OffsetDateTime) -> String {
    let utc = timestamp.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:00Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour()
    )
}

/// Returns `numerator / denominator`, or zero for an empty denominator.
#[allow(clippy::cast_precision_loss, reason = "Event counts stay far below 2^52.")]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}
