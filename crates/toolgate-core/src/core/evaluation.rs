// crates/toolgate-core/src/core/evaluation.rs
// ============================================================================
// Module: Toolgate Evaluation Types
// Description: Gate specifications, verdicts, and evaluation run records.
// Purpose: Define the artifacts produced by an evaluation gate run.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`GateSpec`] compares one aggregate metric against a threshold. An
//! [`EvaluationRun`] carries per-question metrics, aggregates, and gate
//! verdicts; it is complete when returned and never updated afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Gate Specification
// ============================================================================

/// Threshold comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Metric must be greater than or equal to the threshold.
    Gte,
    /// Metric must be less than or equal to the threshold.
    Lte,
}

impl Comparison {
    /// Returns true when `value` satisfies the comparison.
    #[must_use]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gte => value >= threshold,
            Self::Lte => value <= threshold,
        }
    }

    /// Returns the operator symbol used in reports.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// Threshold gate over an aggregate metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    /// Gate label; defaults to the metric name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Aggregate metric the gate reads.
    pub metric_name: String,
    /// Comparison operator.
    pub comparison: Comparison,
    /// Threshold value.
    pub threshold: f64,
}

impl GateSpec {
    /// Builds an unnamed gate.
    #[must_use]
    pub fn new(metric_name: impl Into<String>, comparison: Comparison, threshold: f64) -> Self {
        Self {
            name: None,
            metric_name: metric_name.into(),
            comparison,
            threshold,
        }
    }

    /// Returns the gate label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.metric_name)
    }
}

/// Verdict of a single gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Gate label.
    pub name: String,
    /// Metric the gate read.
    pub metric_name: String,
    /// Comparison operator.
    pub comparison: Comparison,
    /// Threshold value.
    pub threshold: f64,
    /// Aggregate value, absent when the metric was not produced.
    pub actual: Option<f64>,
    /// Whether the gate passed.
    pub passed: bool,
}

// ============================================================================
// SECTION: Evaluation Run
// ============================================================================

/// Metrics for one dataset item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Dataset item identifier.
    pub question_id: String,
    /// Metric values keyed by metric name.
    pub metrics: BTreeMap<String, f64>,
    /// Wall time of the item in milliseconds; kept apart from `metrics`.
    #[serde(default)]
    pub latency_ms: f64,
    /// Failure reason when the item fell back to worst-case values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Completed evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    /// Run identifier.
    pub run_id: String,
    /// Dataset reference the run read.
    pub dataset_ref: String,
    /// Ordering seed.
    pub seed: u64,
    /// Start time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Finish time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    /// Per-item results in processing order.
    pub per_question_results: Vec<QuestionResult>,
    /// Aggregate metrics keyed by metric name. Identical for identical
    /// seed, dataset, and tool outputs.
    pub aggregate_metrics: BTreeMap<String, f64>,
    /// Wall-clock aggregates (`latency_ms`, `latency_p95_ms`). Gates may read
    /// them, but they vary between runs.
    #[serde(default)]
    pub timing_metrics: BTreeMap<String, f64>,
    /// Gate verdicts keyed by gate label.
    pub gate_verdicts: BTreeMap<String, bool>,
    /// Detailed verdicts in gate-table order.
    pub gate_details: Vec<GateVerdict>,
    /// Logical AND of all gate verdicts.
    pub overall_pass: bool,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
