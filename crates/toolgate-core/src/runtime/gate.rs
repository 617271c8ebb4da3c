// crates/toolgate-core/src/runtime/gate.rs
// ============================================================================
// Module: Toolgate Gate Evaluator
// Description: Threshold gates over aggregate evaluation metrics.
// Purpose: Produce per-gate verdicts and the overall pass/fail decision.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A gate passes when its metric exists and satisfies the comparison. A
//! missing metric fails its gate. The overall verdict is the conjunction of
//! all gates, so an empty gate table passes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::GateSpec;
use crate::core::GateVerdict;

// ============================================================================
// SECTION: Gate Report
// ============================================================================

/// Result of evaluating a gate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    /// Verdicts in gate-table order.
    pub verdicts: Vec<GateVerdict>,
    /// Logical AND of all verdicts.
    pub overall_pass: bool,
}

impl GateReport {
    /// Returns verdicts keyed by gate label.
    #[must_use]
    pub fn verdict_map(&self) -> BTreeMap<String, bool> {
        self.verdicts.iter().map(|verdict| (verdict.name.clone(), verdict.passed)).collect()
    }
}

// ============================================================================
// SECTION: Gate Evaluator
// ============================================================================

/// Evaluates a fixed gate table.
#[derive(Debug, Clone, Default)]
pub struct GateEvaluator {
    /// Gate table.
    gates: Vec<GateSpec>,
}

impl GateEvaluator {
    /// Creates an evaluator over `gates`.
    #[must_use]
    pub const fn new(gates: Vec<GateSpec>) -> Self {
        Self {
            gates,
        }
    }

    /// Returns the gate table.
    #[must_use]
    pub fn gates(&self) -> &[GateSpec] {
        &self.gates
    }

    /// Evaluates every gate against `aggregates`.
    #[must_use]
    pub fn evaluate(&self, aggregates: &BTreeMap<String, f64>) -> GateReport {
        let verdicts: Vec<GateVerdict> = self
            .gates
            .iter()
            .map(|gate| {
                let actual = aggregates.get(&gate.metric_name).copied();
                let passed =
                    actual.is_some_and(|value| gate.comparison.holds(value, gate.threshold));
                GateVerdict {
                    name: gate.label().to_string(),
                    metric_name: gate.metric_name.clone(),
                    comparison: gate.comparison,
                    threshold: gate.threshold,
                    actual,
                    passed,
                }
            })
            .collect();
        let overall_pass = verdicts.iter().all(|verdict| verdict.passed);
        GateReport {
            verdicts,
            overall_pass,
        }
    }
}
