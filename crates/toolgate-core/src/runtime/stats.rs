// crates/toolgate-core/src/runtime/stats.rs
// ============================================================================
// Module: Toolgate Statistics
// Description: Order-invariant reducers and nearest-rank percentiles.
// Purpose: Aggregate metric samples identically regardless of arrival order.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every reducer sorts its samples before folding, so the result depends only
//! on the multiset of values. Percentiles use the nearest-rank definition:
//! the p-th percentile of N sorted samples is the sample at rank
//! `ceil(p / 100 * N)`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Percentiles
// ============================================================================

/// Returns the nearest-rank `pct`-th percentile of `values`.
///
/// `pct` is clamped to `0..=100`; `0` yields the minimum. Returns `None` for
/// an empty slice.
#[must_use]
pub fn percentile(values: &[f64], pct: u32) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let pct = usize::try_from(pct.min(100)).unwrap_or(100);
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted.get(rank - 1).copied()
}

/// Returns a sorted copy of `values` using total ordering.
fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

// ============================================================================
// SECTION: Reducers
// ============================================================================

/// Aggregation applied to per-item metric samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Arithmetic mean.
    Mean,
    /// Sum (counts and totals).
    Sum,
    /// Maximum.
    Max,
    /// Nearest-rank 95th percentile.
    P95,
}

impl Reducer {
    /// Reduces `values`. Returns `None` for an empty slice, except `Sum`
    /// which returns zero.
    #[must_use]
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Sum => Some(sorted(values).iter().sum()),
            Self::Mean => {
                if values.is_empty() {
                    return None;
                }
                let total: f64 = sorted(values).iter().sum();
                Some(total / count_as_f64(values.len()))
            }
            Self::Max => sorted(values).last().copied(),
            Self::P95 => percentile(values, 95),
        }
    }
}

/// Converts a sample count to `f64`.
#[allow(clippy::cast_precision_loss, reason = "Sample counts stay far below 2^52.")]
const fn count_as_f64(count: usize) -> f64 {
    count as f64
}

// ============================================================================
// SECTION: Latency Summary
// ============================================================================

/// Latency distribution summary in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Sample count.
    pub count: usize,
    /// Mean latency.
    pub mean_ms: f64,
    /// Median latency.
    pub p50_ms: f64,
    /// 95th percentile latency.
    pub p95_ms: f64,
    /// 99th percentile latency.
    pub p99_ms: f64,
}

impl LatencySummary {
    /// Summarizes `durations_ms`. Returns `None` when there are no samples.
    #[must_use]
    pub fn from_samples(durations_ms: &[f64]) -> Option<Self> {
        Some(Self {
            count: durations_ms.len(),
            mean_ms: Reducer::Mean.reduce(durations_ms)?,
            p50_ms: percentile(durations_ms, 50)?,
            p95_ms: percentile(durations_ms, 95)?,
            p99_ms: percentile(durations_ms, 99)?,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only statistics assertions.")]
    #![allow(clippy::float_cmp, reason = "Percentiles return exact sample values.")]

    use super::LatencySummary;
    use super::Reducer;
    use super::percentile;

    #[test]
    fn nearest_rank_percentiles_over_one_to_hundred() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&values, 50), Some(50.0));
        assert_eq!(percentile(&values, 95), Some(95.0));
        assert_eq!(percentile(&values, 99), Some(99.0));
        assert_eq!(percentile(&values, 100), Some(100.0));
        assert_eq!(percentile(&values, 0), Some(1.0));
    }

    #[test]
    fn nearest_rank_rounds_rank_up() {
        let values = [15.0, 20.0, 35.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 30), Some(20.0));
        assert_eq!(percentile(&values, 40), Some(20.0));
        assert_eq!(percentile(&values, 50), Some(35.0));
        assert_eq!(percentile(&values, 100), Some(50.0));
    }

    #[test]
    fn percentile_ignores_input_order() {
        assert_eq!(percentile(&[3.0, 1.0, 2.0], 50), Some(2.0));
        assert_eq!(percentile(&[], 50), None);
    }

    #[test]
    fn reducers_are_order_invariant() {
        let forward = [0.1, 0.2, 0.3, 1e-17, 5.5];
        let backward = [5.5, 1e-17, 0.3, 0.2, 0.1];
        for reducer in [Reducer::Mean, Reducer::Sum, Reducer::Max, Reducer::P95] {
            assert_eq!(reducer.reduce(&forward), reducer.reduce(&backward));
        }
        assert_eq!(Reducer::Sum.reduce(&[]), Some(0.0));
        assert_eq!(Reducer::Mean.reduce(&[]), None);
    }

    #[test]
    fn latency_summary_reports_standard_percentiles() {
        let values: Vec<f64> = (1..=20).map(|v| f64::from(v) * 10.0).collect();
        let summary = LatencySummary::from_samples(&values).unwrap();
        assert_eq!(summary.count, 20);
        assert_eq!(summary.p50_ms, 100.0);
        assert_eq!(summary.p95_ms, 190.0);
        assert_eq!(summary.p99_ms, 200.0);
        assert!((summary.mean_ms - 105.0).abs() < 1e-9);
    }
}
