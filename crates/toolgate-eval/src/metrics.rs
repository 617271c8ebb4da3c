// crates/toolgate-eval/src/metrics.rs
// ============================================================================
// Module: Evaluation Metrics
// Description: Per-item retrieval and answer metrics plus aggregation.
// Purpose: Pure metric functions shared by the engine and tests.
// Dependencies: toolgate-core, toolgate-tools
// ============================================================================

//! ## Overview
//! Rank metrics take retrieved ids in rank order. Answer metrics compare
//! lowercased alphanumeric tokens. Aggregation uses the mean for every
//! metric except `failed` (sum). Wall-clock timings are aggregated
//! separately by [`aggregate_timings`] so that quality aggregates stay
//! reproducible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use toolgate_core::QuestionResult;
use toolgate_core::Reducer;
use toolgate_tools::text::tokenize;

// ============================================================================
// SECTION: Metric Names
// ============================================================================

/// Token F1 against the reference answer.
pub const ANSWER_F1: &str = "answer_f1";
/// Share of answer tokens unsupported by retrieved context.
pub const HALLUCINATION: &str = "hallucination";
/// Whether the answer cites a retrieved document.
pub const CONTEXT_UTILIZATION: &str = "context_utilization";
/// Wall time of the item in milliseconds.
pub const LATENCY_MS: &str = "latency_ms";
/// Nearest-rank p95 of `latency_ms`.
pub const LATENCY_P95_MS: &str = "latency_p95_ms";
/// One when the item failed.
pub const FAILED: &str = "failed";

/// Returns the `recall@k` metric name.
#[must_use]
pub fn recall_name(k: usize) -> String {
    format!("recall@{k}")
}

/// Returns the `mrr@k` metric name.
#[must_use]
pub fn mrr_name(k: usize) -> String {
    format!("mrr@{k}")
}

/// Returns the `hit@k` metric name.
#[must_use]
pub fn hit_name(k: usize) -> String {
    format!("hit@{k}")
}

// ============================================================================
// SECTION: Rank Metrics
// ============================================================================

/// Share of relevant ids found in the first `k` retrieved ids.
///
/// An item with no relevant ids scores zero.
#[must_use]
pub fn recall_at_k(retrieved: &[String], relevant: &BTreeSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let found: BTreeSet<&str> = retrieved
        .iter()
        .take(k)
        .map(String::as_str)
        .filter(|id| relevant.contains(id))
        .collect();
    ratio(found.len(), relevant.len())
}

/// Reciprocal rank of the first relevant id within `k`, else zero.
#[must_use]
pub fn mrr_at_k(retrieved: &[String], relevant: &BTreeSet<&str>, k: usize) -> f64 {
    retrieved
        .iter()
        .take(k)
        .position(|id| relevant.contains(id.as_str()))
        .map_or(0.0, |position| ratio(1, position + 1))
}

/// One when any relevant id appears within `k`, else zero.
#[must_use]
pub fn hit_at_k(retrieved: &[String], relevant: &BTreeSet<&str>, k: usize) -> f64 {
    if retrieved.iter().take(k).any(|id| relevant.contains(id.as_str())) { 1.0 } else { 0.0 }
}

// ============================================================================
// SECTION: Answer Metrics
// ============================================================================

/// Token-level F1 between `prediction` and `reference`.
#[must_use]
pub fn token_f1(prediction: &str, reference: &str) -> f64 {
    let predicted = tokenize(prediction);
    let expected = tokenize(reference);
    if predicted.is_empty() || expected.is_empty() {
        return if predicted.is_empty() && expected.is_empty() { 1.0 } else { 0.0 };
    }
    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    for token in &expected {
        *remaining.entry(token.as_str()).or_default() += 1;
    }
    let mut common = 0_usize;
    for token in &predicted {
        if let Some(count) = remaining.get_mut(token.as_str())
            && *count > 0
        {
            *count -= 1;
            common += 1;
        }
    }
    if common == 0 {
        return 0.0;
    }
    let precision = ratio(common, predicted.len());
    let recall = ratio(common, expected.len());
    2.0 * precision * recall / (precision + recall)
}

/// Share of `answer` tokens absent from every context text.
///
/// An empty answer asserts nothing and scores zero.
#[must_use]
pub fn hallucination_rate(answer: &str, contexts: &[&str]) -> f64 {
    let tokens = tokenize(answer);
    if tokens.is_empty() {
        return 0.0;
    }
    let supported: BTreeSet<String> = contexts.iter().flat_map(|text| tokenize(text)).collect();
    let unsupported = tokens.iter().filter(|token| !supported.contains(*token)).count();
    ratio(unsupported, tokens.len())
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Aggregates per-item metrics.
///
/// Each metric is reduced over the items that report it, so the result does
/// not depend on item order.
#[must_use]
pub fn aggregate(results: &[QuestionResult]) -> BTreeMap<String, f64> {
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        for (name, value) in &result.metrics {
            samples.entry(name.as_str()).or_default().push(*value);
        }
    }
    let mut aggregates = BTreeMap::new();
    for (name, values) in &samples {
        let reducer = if *name == FAILED { Reducer::Sum } else { Reducer::Mean };
        if let Some(value) = reducer.reduce(values) {
            aggregates.insert((*name).to_string(), value);
        }
    }
    aggregates
}

/// Aggregates item wall times into `latency_ms` (mean) and `latency_p95_ms`.
#[must_use]
pub fn aggregate_timings(results: &[QuestionResult]) -> BTreeMap<String, f64> {
    let latencies: Vec<f64> = results.iter().map(|result| result.latency_ms).collect();
    let mut timings = BTreeMap::new();
    if let Some(mean) = Reducer::Mean.reduce(&latencies) {
        timings.insert(LATENCY_MS.to_string(), mean);
    }
    if let Some(p95) = Reducer::P95.reduce(&latencies) {
        timings.insert(LATENCY_P95_MS.to_string(), p95);
    }
    timings
}

/// Returns `numerator / denominator`, or zero for an empty denominator.
#[allow(clippy::cast_precision_loss, reason = "Item and token counts stay far below 2^52.")]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, reason = "Metric values are exact small fractions.")]

    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use toolgate_core::QuestionResult;

    use super::aggregate;
    use super::aggregate_timings;
    use super::hallucination_rate;
    use super::hit_at_k;
    use super::mrr_at_k;
    use super::recall_at_k;
    use super::token_f1;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn rank_metrics_respect_cutoff() {
        let retrieved = ids(&["x", "a", "y", "b"]);
        let relevant: BTreeSet<&str> = ["a", "b"].into_iter().collect();
        assert_eq!(recall_at_k(&retrieved, &relevant, 2), 0.5);
        assert_eq!(recall_at_k(&retrieved, &relevant, 4), 1.0);
        assert_eq!(mrr_at_k(&retrieved, &relevant, 4), 0.5);
        assert_eq!(mrr_at_k(&retrieved, &relevant, 1), 0.0);
        assert_eq!(hit_at_k(&retrieved, &relevant, 1), 0.0);
        assert_eq!(hit_at_k(&retrieved, &relevant, 2), 1.0);
    }

    #[test]
    fn token_f1_counts_overlap_once() {
        assert_eq!(token_f1("the cat sat", "the cat sat"), 1.0);
        assert_eq!(token_f1("cat cat", "cat dog"), 0.5);
        assert_eq!(token_f1("", "anything"), 0.0);
    }

    #[test]
    fn hallucination_counts_unsupported_tokens() {
        assert_eq!(hallucination_rate("files are removed", &["Files are removed later."]), 0.0);
        assert_eq!(hallucination_rate("files vanish", &["files are removed"]), 0.5);
        assert_eq!(hallucination_rate("", &[]), 0.0);
    }

    #[test]
    fn aggregation_sums_failures_and_keeps_timings_apart() {
        let item = |failed: f64, latency: f64| QuestionResult {
            question_id: String::new(),
            metrics: BTreeMap::from([
                ("failed".to_string(), failed),
                ("recall@5".to_string(), 1.0 - failed),
            ]),
            latency_ms: latency,
            error: None,
        };
        let items = [item(0.0, 10.0), item(1.0, 30.0), item(0.0, 20.0)];
        let aggregates = aggregate(&items);
        assert_eq!(aggregates["failed"], 1.0);
        assert_eq!(aggregates["recall@5"], 2.0 / 3.0);
        assert!(!aggregates.contains_key("latency_ms"));
        assert!(!aggregates.contains_key("latency_p95_ms"));

        let timings = aggregate_timings(&items);
        assert_eq!(timings["latency_ms"], 20.0);
        assert_eq!(timings["latency_p95_ms"], 30.0);
    }

    #[test]
    fn no_items_means_no_timings() {
        assert!(aggregate_timings(&[]).is_empty());
    }
}
