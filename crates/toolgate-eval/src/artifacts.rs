// crates/toolgate-eval/src/artifacts.rs
// ============================================================================
// Module: Evaluation Artifacts
// Description: Writes run artifacts and renders the Markdown report.
// Purpose: Persist evaluation results for CI consumption.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! An output directory receives:
//! - `metrics.json`: aggregate metric name to value (reproducible)
//! - `timings.json`: wall-clock aggregates (`latency_ms`, `latency_p95_ms`)
//! - `gates.json`: gate label to verdict, `overall_pass`, and details
//! - `results.jsonl`: one [`QuestionResult`] per line in processing order
//! - `report.md`: human-readable summary
//! - `run.json`: the complete [`EvaluationRun`]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;
use toolgate_core::EvaluationRun;
use toolgate_core::QuestionResult;

use crate::engine::EvalError;

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Files written for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Aggregate metrics.
    pub metrics: PathBuf,
    /// Wall-clock timings.
    pub timings: PathBuf,
    /// Gate verdicts.
    pub gates: PathBuf,
    /// Per-question results.
    pub results: PathBuf,
    /// Markdown report.
    pub report: PathBuf,
    /// Full run record.
    pub run: PathBuf,
}

impl ArtifactPaths {
    /// Returns the artifact paths under `out_dir`.
    #[must_use]
    pub fn under(out_dir: &Path) -> Self {
        Self {
            metrics: out_dir.join("metrics.json"),
            timings: out_dir.join("timings.json"),
            gates: out_dir.join("gates.json"),
            results: out_dir.join("results.jsonl"),
            report: out_dir.join("report.md"),
            run: out_dir.join("run.json"),
        }
    }
}

// ============================================================================
// SECTION: Writing
// ============================================================================

/// Writes every artifact for `run` into `out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`EvalError::Io`] or [`EvalError::Serialization`] on failure.
pub fn write_artifacts(run: &EvaluationRun, out_dir: &Path) -> Result<ArtifactPaths, EvalError> {
    fs::create_dir_all(out_dir).map_err(|err| EvalError::Io(err.to_string()))?;
    let paths = ArtifactPaths::under(out_dir);

    write_json(&paths.metrics, &run.aggregate_metrics)?;
    write_json(&paths.timings, &run.timing_metrics)?;
    let gates = json!({
        "gates": run.gate_verdicts,
        "overall_pass": run.overall_pass,
        "details": run.gate_details,
    });
    write_json(&paths.gates, &gates)?;

    let mut lines = String::new();
    for result in &run.per_question_results {
        let line = serde_json::to_string(result)
            .map_err(|err| EvalError::Serialization(err.to_string()))?;
        lines.push_str(&line);
        lines.push('\n');
    }
    write_file(&paths.results, lines.as_bytes())?;
    write_file(&paths.report, render_report(run).as_bytes())?;
    write_json(&paths.run, run)?;
    Ok(paths)
}

/// Writes `value` as pretty JSON with a trailing newline.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), EvalError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| EvalError::Serialization(err.to_string()))?;
    bytes.push(b'\n');
    write_file(path, &bytes)
}

/// Writes raw bytes to `path`.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), EvalError> {
    fs::write(path, bytes).map_err(|err| EvalError::Io(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Renders the Markdown report for `run`.
#[must_use]
pub fn render_report(run: &EvaluationRun) -> String {
    let mut out = String::new();
    let verdict = if run.overall_pass { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "# Evaluation Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Run: `{}`", run.run_id);
    let _ = writeln!(out, "- Dataset: `{}`", run.dataset_ref);
    let _ = writeln!(out, "- Seed: {}", run.seed);
    let _ = writeln!(out, "- Questions: {}", run.per_question_results.len());
    let _ = writeln!(out, "- Overall: **{verdict}**");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Gates");
    let _ = writeln!(out);
    if run.gate_details.is_empty() {
        let _ = writeln!(out, "No gates configured.");
    } else {
        let _ = writeln!(out, "| Gate | Condition | Actual | Result |");
        let _ = writeln!(out, "|---|---|---|---|");
        for gate in &run.gate_details {
            let actual = gate.actual.map_or_else(|| "missing".to_string(), |value| format!("{value:.4}"));
            let result = if gate.passed { "pass" } else { "FAIL" };
            let _ = writeln!(
                out,
                "| {} | {} {} {} | {actual} | {result} |",
                gate.name,
                gate.metric_name,
                gate.comparison.symbol(),
                gate.threshold
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Metrics");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    for (name, value) in &run.aggregate_metrics {
        let _ = writeln!(out, "| {name} | {value:.4} |");
    }
    let _ = writeln!(out);

    if !run.timing_metrics.is_empty() {
        let _ = writeln!(out, "## Timings");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Timing | Value |");
        let _ = writeln!(out, "|---|---|");
        for (name, value) in &run.timing_metrics {
            let _ = writeln!(out, "| {name} | {value:.1} |");
        }
        let _ = writeln!(out);
    }

    let failures: Vec<&QuestionResult> =
        run.per_question_results.iter().filter(|result| result.error.is_some()).collect();
    let _ = writeln!(out, "## Failed Questions");
    let _ = writeln!(out);
    if failures.is_empty() {
        let _ = writeln!(out, "None.");
    } else {
        for result in failures {
            let error = result.error.as_deref().unwrap_or_default();
            let _ = writeln!(out, "- `{}`: {error}", result.question_id);
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use time::OffsetDateTime;
    use toolgate_core::Comparison;
    use toolgate_core::EvaluationRun;
    use toolgate_core::GateVerdict;
    use toolgate_core::QuestionResult;

    use super::render_report;

    fn run(passed: bool) -> EvaluationRun {
        EvaluationRun {
            run_id: "run-1".to_string(),
            dataset_ref: "qa.jsonl".to_string(),
            seed: 7,
            started_at: OffsetDateTime::UNIX_EPOCH,
            finished_at: OffsetDateTime::UNIX_EPOCH,
            per_question_results: vec![QuestionResult {
                question_id: "q1".to_string(),
                metrics: BTreeMap::new(),
                latency_ms: 2500.0,
                error: Some("answer: timeout".to_string()),
            }],
            aggregate_metrics: BTreeMap::from([("recall@5".to_string(), 0.8)]),
            timing_metrics: BTreeMap::from([("latency_p95_ms".to_string(), 2500.0)]),
            gate_verdicts: BTreeMap::from([("recall@5".to_string(), passed)]),
            gate_details: vec![GateVerdict {
                name: "recall@5".to_string(),
                metric_name: "recall@5".to_string(),
                comparison: Comparison::Gte,
                threshold: 0.85,
                actual: Some(0.8),
                passed,
            }],
            overall_pass: passed,
        }
    }

    #[test]
    fn report_lists_gates_and_failures() {
        let report = render_report(&run(false));
        assert!(report.starts_with("# Evaluation Report"));
        assert!(report.contains("- Overall: **FAIL**"));
        assert!(report.contains("| recall@5 | recall@5 >= 0.85 | 0.8000 | FAIL |"));
        assert!(report.contains("- `q1`: answer: timeout"));
        assert!(report.contains("| latency_p95_ms | 2500.0 |"));
    }
}
