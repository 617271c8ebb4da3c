// crates/toolgate-cli/src/eval_run.rs
// ============================================================================
// Module: Eval Run Command
// Description: `toolgate eval run` implementation.
// Purpose: Run the evaluation gate and translate the verdict to an exit code.
// Dependencies: toolgate-eval, toolgate-mcp
// ============================================================================

//! ## Overview
//! Tool calls go through the same runtime as `serve`, so the configured
//! policy, redaction, and audit log apply to evaluation traffic too.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;

use toolgate_config::EvaluationConfig;
use toolgate_core::EvaluationRun;
use toolgate_core::GateEvaluator;
use toolgate_eval::EvalSettings;
use toolgate_eval::EvaluationEngine;
use toolgate_eval::write_artifacts;
use toolgate_mcp::ToolgateRuntime;
use tracing::info;

use crate::CliError;
use crate::CliResult;
use crate::EvalRunCommand;
use crate::load_config;
use crate::output_error;
use crate::write_stdout_line;

// ============================================================================
// SECTION: Command
// ============================================================================

/// Executes `eval run`.
pub(crate) async fn command_eval_run(command: EvalRunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let seed = command.seed.unwrap_or(config.evaluation.seed);
    let settings = eval_settings(&config.evaluation);
    let gates = GateEvaluator::new(config.evaluation.gates.clone());
    let runtime = ToolgateRuntime::from_config(config)
        .map_err(|err| CliError::new(format!("runtime init failed: {err}")))?;
    let engine = EvaluationEngine::new(runtime.dispatcher().clone(), settings, gates);

    let run = engine
        .run(&command.dataset, seed)
        .await
        .map_err(|err| CliError::new(format!("evaluation failed: {err}")))?;
    let paths = write_artifacts(&run, &command.out)
        .map_err(|err| CliError::new(format!("failed to write artifacts: {err}")))?;
    info!(
        run_id = run.run_id.as_str(),
        overall_pass = run.overall_pass,
        out = %command.out.display(),
        "evaluation artifacts written"
    );

    for line in summary_lines(&run) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    write_stdout_line(&format!("report: {}", paths.report.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(exit_code(&run))
}

/// Maps evaluation settings from configuration.
pub(crate) fn eval_settings(config: &EvaluationConfig) -> EvalSettings {
    EvalSettings {
        k_values: config.k_values.clone(),
        max_concurrency: config.max_concurrency,
        retrieval_tool: config.retrieval_tool.clone(),
        answer_tool: config.answer_tool.clone(),
        context_size: config.context_size,
    }
}

/// Renders one line per gate plus the overall verdict.
pub(crate) fn summary_lines(run: &EvaluationRun) -> Vec<String> {
    let mut lines: Vec<String> = run
        .gate_details
        .iter()
        .map(|gate| {
            let actual = gate.actual.map_or_else(|| "missing".to_string(), |value| format!("{value:.4}"));
            let result = if gate.passed { "pass" } else { "FAIL" };
            format!(
                "gate {}: {result} ({actual} {} {})",
                gate.name,
                gate.comparison.symbol(),
                gate.threshold
            )
        })
        .collect();
    let overall = if run.overall_pass { "PASS" } else { "FAIL" };
    lines.push(format!(
        "overall: {overall} ({} questions, seed {})",
        run.per_question_results.len(),
        run.seed
    ));
    lines
}

/// Success only when every gate passed.
pub(crate) fn exit_code(run: &EvaluationRun) -> ExitCode {
    if run.overall_pass { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
