// crates/toolgate-eval/src/engine.rs
// ============================================================================
// Module: Evaluation Engine
// Description: Runs dataset items through the dispatcher and gates results.
// Purpose: Produce a reproducible `EvaluationRun`.
// Dependencies: toolgate-core, tokio, uuid
// ============================================================================

//! ## Overview
//! Items are started in the seeded processing order with at most
//! `max_concurrency` in flight (tokio `JoinSet` + `Semaphore`). Results are
//! stored by position, so aggregation never depends on completion order.
//!
//! Tool calls go through [`ToolDispatcher::invoke`], so policy, redaction,
//! timeouts, and audit apply exactly as for live requests. An item whose
//! retrieval or answer call does not succeed gets worst-case metrics: zero
//! for quality metrics, one for `hallucination` and `failed`, and the summed
//! policy timeouts as its wall time.
//!
//! Wall times live in `timing_metrics`, never in `aggregate_metrics`, so a
//! fixed seed and dataset reproduce the aggregates exactly. Gates read both.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use toolgate_core::EvaluationRun;
use toolgate_core::GateEvaluator;
use toolgate_core::QuestionResult;
use toolgate_core::ToolDispatcher;
use toolgate_core::ToolRequest;
use toolgate_core::ToolResult;

use crate::dataset::DatasetItem;
use crate::dataset::load_dataset;
use crate::dataset::processing_order;
use crate::metrics::ANSWER_F1;
use crate::metrics::CONTEXT_UTILIZATION;
use crate::metrics::FAILED;
use crate::metrics::HALLUCINATION;
use crate::metrics::aggregate;
use crate::metrics::aggregate_timings;
use crate::metrics::hallucination_rate;
use crate::metrics::hit_at_k;
use crate::metrics::hit_name;
use crate::metrics::mrr_at_k;
use crate::metrics::mrr_name;
use crate::metrics::recall_at_k;
use crate::metrics::recall_name;
use crate::metrics::token_f1;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalSettings {
    /// Rank cutoffs.
    pub k_values: Vec<usize>,
    /// Maximum items in flight.
    pub max_concurrency: usize,
    /// Retrieval tool name.
    pub retrieval_tool: String,
    /// Answer tool name.
    pub answer_tool: String,
    /// Retrieved documents handed to the answer tool.
    pub context_size: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            k_values: vec![5, 10],
            max_concurrency: 4,
            retrieval_tool: "search_docs".to_string(),
            answer_tool: "answer".to_string(),
            context_size: 5,
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Evaluation gate engine.
#[derive(Clone)]
pub struct EvaluationEngine {
    /// Dispatcher shared with live traffic.
    dispatcher: ToolDispatcher,
    /// Engine settings.
    settings: Arc<EvalSettings>,
    /// Gate table.
    gates: GateEvaluator,
}

impl EvaluationEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(dispatcher: ToolDispatcher, settings: EvalSettings, gates: GateEvaluator) -> Self {
        Self {
            dispatcher,
            settings: Arc::new(settings),
            gates,
        }
    }

    /// Runs the dataset at `dataset_ref` under `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Dataset`] when the dataset cannot be loaded and
    /// [`EvalError::Task`] when an item task is lost.
    pub async fn run(&self, dataset_ref: &Path, seed: u64) -> Result<EvaluationRun, EvalError> {
        let items = load_dataset(dataset_ref)?;
        self.run_items(dataset_ref.display().to_string(), items, seed).await
    }

    /// Runs already loaded `items`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Task`] when an item task is lost.
    pub async fn run_items(
        &self,
        dataset_ref: String,
        items: Vec<DatasetItem>,
        seed: u64,
    ) -> Result<EvaluationRun, EvalError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = OffsetDateTime::now_utc();
        tracing::info!(
            run_id = run_id.as_str(),
            dataset = dataset_ref.as_str(),
            seed,
            items = items.len(),
            "evaluation started"
        );

        let order = processing_order(items.len(), seed);
        let items: Vec<Arc<DatasetItem>> = items.into_iter().map(Arc::new).collect();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (position, index) in order.iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|err| EvalError::Task(err.to_string()))?;
            let engine = self.clone();
            let item = Arc::clone(&items[*index]);
            let session = run_id.clone();
            tasks.spawn(async move {
                let result = engine.evaluate_item(&item, &session).await;
                drop(permit);
                (position, result)
            });
        }

        let mut slots: Vec<Option<QuestionResult>> = vec![None; order.len()];
        while let Some(joined) = tasks.join_next().await {
            let (position, result) = joined.map_err(|err| EvalError::Task(err.to_string()))?;
            slots[position] = Some(result);
        }
        let per_question_results: Vec<QuestionResult> = slots.into_iter().flatten().collect();
        if per_question_results.len() != order.len() {
            return Err(EvalError::Task("missing item results".to_string()));
        }

        let aggregate_metrics = aggregate(&per_question_results);
        let timing_metrics = aggregate_timings(&per_question_results);
        let mut gated = aggregate_metrics.clone();
        gated.extend(timing_metrics.iter().map(|(name, value)| (name.clone(), *value)));
        let report = self.gates.evaluate(&gated);
        let run = EvaluationRun {
            run_id,
            dataset_ref,
            seed,
            started_at,
            finished_at: OffsetDateTime::now_utc(),
            per_question_results,
            aggregate_metrics,
            timing_metrics,
            gate_verdicts: report.verdict_map(),
            gate_details: report.verdicts,
            overall_pass: report.overall_pass,
        };
        tracing::info!(run_id = run.run_id.as_str(), overall_pass = run.overall_pass, "evaluation finished");
        Ok(run)
    }

    /// Evaluates one item. Never fails; failures become worst-case metrics.
    async fn evaluate_item(&self, item: &DatasetItem, session: &str) -> QuestionResult {
        let started = Instant::now();
        let max_k = self.settings.k_values.iter().copied().max().unwrap_or(1);

        let retrieval = self
            .call(&self.settings.retrieval_tool, item, session, json!({
                "query": item.question,
                "top_k": max_k,
            }))
            .await;
        let hits = match retrieval.and_then(|output| parse_hits(&output)) {
            Ok(hits) => hits,
            Err(error) => return self.worst_case(item, error),
        };

        let contexts: Vec<Value> = hits
            .iter()
            .take(self.settings.context_size)
            .map(|(id, text)| json!({ "id": id, "text": text }))
            .collect();
        let answer = self
            .call(&self.settings.answer_tool, item, session, json!({
                "question": item.question,
                "contexts": contexts,
            }))
            .await;
        let (answer_text, citations) = match answer.and_then(|output| parse_answer(&output)) {
            Ok(parsed) => parsed,
            Err(error) => return self.worst_case(item, error),
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let retrieved: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let relevant: BTreeSet<&str> = item.relevant_ids.iter().map(String::as_str).collect();
        let mut metrics = BTreeMap::new();
        for &k in &self.settings.k_values {
            metrics.insert(recall_name(k), recall_at_k(&retrieved, &relevant, k));
            metrics.insert(mrr_name(k), mrr_at_k(&retrieved, &relevant, k));
            metrics.insert(hit_name(k), hit_at_k(&retrieved, &relevant, k));
        }
        if let Some(reference) = &item.answer {
            metrics.insert(ANSWER_F1.to_string(), token_f1(&answer_text, reference));
        }
        let context_ids: BTreeSet<&str> =
            hits.iter().take(self.settings.context_size).map(|(id, _)| id.as_str()).collect();
        let context_texts: Vec<&str> =
            hits.iter().take(self.settings.context_size).map(|(_, text)| text.as_str()).collect();
        metrics.insert(HALLUCINATION.to_string(), hallucination_rate(&answer_text, &context_texts));
        let cited = citations.iter().any(|id| context_ids.contains(id.as_str()));
        metrics.insert(CONTEXT_UTILIZATION.to_string(), if cited { 1.0 } else { 0.0 });
        metrics.insert(FAILED.to_string(), 0.0);
        QuestionResult {
            question_id: item.id.clone(),
            metrics,
            latency_ms,
            error: None,
        }
    }

    /// Invokes `tool` through the dispatcher; returns its output on success.
    async fn call(
        &self,
        tool: &str,
        item: &DatasetItem,
        session: &str,
        arguments: Value,
    ) -> Result<Value, String> {
        let arguments: Map<String, Value> = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let request = ToolRequest::new(tool, arguments)
            .with_user_id(Some(format!("eval:{}", item.id)))
            .with_session_id(Some(session.to_string()));
        let ToolResult {
            success,
            output,
            error,
            ..
        } = self.dispatcher.invoke(request).await;
        if success {
            Ok(output.unwrap_or(Value::Null))
        } else {
            Err(format!("{tool}: {}", error.unwrap_or_else(|| "failed".to_string())))
        }
    }

    /// Worst-case metrics for a failed item.
    fn worst_case(&self, item: &DatasetItem, error: String) -> QuestionResult {
        tracing::warn!(question_id = item.id.as_str(), error = error.as_str(), "evaluation item failed");
        let mut metrics = BTreeMap::new();
        for &k in &self.settings.k_values {
            metrics.insert(recall_name(k), 0.0);
            metrics.insert(mrr_name(k), 0.0);
            metrics.insert(hit_name(k), 0.0);
        }
        if item.answer.is_some() {
            metrics.insert(ANSWER_F1.to_string(), 0.0);
        }
        metrics.insert(HALLUCINATION.to_string(), 1.0);
        metrics.insert(CONTEXT_UTILIZATION.to_string(), 0.0);
        metrics.insert(FAILED.to_string(), 1.0);
        QuestionResult {
            question_id: item.id.clone(),
            metrics,
            latency_ms: self.timeout_budget_ms(),
            error: Some(error),
        }
    }

    /// Sum of the configured timeouts of both tools in milliseconds.
    fn timeout_budget_ms(&self) -> f64 {
        let policy = self.dispatcher.guardian().policy().snapshot();
        [&self.settings.retrieval_tool, &self.settings.answer_tool]
            .into_iter()
            .filter_map(|tool| policy.get(tool))
            .map(|entry| entry.timeout_seconds * 1000.0)
            .sum()
    }
}

// ============================================================================
// SECTION: Output Parsing
// ============================================================================

/// Extracts `(id, text)` hits from a retrieval output.
fn parse_hits(output: &Value) -> Result<Vec<(String, String)>, String> {
    let results = output
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| "retrieval output missing results".to_string())?;
    results
        .iter()
        .map(|hit| {
            let id = hit.get("id").and_then(Value::as_str);
            let text = hit.get("text").and_then(Value::as_str).unwrap_or_default();
            id.map(|id| (id.to_string(), text.to_string()))
                .ok_or_else(|| "retrieval hit missing id".to_string())
        })
        .collect()
}

/// Extracts the answer text and citations from an answer output.
fn parse_answer(output: &Value) -> Result<(String, Vec<String>), String> {
    let answer = match output {
        Value::String(text) => return Ok((text.clone(), Vec::new())),
        Value::Object(map) => map.get("answer").and_then(Value::as_str),
        _ => None,
    }
    .ok_or_else(|| "answer output missing answer".to_string())?;
    let citations: Vec<String> = output
        .get("citations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default();
    Ok((answer.to_string(), citations))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Dataset could not be loaded.
    #[error("dataset error: {0}")]
    Dataset(String),
    /// An item task failed to complete.
    #[error("evaluation task error: {0}")]
    Task(String),
    /// Artifact write failure.
    #[error("artifact io error: {0}")]
    Io(String),
    /// Artifact encoding failure.
    #[error("artifact serialization error: {0}")]
    Serialization(String),
}
