// crates/toolgate-eval/src/dataset.rs
// ============================================================================
// Module: Evaluation Dataset
// Description: JSONL dataset loading and seeded ordering.
// Purpose: Deterministic evaluation inputs.
// Dependencies: rand, serde, serde_json
// ============================================================================

//! ## Overview
//! A dataset is a JSONL file with one item per line:
//! `{"id", "question", "relevant_ids": [..], "answer"?}`. Any malformed line
//! or repeated id fails the whole load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::Serialize;

use crate::engine::EvalError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum dataset file size in bytes.
const MAX_DATASET_BYTES: u64 = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One evaluation question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetItem {
    /// Item identifier.
    pub id: String,
    /// Question text sent to retrieval and answer tools.
    pub question: String,
    /// Document ids considered relevant.
    #[serde(default)]
    pub relevant_ids: Vec<String>,
    /// Reference answer for token F1.
    #[serde(default)]
    pub answer: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads a dataset from a JSONL file.
///
/// # Errors
///
/// Returns [`EvalError::Dataset`] when the file is missing, too large, not
/// UTF-8, or contains a malformed or duplicate item.
pub fn load_dataset(path: &Path) -> Result<Vec<DatasetItem>, EvalError> {
    let dataset_error = |message: String| EvalError::Dataset(format!("{}: {message}", path.display()));
    let metadata = fs::metadata(path).map_err(|err| dataset_error(err.to_string()))?;
    if metadata.len() > MAX_DATASET_BYTES {
        return Err(dataset_error("dataset exceeds size limit".to_string()));
    }
    let content = fs::read_to_string(path).map_err(|err| dataset_error(err.to_string()))?;
    let mut seen = BTreeSet::new();
    let mut items = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item: DatasetItem = serde_json::from_str(line)
            .map_err(|err| dataset_error(format!("line {}: {err}", index + 1)))?;
        if item.id.trim().is_empty() || item.question.trim().is_empty() {
            return Err(dataset_error(format!("line {}: id and question must be non-empty", index + 1)));
        }
        if !seen.insert(item.id.clone()) {
            return Err(dataset_error(format!("duplicate item id: {}", item.id)));
        }
        items.push(item);
    }
    Ok(items)
}

/// Returns the processing order for `len` items under `seed`.
#[must_use]
pub fn processing_order(len: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

// ============================================================================
// SECTION: Tests
// ============================================================================
