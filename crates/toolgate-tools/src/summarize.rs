// crates/toolgate-tools/src/summarize.rs
// ============================================================================
// Module: Summarize Tool
// Description: Extractive text summarization.
// Purpose: Deterministic summaries without a model backend.
// Dependencies: async-trait, serde_json, toolgate-core
// ============================================================================

//! ## Overview
//! Sentences are scored by the mean corpus frequency of their content
//! tokens. The highest-scoring sentences are kept in their original order.
//! Texts with no more sentences than requested are returned whole.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::Tool;
use toolgate_core::ToolError;

use crate::args::optional_count;
use crate::args::required_str;
use crate::text::content_tokens;
use crate::text::split_sentences;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Upper bound accepted for `max_sentences`.
const MAX_SENTENCES_LIMIT: usize = 50;

/// Configuration for the summarize tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeConfig {
    /// Sentences kept when the caller does not say.
    pub default_max_sentences: usize,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            default_max_sentences: 3,
        }
    }
}

// ============================================================================
// SECTION: Tool
// ============================================================================

/// Extractive summarizer.
#[derive(Debug, Clone, Default)]
pub struct SummarizeTool {
    /// Tool configuration.
    config: SummarizeConfig,
}

impl SummarizeTool {
    /// Creates the tool.
    #[must_use]
    pub const fn new(config: SummarizeConfig) -> Self {
        Self {
            config,
        }
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize"
    }

    fn description(&self) -> &str {
        "Extractive summary of `text` keeping up to `max_sentences` sentences."
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let text = required_str(&arguments, "text")?;
        let max_sentences = optional_count(&arguments, "max_sentences", MAX_SENTENCES_LIMIT)?
            .unwrap_or(self.config.default_max_sentences);
        let summary = summarize(text, max_sentences);
        Ok(json!({
            "summary": summary,
            "method": "extractive",
            "original_length": text.chars().count(),
            "summary_length": summary.chars().count(),
        }))
    }
}

/// Returns the extractive summary of `text`.
#[must_use]
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= max_sentences {
        return sentences.join(" ");
    }
    let mut frequency: BTreeMap<String, usize> = BTreeMap::new();
    for token in content_tokens(text) {
        *frequency.entry(token).or_default() += 1;
    }
    let mut scored: Vec<(usize, usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| {
            let tokens = content_tokens(sentence);
            let weight = tokens.iter().map(|token| frequency.get(token).copied().unwrap_or(0)).sum();
            (index, weight, tokens.len().max(1))
        })
        .collect();
    // Compare weight/len ratios by cross-multiplication to stay in integers.
    scored.sort_by(|a, b| (b.1 * a.2).cmp(&(a.1 * b.2)).then(a.0.cmp(&b.0)));
    let mut keep: Vec<usize> = scored.into_iter().take(max_sentences).map(|(index, ..)| index).collect();
    keep.sort_unstable();
    keep.into_iter().map(|index| sentences[index]).collect::<Vec<_>>().join(" ")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
