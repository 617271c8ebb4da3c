// crates/toolgate-tools/src/answer.rs
// ============================================================================
// Module: Answer Tool
// Description: Extractive question answering over supplied contexts.
// Purpose: Answer generation step for the evaluation engine.
// Dependencies: async-trait, serde, serde_json, toolgate-core
// ============================================================================

//! ## Overview
//! Arguments: `question` (string) and `contexts`, an array of
//! `{"id", "text"}` objects or plain strings (ids default to their index).
//! The answer is the context sentence sharing the most content tokens with
//! the question; ties go to the earliest sentence. When nothing overlaps the
//! answer is empty and `grounded` is false.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::Tool;
use toolgate_core::ToolError;

use crate::args::required_str;
use crate::text::content_tokens;
use crate::text::split_sentences;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of contexts accepted per call.
const MAX_CONTEXTS: usize = 64;

// ============================================================================
// SECTION: Tool
// ============================================================================

/// Extractive answer tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerTool;

/// Context passage with its source id.
struct Context {
    /// Source document id.
    id: String,
    /// Passage text.
    text: String,
}

#[async_trait]
impl Tool for AnswerTool {
    fn name(&self) -> &str {
        "answer"
    }

    fn description(&self) -> &str {
        "Answer `question` with the best-matching sentence from `contexts`."
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let question = required_str(&arguments, "question")?;
        let contexts = parse_contexts(arguments.get("contexts"))?;
        let question_terms: BTreeSet<String> = content_tokens(question).into_iter().collect();

        let mut best: Option<(usize, &str, &str)> = None;
        for context in &contexts {
            for sentence in split_sentences(&context.text) {
                let overlap = content_tokens(sentence)
                    .into_iter()
                    .collect::<BTreeSet<_>>()
                    .intersection(&question_terms)
                    .count();
                if overlap > 0 && best.is_none_or(|(current, ..)| overlap > current) {
                    best = Some((overlap, sentence, context.id.as_str()));
                }
            }
        }

        let (answer, citations) = match best {
            Some((_, sentence, id)) => (sentence.to_string(), vec![id.to_string()]),
            None => (String::new(), Vec::new()),
        };
        let grounded = !citations.is_empty();
        Ok(json!({
            "answer": answer,
            "citations": citations,
            "grounded": grounded,
        }))
    }
}

/// Parses the `contexts` argument.
fn parse_contexts(value: Option<&Value>) -> Result<Vec<Context>, ToolError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ToolError::InvalidArguments("contexts must be an array".to_string())),
    };
    if items.len() > MAX_CONTEXTS {
        return Err(ToolError::InvalidArguments(format!(
            "contexts must have at most {MAX_CONTEXTS} entries"
        )));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(text) => Ok(Context {
                id: index.to_string(),
                text: text.clone(),
            }),
            Value::Object(map) => Ok(Context {
                id: required_str(map, "id")?.to_string(),
                text: required_str(map, "text")?.to_string(),
            }),
            _ => Err(ToolError::InvalidArguments(
                "contexts entries must be strings or {id, text} objects".to_string(),
            )),
        })
        .collect()
}
