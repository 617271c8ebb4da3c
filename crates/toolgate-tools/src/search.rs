// crates/toolgate-tools/src/search.rs
// ============================================================================
// Module: Search Docs Tool
// Description: Lexical document search over the loaded corpus.
// Purpose: Retrieval tool for callers and the evaluation engine.
// Dependencies: async-trait, serde_json, toolgate-core
// ============================================================================

//! ## Overview
//! Arguments: `query` (string, required) and `top_k` (integer, optional).
//! Output: `{"query", "results": [{"rank", "id", "score", "text"}],
//! "total_results"}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::Tool;
use toolgate_core::ToolError;

use crate::args::optional_count;
use crate::args::required_str;
use crate::corpus::Corpus;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the search tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocsConfig {
    /// Results returned when `top_k` is omitted.
    pub default_top_k: usize,
    /// Largest accepted `top_k`.
    pub max_top_k: usize,
}

impl Default for SearchDocsConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
        }
    }
}

// ============================================================================
// SECTION: Tool
// ============================================================================

/// Corpus search tool.
#[derive(Debug, Clone)]
pub struct SearchDocsTool {
    /// Shared corpus.
    corpus: Arc<Corpus>,
    /// Tool configuration.
    config: SearchDocsConfig,
}

impl SearchDocsTool {
    /// Creates the tool over `corpus`.
    #[must_use]
    pub const fn new(corpus: Arc<Corpus>, config: SearchDocsConfig) -> Self {
        Self {
            corpus,
            config,
        }
    }
}

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search the document corpus for `query`; returns up to `top_k` ranked hits."
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let query = required_str(&arguments, "query")?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("query must be non-empty".to_string()));
        }
        let top_k = optional_count(&arguments, "top_k", self.config.max_top_k)?
            .unwrap_or(self.config.default_top_k);
        let results = self.corpus.search(query, top_k);
        let total_results = results.len();
        Ok(json!({
            "query": query,
            "results": results,
            "total_results": total_results,
        }))
    }
}
