// crates/toolgate-tools/src/registry.rs
// ============================================================================
// Module: Built-in Registry
// Description: Assembles the built-in tools into a registry.
// Purpose: Single entry point used by the server and evaluation CLI.
// Dependencies: toolgate-core
// ============================================================================

//! ## Overview
//! Registration is independent of policy: a registered tool still needs an
//! allowlist entry before the guardian admits it. Without a configured
//! corpus, `search_docs` serves an empty corpus.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use toolgate_core::StaticToolRegistry;
use toolgate_core::Tool;

use crate::answer::AnswerTool;
use crate::basic::EchoTool;
use crate::basic::PingTool;
use crate::corpus::Corpus;
use crate::search::SearchDocsConfig;
use crate::search::SearchDocsTool;
use crate::summarize::SummarizeConfig;
use crate::summarize::SummarizeTool;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Built-in tool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinToolsConfig {
    /// JSONL corpus for `search_docs`.
    pub corpus_path: Option<PathBuf>,
    /// Largest corpus file accepted.
    pub max_corpus_bytes: usize,
    /// Summarize defaults.
    pub summarize: SummarizeConfig,
    /// Search defaults.
    pub search: SearchDocsConfig,
}

impl Default for BuiltinToolsConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            max_corpus_bytes: 64 * 1024 * 1024,
            summarize: SummarizeConfig::default(),
            search: SearchDocsConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds a registry with every built-in tool.
///
/// # Errors
///
/// Returns [`ToolsError`] when the corpus cannot be loaded.
pub fn builtin_registry(config: &BuiltinToolsConfig) -> Result<StaticToolRegistry, ToolsError> {
    let corpus = match &config.corpus_path {
        Some(path) => Corpus::load_jsonl(path, config.max_corpus_bytes)
            .map_err(|err| ToolsError::Corpus(err.to_string()))?,
        None => Corpus::default(),
    };
    registry_with_corpus(config, Arc::new(corpus))
}

/// Builds a registry with every built-in tool over an already loaded corpus.
///
/// # Errors
///
/// Returns [`ToolsError::Registry`] when two tools share a name.
pub fn registry_with_corpus(
    config: &BuiltinToolsConfig,
    corpus: Arc<Corpus>,
) -> Result<StaticToolRegistry, ToolsError> {
    let mut registry = StaticToolRegistry::new();
    register(&mut registry, Arc::new(EchoTool))?;
    register(&mut registry, Arc::new(PingTool))?;
    register(&mut registry, Arc::new(SummarizeTool::new(config.summarize.clone())))?;
    register(&mut registry, Arc::new(SearchDocsTool::new(corpus, config.search.clone())))?;
    register(&mut registry, Arc::new(AnswerTool))?;
    Ok(registry)
}

/// Registers one tool, mapping conflicts into [`ToolsError`].
fn register(registry: &mut StaticToolRegistry, tool: Arc<dyn Tool>) -> Result<(), ToolsError> {
    registry.register(tool).map_err(|err| ToolsError::Registry(err.to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Built-in tool assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolsError {
    /// Corpus failed to load.
    #[error("tools corpus error: {0}")]
    Corpus(String),
    /// Registration conflict.
    #[error("tools registry error: {0}")]
    Registry(String),
}
