// crates/toolgate-tools/src/lib.rs
// ============================================================================
// Module: Toolgate Tools
// Description: Built-in tools and registry assembly.
// Purpose: Provide the default tool set served behind the guardian.
// Dependencies: toolgate-core, serde_json
// ============================================================================

//! ## Overview
//! This crate ships the built-in tools: `echo`, `ping`, `summarize`,
//! `search_docs` (lexical retrieval over a JSONL corpus), and `answer`
//! (extractive answers from supplied contexts). Tools validate their own
//! arguments; the guardian has already enforced policy and size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod answer;
pub mod basic;
pub mod corpus;
pub mod registry;
pub mod search;
pub mod summarize;
pub mod text;

mod args;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use answer::AnswerTool;
pub use basic::EchoTool;
pub use basic::PingTool;
pub use corpus::Corpus;
pub use corpus::CorpusError;
pub use corpus::Document;
pub use corpus::SearchHit;
pub use registry::BuiltinToolsConfig;
pub use registry::ToolsError;
pub use registry::builtin_registry;
pub use registry::registry_with_corpus;
pub use search::SearchDocsConfig;
pub use search::SearchDocsTool;
pub use summarize::SummarizeConfig;
pub use summarize::SummarizeTool;
