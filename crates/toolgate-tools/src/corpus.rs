// crates/toolgate-tools/src/corpus.rs
// ============================================================================
// Module: Document Corpus
// Description: In-memory document corpus with BM25 lexical ranking.
// Purpose: Back the `search_docs` tool with deterministic retrieval.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A corpus is loaded once from a JSONL file (`{"id", "text", "title"?}` per
//! line) and indexed in memory. Search scores documents with BM25 over
//! content tokens; ties are broken by corpus order so results are stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::text::content_tokens;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// BM25 term-frequency saturation.
const BM25_K1: f64 = 1.2;
/// BM25 length normalization.
const BM25_B: f64 = 0.75;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Stable document identifier.
    pub id: String,
    /// Document body.
    pub text: String,
    /// Optional title, indexed with the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// One-based rank.
    pub rank: usize,
    /// Document identifier.
    pub id: String,
    /// BM25 score.
    pub score: f64,
    /// Document body.
    pub text: String,
}

/// Indexed document.
#[derive(Debug, Clone)]
struct IndexedDocument {
    /// Source document.
    document: Document,
    /// Term frequencies.
    terms: BTreeMap<String, usize>,
    /// Token count.
    length: usize,
}

/// Immutable in-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Documents in load order.
    documents: Vec<IndexedDocument>,
    /// Number of documents containing each term.
    document_frequency: BTreeMap<String, usize>,
    /// Mean document length in tokens.
    average_length: f64,
}

impl Corpus {
    /// Indexes `documents`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Invalid`] when an id is blank or repeated.
    pub fn new(documents: Vec<Document>) -> Result<Self, CorpusError> {
        let mut seen = BTreeSet::new();
        let mut indexed = Vec::with_capacity(documents.len());
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_length = 0_usize;
        for document in documents {
            if document.id.trim().is_empty() {
                return Err(CorpusError::Invalid("document id must be non-empty".to_string()));
            }
            if !seen.insert(document.id.clone()) {
                return Err(CorpusError::Invalid(format!("duplicate document id: {}", document.id)));
            }
            let mut tokens = content_tokens(&document.text);
            if let Some(title) = &document.title {
                tokens.extend(content_tokens(title));
            }
            let mut terms: BTreeMap<String, usize> = BTreeMap::new();
            for token in &tokens {
                *terms.entry(token.clone()).or_default() += 1;
            }
            for term in terms.keys() {
                *document_frequency.entry(term.clone()).or_default() += 1;
            }
            total_length += tokens.len();
            indexed.push(IndexedDocument {
                document,
                terms,
                length: tokens.len(),
            });
        }
        let average_length =
            if indexed.is_empty() { 0.0 } else { as_f64(total_length) / as_f64(indexed.len()) };
        Ok(Self {
            documents: indexed,
            document_frequency,
            average_length,
        })
    }

    /// Loads a JSONL corpus no larger than `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] when the file is unreadable, too large, or
    /// contains a malformed line.
    pub fn load_jsonl(path: &Path, max_bytes: usize) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|err| CorpusError::Io(err.to_string()))?;
        let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut content = String::new();
        file.take(limit)
            .read_to_string(&mut content)
            .map_err(|err| CorpusError::Io(err.to_string()))?;
        if content.len() > max_bytes {
            return Err(CorpusError::Invalid("corpus exceeds size limit".to_string()));
        }
        let mut documents = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let document: Document = serde_json::from_str(line)
                .map_err(|err| CorpusError::Parse(format!("line {}: {err}", index + 1)))?;
            documents.push(document);
        }
        let corpus = Self::new(documents)?;
        tracing::info!(path = %path.display(), documents = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true when the corpus has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Looks up a document by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().map(|indexed| &indexed.document).find(|doc| doc.id == id)
    }

    /// Returns up to `top_k` documents scoring above zero for `query`.
    #[must_use]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query_terms: BTreeSet<String> = content_tokens(query).into_iter().collect();
        if query_terms.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(index, indexed)| (index, self.score(indexed, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(position, (index, score))| {
                let document = &self.documents[index].document;
                SearchHit {
                    rank: position + 1,
                    id: document.id.clone(),
                    score,
                    text: document.text.clone(),
                }
            })
            .collect()
    }

    /// BM25 score of one document.
    fn score(&self, indexed: &IndexedDocument, query_terms: &BTreeSet<String>) -> f64 {
        let total = as_f64(self.documents.len());
        let length_ratio = if self.average_length > 0.0 {
            as_f64(indexed.length) / self.average_length
        } else {
            0.0
        };
        query_terms
            .iter()
            .filter_map(|term| {
                let frequency = as_f64(*indexed.terms.get(term)?);
                let containing = as_f64(self.document_frequency.get(term).copied().unwrap_or(0));
                let idf = ((total - containing + 0.5) / (containing + 0.5)).ln_1p();
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * length_ratio);
                Some(idf * frequency * (BM25_K1 + 1.0) / (frequency + norm))
            })
            .sum()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Corpus loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorpusError {
    /// File could not be read.
    #[error("corpus io error: {0}")]
    Io(String),
    /// A line was not a valid document.
    #[error("corpus parse error: {0}")]
    Parse(String),
    /// Documents violate corpus invariants.
    #[error("invalid corpus: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a count to `f64`.
#[allow(clippy::cast_precision_loss, reason = "Corpus sizes stay far below 2^52.")]
fn as_f64(value: usize) -> f64 {
    value as f64
}
