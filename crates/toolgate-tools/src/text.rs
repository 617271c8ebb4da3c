// crates/toolgate-tools/src/text.rs
// ============================================================================
// Module: Text Utilities
// Description: Tokenization and sentence splitting.
// Purpose: Shared lexical primitives for retrieval, summaries, and answers.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Tokens are lowercased runs of alphanumeric characters. Content tokens
//! additionally drop a small English stopword list.

/// Common English words ignored when scoring.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "how", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when", "where",
    "which", "who", "why", "will", "with",
];

/// Splits `text` into lowercased alphanumeric tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Returns tokens with stopwords removed.
#[must_use]
pub fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|token| !STOPWORDS.contains(&token.as_str())).collect()
}

/// Splits `text` into trimmed sentences ending at `.`, `!`, or `?`.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().is_none_or(|(_, next)| next.is_whitespace())
        {
            let end = index + ch.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

/// Appends `candidate` when it is not blank.
fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
