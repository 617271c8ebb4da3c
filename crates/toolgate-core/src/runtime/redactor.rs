// crates/toolgate-core/src/runtime/redactor.rs
// ============================================================================
// Module: Toolgate Redactor
// Description: Ordered pattern-based PII redaction over JSON payloads.
// Purpose: Produce structurally identical payload copies with PII replaced.
// Dependencies: regex, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Redactor`] applies its rules in a fixed order. Each rule replaces every
//! match with a placeholder naming its kind, e.g. `[REDACTED:EMAIL]`. The
//! built-in order is email, card, ssn, phone, ip; custom rules follow in
//! configuration order. Earlier rules win overlaps.
//!
//! Strings are scanned directly and numbers through their decimal text. A
//! matching number becomes its redacted string. Booleans and null pass
//! through. Rules whose pattern matches the empty string or any placeholder
//! are rejected at construction, which keeps redaction idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::NoExpand;
use regex::Regex;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Built-in Patterns
// ============================================================================

/// Built-in rule kinds and patterns, in application order.
pub const BUILTIN_PATTERNS: [(&str, &str); 5] = [
    ("email", r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b"),
    ("card", r"\b(?:\d{4}[- ]){3}\d{4}\b|\b\d{13,16}\b"),
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    ("phone", r"\(\d{3}\)\s?\d{3}-\d{4}\b|\b\d{3}[-.]\d{3}[-.]\d{4}\b"),
    ("ip", r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
];

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One redaction rule.
#[derive(Debug, Clone)]
pub struct RedactionRule {
    /// Rule kind label (lowercase).
    kind: String,
    /// Compiled pattern.
    pattern: Regex,
    /// Replacement token.
    placeholder: String,
}

impl RedactionRule {
    /// Compiles a rule. The placeholder is `[REDACTED:<KIND>]`.
    ///
    /// # Errors
    ///
    /// Returns [`RedactionError`] when the kind is blank or the pattern does
    /// not compile.
    pub fn new(kind: &str, pattern: &str) -> Result<Self, RedactionError> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(RedactionError::InvalidRule("rule kind must be non-empty".to_string()));
        }
        let compiled = Regex::new(pattern)
            .map_err(|err| RedactionError::InvalidPattern(format!("{kind}: {err}")))?;
        Ok(Self {
            kind: kind.to_ascii_lowercase(),
            placeholder: format!("[REDACTED:{}]", kind.to_ascii_uppercase()),
            pattern: compiled,
        })
    }

    /// Returns the rule kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the replacement token.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns true when the rule matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Compiles the built-in rules.
///
/// # Errors
///
/// Returns [`RedactionError`] if a built-in pattern fails to compile.
pub fn builtin_rules() -> Result<Vec<RedactionRule>, RedactionError> {
    BUILTIN_PATTERNS.iter().map(|(kind, pattern)| RedactionRule::new(kind, pattern)).collect()
}

// ============================================================================
// SECTION: Redactor
// ============================================================================

/// Ordered rule set applied to payloads.
#[derive(Debug, Clone)]
pub struct Redactor {
    /// Rules in application order.
    rules: Vec<RedactionRule>,
}

impl Redactor {
    /// Builds a redactor from rules in application order.
    ///
    /// # Errors
    ///
    /// Returns [`RedactionError::InvalidRule`] when a rule matches the empty
    /// string or any rule's placeholder.
    pub fn new(rules: Vec<RedactionRule>) -> Result<Self, RedactionError> {
        for rule in &rules {
            if rule.is_match("") {
                return Err(RedactionError::InvalidRule(format!(
                    "{} pattern matches empty text",
                    rule.kind
                )));
            }
            if let Some(other) = rules.iter().find(|other| rule.is_match(&other.placeholder)) {
                return Err(RedactionError::InvalidRule(format!(
                    "{} pattern matches placeholder {}",
                    rule.kind, other.placeholder
                )));
            }
        }
        Ok(Self {
            rules,
        })
    }

    /// Builds a redactor with the built-in rules only.
    ///
    /// # Errors
    ///
    /// Returns [`RedactionError`] if a built-in pattern fails to compile.
    pub fn with_builtin() -> Result<Self, RedactionError> {
        Self::new(builtin_rules()?)
    }

    /// Builds a redactor that changes nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            rules: Vec::new(),
        }
    }

    /// Returns the rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Returns a redacted copy of `payload`.
    #[must_use]
    pub fn redact(&self, payload: &Value) -> Value {
        match payload {
            Value::String(text) => Value::String(self.redact_str(text)),
            Value::Number(number) => {
                let text = number.to_string();
                let redacted = self.redact_str(&text);
                if redacted == text { payload.clone() } else { Value::String(redacted) }
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.redact(item)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.redact(value)))
                    .collect::<Map<String, Value>>(),
            ),
            Value::Bool(_) | Value::Null => payload.clone(),
        }
    }

    /// Returns `text` with every rule applied in order.
    #[must_use]
    pub fn redact_str(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |current, rule| {
            rule.pattern.replace_all(&current, NoExpand(&rule.placeholder)).into_owned()
        })
    }

    /// Returns true when any rule matches `text`.
    #[must_use]
    pub fn contains_pii(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(text))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Redaction rule construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedactionError {
    /// Pattern failed to compile.
    #[error("invalid redaction pattern: {0}")]
    InvalidPattern(String),
    /// Rule is unusable.
    #[error("invalid redaction rule: {0}")]
    InvalidRule(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
