// crates/toolgate-core/src/core/policy.rs
// ============================================================================
// Module: Toolgate Policy Table
// Description: Per-tool execution policy and the immutable allowlist table.
// Purpose: Hold validated policy data for the policy store to swap atomically.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`PolicyTable`] is built once from configuration and never mutated. It
//! rejects duplicate tool names at construction, so a table that exists is
//! always unambiguous. Tools absent from the table are treated as denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::ToolName;

// ============================================================================
// SECTION: Policy Entry
// ============================================================================

/// Execution policy for a single tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Tool the entry applies to.
    pub tool_name: ToolName,
    /// Whether the tool may be invoked at all.
    pub allowed: bool,
    /// Execution budget in seconds.
    pub timeout_seconds: f64,
    /// Maximum serialized argument size in bytes.
    pub max_payload_bytes: usize,
}

impl PolicyEntry {
    /// Returns the execution budget as a [`Duration`].
    ///
    /// Non-finite or negative budgets collapse to zero, which times out
    /// immediately.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::ZERO)
    }
}

// ============================================================================
// SECTION: Policy Table
// ============================================================================

/// Immutable allowlist keyed by tool name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyTable {
    /// Version label of the configuration source.
    version: String,
    /// Entries keyed by tool name.
    entries: BTreeMap<String, PolicyEntry>,
}

impl PolicyTable {
    /// Builds a table from entries.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when a tool name is blank or appears twice.
    pub fn new(
        version: impl Into<String>,
        entries: impl IntoIterator<Item = PolicyEntry>,
    ) -> Result<Self, PolicyError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if entry.tool_name.is_blank() {
                return Err(PolicyError::Invalid("tool name must be non-empty".to_string()));
            }
            match map.entry(entry.tool_name.as_str().to_string()) {
                Entry::Occupied(occupied) => {
                    return Err(PolicyError::DuplicateTool(occupied.key().clone()));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                }
            }
        }
        Ok(Self {
            version: version.into(),
            entries: map,
        })
    }

    /// Returns a table that denies every tool.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: String::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Returns the version label.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the entry for `tool_name`, if any.
    #[must_use]
    pub fn get(&self, tool_name: &str) -> Option<&PolicyEntry> {
        self.entries.get(tool_name)
    }

    /// Iterates over entries in tool-name order.
    pub fn entries(&self) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.values()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes the canonical digest of the table.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn digest(&self) -> Result<HashDigest, HashError> {
        hash_canonical_json(DEFAULT_HASH_ALGORITHM, self)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy table and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Same tool listed more than once.
    #[error("duplicate tool in policy: {0}")]
    DuplicateTool(String),
    /// Entry failed validation.
    #[error("invalid policy: {0}")]
    Invalid(String),
    /// Tool has no policy entry.
    #[error("no policy for tool: {0}")]
    NotFound(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only policy fixtures.")]

    use std::time::Duration;

    use super::PolicyEntry;
    use super::PolicyError;
    use super::PolicyTable;
    use crate::core::identifiers::ToolName;

    fn entry(name: &str) -> PolicyEntry {
        PolicyEntry {
            tool_name: ToolName::new(name),
            allowed: true,
            timeout_seconds: 2.5,
            max_payload_bytes: 1024,
        }
    }

    #[test]
    fn duplicate_tool_names_are_rejected() {
        let err = PolicyTable::new("v1", vec![entry("echo"), entry("echo")]).unwrap_err();
        assert_eq!(err, PolicyError::DuplicateTool("echo".to_string()));
    }

    #[test]
    fn blank_tool_names_are_rejected() {
        let err = PolicyTable::new("v1", vec![entry("  ")]).unwrap_err();
        assert!(matches!(err, PolicyError::Invalid(_)));
    }

    #[test]
    fn timeout_converts_fractional_seconds() {
        assert_eq!(entry("echo").timeout(), Duration::from_millis(2500));
        let mut broken = entry("echo");
        broken.timeout_seconds = f64::NAN;
        assert_eq!(broken.timeout(), Duration::ZERO);
    }

    #[test]
    fn digest_changes_with_content() {
        let first = PolicyTable::new("v1", vec![entry("echo")]).unwrap();
        let mut denied = entry("echo");
        denied.allowed = false;
        let second = PolicyTable::new("v1", vec![denied]).unwrap();
        assert_ne!(first.digest().unwrap(), second.digest().unwrap());
    }
}
