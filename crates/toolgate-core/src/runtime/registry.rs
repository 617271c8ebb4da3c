// crates/toolgate-core/src/runtime/registry.rs
// ============================================================================
// Module: Toolgate Static Tool Registry
// Description: Name-keyed registry of tool implementations.
// Purpose: Resolve tools by name at call time with deterministic listings.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Registration is fail-closed: a second tool under an existing name is
//! rejected instead of silently replacing the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::interfaces::Tool;
use crate::interfaces::ToolDescriptor;
use crate::interfaces::ToolRegistry;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry backed by a sorted map.
#[derive(Default, Clone)]
pub struct StaticToolRegistry {
    /// Tools keyed by name.
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl StaticToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Returns true when a tool is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl ToolRegistry for StaticToolRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    fn describe(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name already registered.
    #[error("tool already registered: {0}")]
    Duplicate(String),
}
