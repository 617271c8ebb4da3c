// crates/toolgate-mcp/src/runtime.rs
// ============================================================================
// Module: Toolgate Runtime Assembly
// Description: Builds the request path from configuration.
// Purpose: One place that wires policy, redaction, audit, and tools together.
// Dependencies: toolgate-core, toolgate-config, toolgate-audit, toolgate-tools
// ============================================================================

//! ## Overview
//! Construction fails closed: an invalid policy, redaction pattern, audit
//! directory, or corpus aborts startup instead of serving with a partial
//! configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use toolgate_audit::FileAuditLog;
use toolgate_audit::RetentionPolicy;
use toolgate_config::AuditConfig;
use toolgate_config::ToolgateConfig;
use toolgate_config::ToolsConfig;
use toolgate_core::AuditLog;
use toolgate_core::Guardian;
use toolgate_core::PolicyStore;
use toolgate_core::ToolDispatcher;
use toolgate_tools::BuiltinToolsConfig;
use toolgate_tools::SummarizeConfig;
use toolgate_tools::builtin_registry;

use crate::server::McpServerError;

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Fully wired request path.
#[derive(Clone)]
pub struct ToolgateRuntime {
    /// Loaded configuration.
    config: Arc<ToolgateConfig>,
    /// Live policy store.
    policy: Arc<PolicyStore>,
    /// Rotating audit log.
    audit: Arc<FileAuditLog>,
    /// Dispatcher over the built-in tools.
    dispatcher: ToolDispatcher,
}

impl ToolgateRuntime {
    /// Builds the runtime from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Config`] for invalid policy or redaction
    /// settings and [`McpServerError::Init`] when the audit log or tools
    /// cannot be created.
    pub fn from_config(config: ToolgateConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let table = config.policy.to_table().map_err(|err| McpServerError::Config(err.to_string()))?;
        let redactor =
            config.redaction.build_redactor().map_err(|err| McpServerError::Config(err.to_string()))?;
        let audit = FileAuditLog::open(config.audit.dir.clone(), config.audit.prefix.clone())
            .map_err(|err| McpServerError::Init(err.to_string()))?
            .with_retention(retention_policy(&config.audit));
        let registry = builtin_registry(&builtin_tools_config(&config.tools))
            .map_err(|err| McpServerError::Init(err.to_string()))?;

        let policy = Arc::new(PolicyStore::new(table));
        let audit = Arc::new(audit);
        let sink: Arc<dyn AuditLog> = audit.clone();
        let guardian = Guardian::new(Arc::clone(&policy), Arc::new(redactor), sink)
            .with_output_redaction(config.guardian.redact_outputs);
        let dispatcher = ToolDispatcher::new(Arc::new(guardian), Arc::new(registry));
        tracing::info!(
            policy_version = config.policy.version.as_str(),
            tools = config.policy.tools.len(),
            audit_dir = %config.audit.dir.display(),
            "runtime assembled"
        );
        Ok(Self {
            config: Arc::new(config),
            policy,
            audit,
            dispatcher,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Arc<ToolgateConfig> {
        &self.config
    }

    /// Returns the policy store.
    #[must_use]
    pub const fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    /// Returns the audit log.
    #[must_use]
    pub const fn audit(&self) -> &Arc<FileAuditLog> {
        &self.audit
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }
}

// ============================================================================
// SECTION: Config Mapping
// ============================================================================

/// Maps audit settings onto the retention policy.
#[must_use]
pub fn retention_policy(config: &AuditConfig) -> RetentionPolicy {
    RetentionPolicy {
        compress_after_days: config.compress_after_days,
        remove_after_days: config.remove_after_days,
        archive_dir: config.archive_dir.clone(),
    }
}

/// Maps tool settings onto the built-in registry configuration.
fn builtin_tools_config(config: &ToolsConfig) -> BuiltinToolsConfig {
    BuiltinToolsConfig {
        corpus_path: config.corpus_path.clone(),
        summarize: SummarizeConfig {
            default_max_sentences: config.summarize_max_sentences,
        },
        ..BuiltinToolsConfig::default()
    }
}
