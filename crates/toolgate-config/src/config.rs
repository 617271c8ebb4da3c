// crates/toolgate-config/src/config.rs
// ============================================================================
// Module: Toolgate Configuration
// Description: Configuration loading and validation for Toolgate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: toolgate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: the process refuses to
//! start rather than run with a partial or ambiguous allowlist.
//!
//! The allowlist lives under `[policy.tools.<name>]`. TOML forbids repeated
//! keys, so a tool listed twice is a parse error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use toolgate_core::GateSpec;
use toolgate_core::PolicyEntry;
use toolgate_core::PolicyTable;
use toolgate_core::RedactionRule;
use toolgate_core::Redactor;
use toolgate_core::ToolName;
use toolgate_core::is_valid_tool_name;
use toolgate_core::runtime::redactor::builtin_rules;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "toolgate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TOOLGATE_CONFIG";
/// Environment variable overriding the audit removal threshold in days.
pub const AUDIT_RETENTION_ENV_VAR: &str = "AUDIT_RETENTION_DAYS";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of policy entries.
const MAX_POLICY_TOOLS: usize = 512;
/// Maximum per-tool timeout in seconds.
const MAX_TIMEOUT_SECONDS: f64 = 3600.0;
/// Maximum number of custom redaction patterns.
const MAX_CUSTOM_PATTERNS: usize = 64;
/// Maximum number of evaluation gates.
const MAX_GATES: usize = 64;
/// Maximum evaluation concurrency.
const MAX_EVAL_CONCURRENCY: usize = 64;

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Toolgate configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolgateConfig {
    /// Server transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tool allowlist.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Redaction rules.
    #[serde(default)]
    pub redaction: RedactionConfig,
    /// Guardian behavior.
    #[serde(default)]
    pub guardian: GuardianConfig,
    /// Audit log storage and retention.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Evaluation gate engine settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Path the configuration was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ToolgateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `TOOLGATE_CONFIG`, then
    /// `toolgate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// `AUDIT_RETENTION_DAYS` replaces `audit.remove_after_days`; a retention
    /// shorter than `audit.compress_after_days` pulls compression down to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override is malformed.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(AUDIT_RETENTION_ENV_VAR) {
            let days = value.trim().parse::<u32>().map_err(|_| {
                ConfigError::Invalid(format!("{AUDIT_RETENTION_ENV_VAR} must be a whole number"))
            })?;
            if days == 0 {
                return Err(ConfigError::Invalid(format!("{AUDIT_RETENTION_ENV_VAR} must be at least 1")));
            }
            self.audit.remove_after_days = days;
            self.audit.compress_after_days = self.audit.compress_after_days.min(days);
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.policy.validate()?;
        self.redaction.validate()?;
        self.audit.validate()?;
        self.evaluation.validate()?;
        self.tools.validate()?;
        Ok(())
    }

    /// Re-reads the policy table from the file this config was loaded from.
    ///
    /// Only the `[policy]` section of the fresh file is used; every other
    /// section keeps its startup value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, invalid, or was not
    /// loaded from disk.
    pub fn reload_policy_table(&self) -> Result<PolicyTable, ConfigError> {
        let path = self
            .source_path
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("config was not loaded from a file".to_string()))?;
        let fresh = Self::load(Some(path))?;
        fresh.policy.to_table()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Supported server transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Content-Length framed JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP.
    Http,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for HTTP.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enables `admin/*` JSON-RPC methods.
    #[serde(default)]
    pub admin_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_body_bytes: default_max_body_bytes(),
            admin_enabled: false,
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.transport == ServerTransport::Http {
            let bind = self.bind.as_deref().unwrap_or_default().trim();
            if bind.is_empty() {
                return Err(ConfigError::Invalid("http transport requires bind address".to_string()));
            }
            bind.parse::<SocketAddr>()
                .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Allowlist configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Version label of this allowlist.
    #[serde(default = "default_policy_version")]
    pub version: String,
    /// Per-tool entries keyed by tool name.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolPolicyConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: default_policy_version(),
            tools: BTreeMap::new(),
        }
    }
}

/// One allowlist entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolPolicyConfig {
    /// Whether the tool may run. Omitted means denied.
    #[serde(default)]
    pub allowed: bool,
    /// Execution budget in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Maximum serialized argument size in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl PolicyConfig {
    /// Validates allowlist entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid("policy.version must be non-empty".to_string()));
        }
        if self.tools.len() > MAX_POLICY_TOOLS {
            return Err(ConfigError::Invalid("too many policy.tools entries".to_string()));
        }
        for (name, entry) in &self.tools {
            if !is_valid_tool_name(name) {
                return Err(ConfigError::Invalid(format!("invalid tool name: {name}")));
            }
            if !entry.timeout_seconds.is_finite()
                || entry.timeout_seconds <= 0.0
                || entry.timeout_seconds > MAX_TIMEOUT_SECONDS
            {
                return Err(ConfigError::Invalid(format!(
                    "policy.tools.{name}.timeout_seconds must be in (0, {MAX_TIMEOUT_SECONDS}]"
                )));
            }
            if entry.max_payload_bytes == 0 {
                return Err(ConfigError::Invalid(format!(
                    "policy.tools.{name}.max_payload_bytes must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Builds the immutable policy table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the table cannot be built.
    pub fn to_table(&self) -> Result<PolicyTable, ConfigError> {
        self.validate()?;
        PolicyTable::new(
            self.version.clone(),
            self.tools.iter().map(|(name, entry)| PolicyEntry {
                tool_name: ToolName::new(name.as_str()),
                allowed: entry.allowed,
                timeout_seconds: entry.timeout_seconds,
                max_payload_bytes: entry.max_payload_bytes,
            }),
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

// ============================================================================
// SECTION: Redaction and Guardian
// ============================================================================

/// Redaction configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedactionConfig {
    /// Applies the built-in email/card/ssn/phone rules first.
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Extra rules applied after the built-ins, in order.
    #[serde(default)]
    pub custom: Vec<CustomPatternConfig>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            custom: Vec::new(),
        }
    }
}

/// Custom redaction rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomPatternConfig {
    /// Kind label used in the placeholder.
    pub kind: String,
    /// Regular expression.
    pub pattern: String,
}

impl RedactionConfig {
    /// Validates rules by building the redactor.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.custom.len() > MAX_CUSTOM_PATTERNS {
            return Err(ConfigError::Invalid("too many redaction.custom patterns".to_string()));
        }
        self.build_redactor().map(|_| ())
    }

    /// Builds the configured redactor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a rule is unusable.
    pub fn build_redactor(&self) -> Result<Redactor, ConfigError> {
        let mut rules = if self.builtin {
            builtin_rules().map_err(|err| ConfigError::Invalid(err.to_string()))?
        } else {
            Vec::new()
        };
        for custom in &self.custom {
            rules.push(
                RedactionRule::new(&custom.kind, &custom.pattern)
                    .map_err(|err| ConfigError::Invalid(err.to_string()))?,
            );
        }
        Redactor::new(rules).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

/// Guardian configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardianConfig {
    /// Redacts tool outputs returned to callers.
    #[serde(default = "default_true")]
    pub redact_outputs: bool,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            redact_outputs: true,
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Directory holding daily audit files.
    #[serde(default = "default_audit_dir")]
    pub dir: PathBuf,
    /// File name prefix.
    #[serde(default = "default_audit_prefix")]
    pub prefix: String,
    /// Age in days after which files are gzip-compressed.
    #[serde(default = "default_compress_after_days")]
    pub compress_after_days: u32,
    /// Age in days after which files are archived or removed.
    #[serde(default = "default_remove_after_days")]
    pub remove_after_days: u32,
    /// Archive directory; expired files are deleted when unset.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dir: default_audit_dir(),
            prefix: default_audit_prefix(),
            compress_after_days: default_compress_after_days(),
            remove_after_days: default_remove_after_days(),
            archive_dir: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit storage configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("audit.dir", &self.dir.to_string_lossy())?;
        if let Some(archive) = &self.archive_dir {
            validate_path_string("audit.archive_dir", &archive.to_string_lossy())?;
        }
        let prefix_ok = !self.prefix.is_empty()
            && self.prefix.len() <= 64
            && self
                .prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'));
        if !prefix_ok {
            return Err(ConfigError::Invalid(
                "audit.prefix must be 1-64 chars of [A-Za-z0-9_-]".to_string(),
            ));
        }
        if self.compress_after_days == 0 {
            return Err(ConfigError::Invalid(
                "audit.compress_after_days must be greater than zero".to_string(),
            ));
        }
        if self.remove_after_days < self.compress_after_days {
            return Err(ConfigError::Invalid(
                "audit.remove_after_days must be at least audit.compress_after_days".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluation gate engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Default ordering seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Cutoffs for rank metrics.
    #[serde(default = "default_k_values")]
    pub k_values: Vec<usize>,
    /// Maximum dataset items in flight.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Tool used for retrieval.
    #[serde(default = "default_retrieval_tool")]
    pub retrieval_tool: String,
    /// Tool used for answer generation.
    #[serde(default = "default_answer_tool")]
    pub answer_tool: String,
    /// Number of retrieved documents handed to the answer tool.
    #[serde(default = "default_context_size")]
    pub context_size: usize,
    /// Gate table.
    #[serde(default)]
    pub gates: Vec<GateSpec>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            k_values: default_k_values(),
            max_concurrency: default_max_concurrency(),
            retrieval_tool: default_retrieval_tool(),
            answer_tool: default_answer_tool(),
            context_size: default_context_size(),
            gates: Vec::new(),
        }
    }
}

impl EvaluationConfig {
    /// Validates evaluation settings and the gate table.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.k_values.is_empty() || self.k_values.contains(&0) {
            return Err(ConfigError::Invalid(
                "evaluation.k_values must be non-empty and positive".to_string(),
            ));
        }
        if self.max_concurrency == 0 || self.max_concurrency > MAX_EVAL_CONCURRENCY {
            return Err(ConfigError::Invalid(format!(
                "evaluation.max_concurrency must be in 1..={MAX_EVAL_CONCURRENCY}"
            )));
        }
        if self.context_size == 0 {
            return Err(ConfigError::Invalid(
                "evaluation.context_size must be greater than zero".to_string(),
            ));
        }
        for (field, name) in
            [("retrieval_tool", &self.retrieval_tool), ("answer_tool", &self.answer_tool)]
        {
            if !is_valid_tool_name(name) {
                return Err(ConfigError::Invalid(format!("evaluation.{field} is not a valid tool name")));
            }
        }
        if self.gates.len() > MAX_GATES {
            return Err(ConfigError::Invalid("too many evaluation.gates".to_string()));
        }
        let mut labels = BTreeSet::new();
        for gate in &self.gates {
            if gate.metric_name.trim().is_empty() {
                return Err(ConfigError::Invalid("gate metric_name must be non-empty".to_string()));
            }
            if !gate.threshold.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "gate {} threshold must be finite",
                    gate.label()
                )));
            }
            if !labels.insert(gate.label().to_string()) {
                return Err(ConfigError::Invalid(format!("duplicate gate: {}", gate.label())));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tools
// ============================================================================

/// Built-in tool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// JSONL corpus served by `search_docs`.
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
    /// Default sentence budget for `summarize`.
    #[serde(default = "default_summary_sentences")]
    pub summarize_max_sentences: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            summarize_max_sentences: default_summary_sentences(),
        }
    }
}

impl ToolsConfig {
    /// Validates built-in tool settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.corpus_path {
            validate_path_string("tools.corpus_path", &path.to_string_lossy())?;
        }
        if self.summarize_max_sentences == 0 {
            return Err(ConfigError::Invalid(
                "tools.summarize_max_sentences must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default allowlist version label.
fn default_policy_version() -> String {
    "1".to_string()
}

/// Default per-tool timeout.
const fn default_timeout_seconds() -> f64 {
    30.0
}

/// Default per-tool argument size limit.
const fn default_max_payload_bytes() -> usize {
    64 * 1024
}

/// Serde helper for boolean fields defaulting to true.
const fn default_true() -> bool {
    true
}

/// Default audit directory.
fn default_audit_dir() -> PathBuf {
    PathBuf::from("logs/audit")
}

/// Default audit file prefix.
fn default_audit_prefix() -> String {
    "audit".to_string()
}

/// Default compression threshold in days.
const fn default_compress_after_days() -> u32 {
    7
}

/// Default removal threshold in days.
const fn default_remove_after_days() -> u32 {
    30
}

/// Default evaluation seed.
const fn default_seed() -> u64 {
    42
}

/// Default rank cutoffs.
fn default_k_values() -> Vec<usize> {
    vec![5, 10]
}

/// Default evaluation concurrency.
const fn default_max_concurrency() -> usize {
    4
}

/// Default retrieval tool.
fn default_retrieval_tool() -> String {
    "search_docs".to_string()
}

/// Default answer tool.
fn default_answer_tool() -> String {
    "answer".to_string()
}

/// Default number of documents passed to the answer tool.
const fn default_context_size() -> usize {
    5
}

/// Default summary sentence budget.
const fn default_summary_sentences() -> usize {
    3
}
