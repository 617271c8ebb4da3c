// crates/toolgate-cli/src/main.rs
// ============================================================================
// Module: Toolgate CLI Entry Point
// Description: Command dispatcher for the server, evaluation gate, and audit.
// Purpose: Single binary for serving tools and gating releases in CI.
// Dependencies: clap, tokio, tracing-subscriber, toolgate-*
// ============================================================================

//! ## Overview
//! `toolgate serve` runs the JSON-RPC server. `toolgate eval run` evaluates a
//! dataset and exits non-zero when any gate fails. `toolgate audit` queries,
//! reports on, and maintains the audit log. `toolgate config` validates or
//! prints configuration. Logs go to stderr; stdout carries command output
//! only, which keeps the stdio transport clean.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod audit_admin;
mod eval_run;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;
use toolgate_config::ToolgateConfig;
use toolgate_config::config_toml_example;
use toolgate_core::AuditEventType;
use toolgate_mcp::McpServer;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TOOLGATE_LOG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "toolgate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the JSON-RPC tool server.
    Serve(ServeCommand),
    /// Evaluation gate utilities.
    Eval {
        /// Selected eval subcommand.
        #[command(subcommand)]
        command: EvalCommand,
    },
    /// Audit log utilities.
    Audit {
        /// Selected audit subcommand.
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to toolgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Eval subcommands.
#[derive(Subcommand, Debug)]
enum EvalCommand {
    /// Run the evaluation gate over a dataset.
    Run(EvalRunCommand),
}

/// Arguments for `eval run`.
#[derive(Args, Debug)]
struct EvalRunCommand {
    /// JSONL dataset path.
    #[arg(long, value_name = "PATH")]
    dataset: PathBuf,
    /// Directory receiving the run artifacts.
    #[arg(long, value_name = "DIR")]
    out: PathBuf,
    /// Ordering seed (defaults to `evaluation.seed`).
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Audit subcommands.
#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Print matching audit events as JSON lines.
    Query(AuditQueryCommand),
    /// Summarize audit events.
    Report(AuditReportCommand),
    /// Compress, archive, and remove old partitions.
    Maintain(AuditMaintainCommand),
}

/// Audit event category argument.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EventTypeArg {
    /// Tool call outcomes.
    #[value(name = "tool_call")]
    ToolCall,
    /// Admission decisions.
    #[value(name = "security_event")]
    SecurityEvent,
    /// Lifecycle notes.
    #[value(name = "system_event")]
    SystemEvent,
}

impl From<EventTypeArg> for AuditEventType {
    fn from(value: EventTypeArg) -> Self {
        match value {
            EventTypeArg::ToolCall => Self::ToolCall,
            EventTypeArg::SecurityEvent => Self::SecurityEvent,
            EventTypeArg::SystemEvent => Self::SystemEvent,
        }
    }
}

/// Time-window arguments shared by audit commands.
#[derive(Args, Debug, Default)]
struct TimeWindowArgs {
    /// Inclusive RFC 3339 lower bound.
    #[arg(long, value_name = "TIME")]
    since: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    #[arg(long, value_name = "TIME")]
    until: Option<String>,
}

/// Arguments for `audit query`.
#[derive(Args, Debug)]
struct AuditQueryCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Match one request id.
    #[arg(long, value_name = "ID")]
    request_id: Option<String>,
    /// Match one tool.
    #[arg(long = "tool", value_name = "NAME")]
    tool_name: Option<String>,
    /// Match one event category.
    #[arg(long, value_enum)]
    event_type: Option<EventTypeArg>,
    /// Time window.
    #[command(flatten)]
    window: TimeWindowArgs,
    /// Most recent matches to print.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
}

/// Report output formats.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ReportFormat {
    /// Markdown report.
    #[default]
    Markdown,
    /// JSON metrics.
    Json,
}

/// Arguments for `audit report`.
#[derive(Args, Debug)]
struct AuditReportCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Time window.
    #[command(flatten)]
    window: TimeWindowArgs,
    /// Failing tools listed in the report.
    #[arg(long, value_name = "N", default_value_t = 5)]
    top: usize,
    /// Output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    format: ReportFormat,
}

/// Arguments for `audit maintain`.
#[derive(Args, Debug)]
struct AuditMaintainCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// RFC 3339 instant to run maintenance as of (defaults to now).
    #[arg(long, value_name = "TIME")]
    now: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
    /// Print an example config.
    Example,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to toolgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the message shown to the user.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("toolgate {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Eval {
            command,
        } => match command {
            EvalCommand::Run(command) => eval_run::command_eval_run(command).await,
        },
        Commands::Audit {
            command,
        } => match command {
            AuditCommand::Query(command) => audit_admin::command_audit_query(&command),
            AuditCommand::Report(command) => audit_admin::command_audit_report(&command),
            AuditCommand::Maintain(command) => audit_admin::command_audit_maintain(&command),
        },
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let path = config.source_path.as_deref().map_or_else(String::new, |path| path.display().to_string());
    write_stdout_line(&format!(
        "config ok: {path} (policy {}, {} tools, {} gates)",
        config.policy.version,
        config.policy.tools.len(),
        config.evaluation.gates.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration, mapping failures to a CLI error.
fn load_config(path: Option<&Path>) -> CliResult<ToolgateConfig> {
    ToolgateConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    let help = command.render_long_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Writes an error to stderr and returns a failing exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
