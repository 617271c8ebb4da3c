// crates/toolgate-cli/src/audit_admin.rs
// ============================================================================
// Module: Audit Commands
// Description: `toolgate audit query|report|maintain` implementations.
// Purpose: Offline access to the rotating audit log.
// Dependencies: toolgate-audit, toolgate-mcp, time
// ============================================================================

//! ## Overview
//! Commands open the log directory named by `[audit]` directly; no server
//! needs to be running.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use toolgate_audit::AuditMetrics;
use toolgate_audit::FileAuditLog;
use toolgate_audit::MaintenanceReport;
use toolgate_config::ToolgateConfig;
use toolgate_core::AuditEvent;
use toolgate_core::AuditFilter;
use toolgate_core::AuditLog;
use toolgate_mcp::AuditQuery;
use toolgate_mcp::runtime::retention_policy;

use crate::AuditMaintainCommand;
use crate::AuditQueryCommand;
use crate::AuditReportCommand;
use crate::CliError;
use crate::CliResult;
use crate::ReportFormat;
use crate::TimeWindowArgs;
use crate::load_config;
use crate::output_error;
use crate::write_stdout_line;

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `audit query`.
pub(crate) fn command_audit_query(command: &AuditQueryCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let query = AuditQuery {
        request_id: command.request_id.clone(),
        tool_name: command.tool_name.clone(),
        event_type: command.event_type.map(Into::into),
        since: command.window.since.clone(),
        until: command.window.until.clone(),
        limit: command.limit,
    };
    let filter = query.to_filter().map_err(CliError::new)?;
    for event in read_events(&config, &filter)? {
        let line = serde_json::to_string(&event)
            .map_err(|err| CliError::new(format!("failed to encode event: {err}")))?;
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `audit report`.
pub(crate) fn command_audit_report(command: &AuditReportCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let filter = window_filter(&command.window)?;
    let metrics = AuditMetrics::from_events(&read_events(&config, &filter)?);
    let rendered = render_metrics(&metrics, command.format, command.top)?;
    write_stdout_line(rendered.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `audit maintain`.
pub(crate) fn command_audit_maintain(command: &AuditMaintainCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let now = match command.now.as_deref() {
        Some(text) => parse_instant("now", text)?,
        None => OffsetDateTime::now_utc(),
    };
    let log = open_log(&config)?.with_retention(retention_policy(&config.audit));
    let report = log.maintain(now).map_err(|err| CliError::new(format!("maintenance failed: {err}")))?;
    let summary = maintenance_summary(&report);
    if !report.is_empty() {
        log.append(&AuditEvent::system(format!("audit maintenance: {summary}")));
    }
    write_stdout_line(&summary).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for path in report.compressed.iter().chain(&report.archived).chain(&report.removed) {
        write_stdout_line(&format!("  {}", path.display()))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens the configured audit log.
fn open_log(config: &ToolgateConfig) -> CliResult<FileAuditLog> {
    FileAuditLog::open(config.audit.dir.clone(), config.audit.prefix.clone())
        .map_err(|err| CliError::new(format!("failed to open audit log: {err}")))
}

/// Reads events matching `filter`.
fn read_events(config: &ToolgateConfig, filter: &AuditFilter) -> CliResult<Vec<AuditEvent>> {
    open_log(config)?
        .query(filter)
        .map_err(|err| CliError::new(format!("audit query failed: {err}")))
}

/// Builds an unlimited filter over a time window.
pub(crate) fn window_filter(window: &TimeWindowArgs) -> CliResult<AuditFilter> {
    let since = window.since.as_deref().map(|text| parse_instant("since", text)).transpose()?;
    let until = window.until.as_deref().map(|text| parse_instant("until", text)).transpose()?;
    Ok(AuditFilter {
        since,
        until,
        ..AuditFilter::default()
    })
}

/// Parses an RFC 3339 argument.
fn parse_instant(field: &str, text: &str) -> CliResult<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|_| CliError::new(format!("--{field} must be RFC 3339")))
}

/// Renders audit metrics in the requested format.
fn render_metrics(metrics: &AuditMetrics, format: ReportFormat, top: usize) -> CliResult<String> {
    match format {
        ReportFormat::Markdown => Ok(metrics.to_markdown(top)),
        ReportFormat::Json => serde_json::to_string_pretty(metrics)
            .map_err(|err| CliError::new(format!("failed to encode report: {err}"))),
    }
}

/// One-line summary of a maintenance pass.
pub(crate) fn maintenance_summary(report: &MaintenanceReport) -> String {
    format!(
        "compressed {}, archived {}, removed {}",
        report.compressed.len(),
        report.archived.len(),
        report.removed.len()
    )
}
