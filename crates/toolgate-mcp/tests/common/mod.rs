// crates/toolgate-mcp/tests/common/mod.rs
// =============================================================================
// Module: MCP Test Helpers
// Description: Config-file backed server fixtures.
// Purpose: Build servers over temporary audit directories.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use toolgate_config::ToolgateConfig;
use toolgate_mcp::McpServer;

/// Server plus the files backing it.
pub struct Fixture {
    /// Temporary root; dropped last.
    pub dir: TempDir,
    /// Config file the server was loaded from.
    pub config_path: PathBuf,
    /// Server under test.
    pub server: McpServer,
}

/// Writes a config file with the given policy version and echo status.
pub fn write_config(path: &Path, audit_dir: &Path, version: &str, echo_allowed: bool, admin: bool) {
    let content = format!(
        r#"
[server]
max_body_bytes = 2048
admin_enabled = {admin}

[policy]
version = "{version}"

[policy.tools.echo]
allowed = {echo_allowed}
timeout_seconds = 5.0
max_payload_bytes = 1024

[policy.tools.ping]
allowed = true

[policy.tools.shell_exec]
allowed = false

[audit]
dir = "{audit}"
"#,
        audit = audit_dir.display()
    );
    fs::write(path, content).unwrap();
}

/// Builds a server with echo and ping allowed.
pub fn fixture(admin: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("toolgate.toml");
    write_config(&config_path, &dir.path().join("audit"), "v1", true, admin);
    let config = ToolgateConfig::load(Some(&config_path)).unwrap();
    let server = McpServer::from_config(config).unwrap();
    Fixture {
        dir,
        config_path,
        server,
    }
}

/// Encodes a JSON-RPC request body.
pub fn rpc(id: u64, method: &str, params: &Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))
    .unwrap()
}
