//! `call` subcommand: invoke a tool through the bridge client.
//!
//! Without `--server` the CLI launches itself as the tool server
//! (`patientdata-cli [--data PATH] mcp`), so the full stdio round trip is
//! exercised with nothing else installed.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use patientdata_bridge::{BridgeClient, BridgeConfig, ToolInvoker};
use serde_json::Value;
use tracing::debug;

/// Launch configuration for the tool server behind `call`.
pub fn server_config(
    data: Option<&Path>,
    server: Option<&str>,
    timeout_ms: Option<u64>,
) -> Result<BridgeConfig> {
    let mut config = match server {
        Some(command) => BridgeConfig::from_command_line(command)
            .ok_or_else(|| anyhow!("--server must name a program"))?,
        None => {
            let exe = std::env::current_exe().context("failed to locate the running executable")?;
            let mut config = BridgeConfig::new(exe);
            if let Some(path) = data {
                config = config.arg("--data").arg(path);
            }
            config.arg("mcp")
        }
    };

    if let Some(ms) = timeout_ms {
        config.timings.timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

pub async fn handle_call(config: BridgeConfig, tool: &str, args: &str) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(args).with_context(|| format!("--args is not valid JSON: {args}"))?;

    debug!(tool, program = %config.program_display(), "calling tool through the bridge");
    let outcome = BridgeClient::new(config)
        .invoke(tool, arguments)
        .await
        .with_context(|| format!("tool call '{tool}' failed"))?;

    if outcome.is_error {
        bail!("{}", outcome.error_message());
    }

    let rendered = match &outcome.data {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other)?,
    };
    println!("{}", rendered);
    Ok(())
}
