//! `mcp` subcommand: serve the tool server over stdio.

use std::path::Path;

use anyhow::Result;

pub async fn handle_mcp(data: Option<&Path>) -> Result<()> {
    patientdata_mcp::serve_stdio(data).await
}
