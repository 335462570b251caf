use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "patientdata-mcp", version, about = "Patient dataset MCP server (stdio)")]
struct Args {
    /// Path to the patients.json dataset (overrides PATIENTDATA_DATA_PATH)
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `patientdata_mcp=trace`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    patientdata_mcp::configure_tracing(args.log_level.as_deref())?;
    patientdata_mcp::serve_stdio(args.data.as_deref()).await
}
