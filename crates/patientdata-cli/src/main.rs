use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use patientdata_cli::commands::call::{handle_call, server_config};
use patientdata_cli::commands::check_env::handle_check_env;
use patientdata_cli::commands::mcp::handle_mcp;
use patientdata_cli::commands::query::{handle_query, QueryCommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Patient dataset utilities")]
struct Cli {
    /// Path to the patients.json dataset (overrides PATIENTDATA_DATA_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Tracing filter written to stderr, e.g. `debug` (default: RUST_LOG or `warn`).
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the MCP tool server over stdio.
    Mcp,
    /// Query the dataset in-process and print JSON.
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },
    /// Invoke a tool through a freshly spawned MCP server.
    Call {
        /// Tool name, e.g. get_patient_by_id.
        tool: String,
        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Server command line (default: this binary's `mcp` subcommand).
        #[arg(long)]
        server: Option<String>,
        /// Hard timeout for the tool call in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Check that the chat API key is configured in an env file.
    CheckEnv {
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The MCP server logs at info like the standalone binary; the rest stays quiet.
    let default_filter = match cli.command {
        Command::Mcp => None,
        _ if std::env::var_os("RUST_LOG").is_some() => None,
        _ => Some("warn"),
    };
    patientdata_mcp::configure_tracing(cli.log_level.as_deref().or(default_filter))?;

    let data = cli.data.as_deref();
    match cli.command {
        Command::Mcp => handle_mcp(data).await,
        Command::Query { query } => handle_query(data, &query),
        Command::Call {
            tool,
            args,
            server,
            timeout_ms,
        } => {
            let config = server_config(data, server.as_deref(), timeout_ms)?;
            handle_call(config, &tool, &args).await
        }
        Command::CheckEnv { env_file } => handle_check_env(&env_file),
    }
}
