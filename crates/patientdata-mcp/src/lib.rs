//! MCP (Model Context Protocol) tool server for the patient dataset
//!
//! The server speaks line-delimited JSON-RPC 2.0 on stdin/stdout and exposes
//! the read-only patient queries as tools plus a few resources.
//!
//! - `server`: message dispatch over a shared [`patientdata_lib::Dataset`]
//! - `tools`: tool catalog and fault-isolating execution
//! - `resources`: `patient://` resources
//! - `transport`: stdio framing and the read loop
//! - `error`: JSON-RPC error objects
//!
//! All logging goes to stderr to keep stdout a clean protocol stream.

pub mod error;
pub mod logging;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use logging::configure_tracing;
pub use server::ToolServer;
pub use transport::{run_server_loop, StdioTransport};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use patientdata_lib::{resolve_dataset_path, Dataset};

/// Resolve and load the dataset, then serve over the process's stdio.
pub async fn serve_stdio(data_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_dataset_path(data_path).context("Failed to locate patient dataset")?;
    let dataset = Dataset::load(&path)
        .with_context(|| format!("Failed to load patient dataset from {}", path.display()))?;

    let server = ToolServer::new(Arc::new(dataset));
    run_server_loop(StdioTransport::stdio(), server).await
}
