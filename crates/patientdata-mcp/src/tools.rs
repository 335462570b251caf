//! MCP tool catalog and dispatch.
//!
//! Every outcome of a `tools/call` is a [`ToolResult`]: query output as a
//! single JSON text block, or an error-marked block when the tool is unknown,
//! the record is missing, the arguments are wrong, or the query panics.

use std::panic::{catch_unwind, AssertUnwindSafe};

use patientdata_lib::{Dataset, Error as LibError, ToolCall, ToolName};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ToolDescriptor, ToolResult};

/// Catalog served by `tools/list`.
pub fn catalog() -> Vec<ToolDescriptor> {
    ToolName::ALL
        .iter()
        .map(|tool| ToolDescriptor {
            name: tool.as_str().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

/// Execute a tool by name. Never fails and never panics.
pub fn call_tool(dataset: &Dataset, name: &str, arguments: Value) -> ToolResult {
    debug!(tool = name, "tools/call");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        ToolCall::parse(name, arguments).and_then(|call| call.execute(dataset))
    }));

    match outcome {
        Ok(Ok(text)) => ToolResult::text(text),
        Ok(Err(err @ (LibError::UnknownTool { .. } | LibError::PatientNotFound { .. }))) => {
            debug!(tool = name, "{}", err);
            ToolResult::error(err.to_string())
        }
        Ok(Err(err)) => {
            warn!(tool = name, error = %err, "tool execution failed");
            ToolResult::error(format!("Error executing tool {}: {}", name, err))
        }
        Err(_) => {
            warn!(tool = name, "tool execution panicked");
            ToolResult::error(format!("Error executing tool {}: internal error", name))
        }
    }
}
