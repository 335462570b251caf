use thiserror::Error;

/// Ways a single bridged tool invocation can fail.
///
/// Tool-level failures (unknown tool, missing record) are not errors here;
/// they arrive as a successful [`crate::ToolOutcome`] with `is_error` set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The server process could not be started.
    #[error("failed to spawn MCP server '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// Writing to or reading from the server pipes failed.
    #[error("MCP transport error: {reason}")]
    Transport { reason: String },

    /// No response to the tool call arrived before the hard timeout.
    #[error("MCP server response timeout (tool '{tool}' after {timeout_ms}ms)")]
    Timeout { tool: String, timeout_ms: u64 },

    /// The server produced no correlatable response at all.
    #[error("No response from MCP server")]
    NoResponse,

    /// The server answered with a JSON-RPC `error` member.
    #[error("{message}")]
    Rpc { code: i32, message: String },

    /// A response carried neither `result` nor `error`.
    #[error("Invalid MCP response format")]
    InvalidResponse,
}

impl BridgeError {
    /// Timeouts and silent servers, as opposed to answers the server gave.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BridgeError::Spawn { .. }
                | BridgeError::Transport { .. }
                | BridgeError::Timeout { .. }
                | BridgeError::NoResponse
        )
    }
}
