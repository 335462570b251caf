//! JSON-RPC messages exchanged with the tool server, and result decoding.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::BridgeError;

/// Request id of the `initialize` handshake.
pub const INIT_ID: u64 = 1;
/// Request id of the single `tools/call`.
pub const CALL_ID: u64 = 2;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "mcp-bridge";

const DEFAULT_RPC_FAILURE: &str = "MCP tool call failed";

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }

    pub fn initialize() -> Self {
        Self::new(
            INIT_ID,
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": CLIENT_NAME, "version": env!("CARGO_PKG_VERSION")}
            })),
        )
    }

    pub fn tools_call(tool: &str, arguments: Value) -> Self {
        Self::new(
            CALL_ID,
            "tools/call",
            Some(json!({"name": tool, "arguments": arguments})),
        )
    }
}

/// JSON-RPC 2.0 notification (no id, no response).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
}

impl JsonRpcNotification {
    pub fn initialized() -> Self {
        Self {
            jsonrpc: "2.0",
            method: "notifications/initialized".to_string(),
        }
    }
}

/// JSON-RPC 2.0 response. Only objects with a numeric id deserialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<JsonRpcError> for BridgeError {
    fn from(err: JsonRpcError) -> Self {
        let message = if err.message.is_empty() {
            DEFAULT_RPC_FAILURE.to_string()
        } else {
            err.message
        };
        BridgeError::Rpc {
            code: err.code,
            message,
        }
    }
}

/// Decoded result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    /// Parsed tool output: JSON when the text block was JSON, else the text.
    pub data: Value,
    /// Tool-level failure reported by the server (`isError`).
    pub is_error: bool,
}

impl ToolOutcome {
    /// Human-readable message for an error-marked outcome.
    pub fn error_message(&self) -> String {
        match &self.data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Decode the response to `tools/call`. A transport `error` member wins over
/// any tool-level `isError`.
pub fn decode_tool_response(response: JsonRpcResponse) -> Result<ToolOutcome, BridgeError> {
    if let Some(err) = response.error {
        return Err(err.into());
    }
    let result = response.result.ok_or(BridgeError::InvalidResponse)?;

    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let text = result
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());

    let outcome = match text {
        Some(text) => ToolOutcome {
            data: serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
            is_error,
        },
        None => ToolOutcome {
            data: result,
            is_error,
        },
    };
    Ok(outcome)
}

/// Decode the most recent response of any id when the tool call itself was
/// never answered. The raw `result` is passed through as degraded data.
pub fn decode_fallback(response: JsonRpcResponse) -> Result<ToolOutcome, BridgeError> {
    if let Some(err) = response.error {
        return Err(err.into());
    }
    Ok(ToolOutcome {
        data: response.result.unwrap_or(Value::Null),
        is_error: false,
    })
}
