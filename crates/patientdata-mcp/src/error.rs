//! JSON-RPC error objects for the tool server.
//!
//! Protocol-level failures (malformed JSON, unknown method, bad params) are
//! reported as JSON-RPC `error` members. Tool-level failures never use this
//! type; they become error-marked tool results instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 error object
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[error("{message}")]
pub struct Error {
    /// JSON-RPC error code (negative, reserved range)
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Additional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Error {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured context
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Line was not valid JSON
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, "Parse error").with_data(Value::String(reason.into()))
    }

    /// Message is JSON but not a JSON-RPC request
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {}", reason.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Unknown method: {}", method))
    }

    /// Invalid parameter error
    pub fn invalid_params(param: impl Into<String>, reason: impl Into<String>) -> Self {
        let p = param.into();
        Self::new(INVALID_PARAMS, format!("Invalid parameter: {}", p)).with_data(
            serde_json::json!({
                "parameter": p,
                "reason": reason.into()
            }),
        )
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, format!("Internal error: {}", reason.into()))
    }
}
