//! Request dispatch for the tool server.
//!
//! [`ToolServer`] is transport-agnostic: it maps one inbound JSON-RPC message
//! to at most one outbound message. Notifications produce no output; every
//! request with an id produces exactly one response carrying that id.

use std::sync::Arc;

use patientdata_lib::Dataset;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::Error;
use crate::resources;
use crate::tools;
use crate::types::{
    error_response, success_response, CallToolParams, IncomingMessage, ReadResourceParams,
    PROTOCOL_VERSION, SERVER_NAME,
};

/// Stateless request handler over a shared, immutable dataset.
#[derive(Debug, Clone)]
pub struct ToolServer {
    dataset: Arc<Dataset>,
}

impl ToolServer {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        info!(patient_count = dataset.len(), "tool server ready");
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Handle one undecoded input line. Bytes that are not UTF-8 get the
    /// same parse error as malformed JSON.
    pub fn handle_bytes(&self, line: &[u8]) -> Option<Value> {
        match std::str::from_utf8(line) {
            Ok(text) => self.handle_line(text),
            Err(err) => {
                debug!(error = %err, "discarding undecodable line");
                Some(error_response(
                    Value::Null,
                    &Error::parse_error(format!("invalid UTF-8: {err}")),
                ))
            }
        }
    }

    /// Handle one raw input line. Blank lines are ignored; lines that are not
    /// JSON get a parse error response with a null id.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_message(value),
            Err(err) => {
                debug!(error = %err, "discarding unparseable line");
                Some(error_response(Value::Null, &Error::parse_error(err.to_string())))
            }
        }
    }

    /// Handle one decoded JSON-RPC message.
    pub fn handle_message(&self, value: Value) -> Option<Value> {
        let raw_id = value.get("id").cloned();
        let message: IncomingMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                return Some(error_response(
                    raw_id.unwrap_or(Value::Null),
                    &Error::invalid_request(err.to_string()),
                ));
            }
        };

        let Some(id) = message.id.clone() else {
            self.handle_notification(&message);
            return None;
        };

        let response = match self.dispatch(&message) {
            Ok(result) => success_response(id, result),
            Err(err) => error_response(id, &err),
        };
        Some(response)
    }

    fn handle_notification(&self, message: &IncomingMessage) {
        match message.method.as_str() {
            "notifications/initialized" => debug!("client initialized"),
            other => debug!(method = other, "ignoring notification"),
        }
    }

    fn dispatch(&self, message: &IncomingMessage) -> Result<Value, Error> {
        debug!(method = %message.method, "request");
        match message.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
                "capabilities": {"tools": {}, "resources": {}}
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::catalog() })),
            "tools/call" => {
                let params: CallToolParams = params(&message.params)?;
                let result = tools::call_tool(&self.dataset, &params.name, params.arguments);
                to_value(&result)
            }
            "resources/list" => Ok(json!({ "resources": resources::list() })),
            "resources/read" => {
                let params: ReadResourceParams = params(&message.params)?;
                to_value(&resources::read(&self.dataset, &params.uri))
            }
            other => Err(Error::method_not_found(other)),
        }
    }
}

fn params<T: DeserializeOwned>(raw: &Value) -> Result<T, Error> {
    serde_json::from_value(raw.clone()).map_err(|err| Error::invalid_params("params", err.to_string()))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| Error::internal(err.to_string()))
}
