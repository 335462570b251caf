use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use patientdata_lib::ToolCall;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::session;
use crate::types::ToolOutcome;

/// Anything that can execute a named tool with JSON arguments.
///
/// The HTTP gateway depends on this seam rather than on [`BridgeClient`], so
/// it can be driven without subprocesses.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolOutcome, BridgeError>;

    /// Invoke a typed call.
    async fn call(&self, call: &ToolCall) -> Result<ToolOutcome, BridgeError> {
        self.invoke(call.name().as_str(), call.arguments()).await
    }
}

/// Bridge client that launches a fresh tool server process for every call.
///
/// Cloning is cheap; clones share the immutable launch configuration and
/// nothing else.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    config: Arc<BridgeConfig>,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

#[async_trait]
impl ToolInvoker for BridgeClient {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolOutcome, BridgeError> {
        let started = Instant::now();
        debug!(tool, program = %self.config.program_display(), "invoking tool");

        let result = session::run(&self.config, tool, arguments).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => info!(tool, elapsed_ms, is_error = outcome.is_error, "tool call settled"),
            Err(err) => info!(tool, elapsed_ms, error = %err, "tool call failed"),
        }
        result
    }
}
