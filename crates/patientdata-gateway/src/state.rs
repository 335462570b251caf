//! Shared application state for the gateway handlers.

use std::sync::Arc;
use std::time::Instant;

use patientdata_bridge::{BridgeError, ToolInvoker, ToolOutcome};
use patientdata_lib::ToolCall;
use serde_json::Value;

use crate::metrics::{record_tool_invocation, record_tool_latency};
use crate::oracle::CompletionOracle;

/// Cheaply cloneable; shared via axum's `State` extractor.
///
/// The invoker runs every tool call (one subprocess per call in production).
/// The oracle is absent when no API key is configured, which disables chat.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    invoker: Arc<dyn ToolInvoker>,
    oracle: Option<Arc<dyn CompletionOracle>>,
}

impl AppState {
    pub fn from_components(
        invoker: Arc<dyn ToolInvoker>,
        oracle: Option<Arc<dyn CompletionOracle>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { invoker, oracle }),
        }
    }

    pub fn oracle(&self) -> Option<&dyn CompletionOracle> {
        self.inner.oracle.as_deref()
    }

    pub fn chat_enabled(&self) -> bool {
        self.inner.oracle.is_some()
    }

    /// Invoke a tool by name, recording outcome and latency metrics.
    pub async fn invoke_tool(
        &self,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolOutcome, BridgeError> {
        let started = Instant::now();
        let result = self.inner.invoker.invoke(tool, arguments).await;

        record_tool_latency(tool, started.elapsed());
        let outcome = match &result {
            Ok(o) if o.is_error => "tool_error",
            Ok(_) => "ok",
            Err(_) => "transport_error",
        };
        record_tool_invocation(tool, outcome);
        result
    }

    pub async fn call_tool(&self, call: &ToolCall) -> Result<ToolOutcome, BridgeError> {
        self.invoke_tool(call.name().as_str(), call.arguments()).await
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("chat_enabled", &self.chat_enabled())
            .finish()
    }
}
