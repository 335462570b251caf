#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use patientdata_bridge::{BridgeError, ToolInvoker, ToolOutcome};
use patientdata_gateway::oracle::{
    ChatMessage, CompletionOracle, CompletionRequest, FunctionCallResponse, OracleError,
    ToolCallResponse,
};
use patientdata_gateway::{router, AppState};
use patientdata_lib::{Dataset, ToolCall};
use serde_json::Value;

pub fn fixture_dataset() -> Dataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/patients.json");
    Dataset::load(&path).expect("load fixture patients.json")
}

/// Runs tools in-process against the fixture and records every call.
pub struct DatasetInvoker {
    dataset: Dataset,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl DatasetInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            dataset: fixture_dataset(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolInvoker for DatasetInvoker {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolOutcome, BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), arguments.clone()));

        let executed = ToolCall::parse(tool, arguments).and_then(|call| call.execute(&self.dataset));
        Ok(match executed {
            Ok(text) => ToolOutcome {
                data: serde_json::from_str(&text).unwrap(),
                is_error: false,
            },
            Err(err) => ToolOutcome {
                data: Value::String(err.to_string()),
                is_error: true,
            },
        })
    }
}

/// Fails every call the way an unreachable tool server would.
pub struct FailingInvoker(pub BridgeError);

#[async_trait]
impl ToolInvoker for FailingInvoker {
    async fn invoke(&self, _tool: &str, _arguments: Value) -> Result<ToolOutcome, BridgeError> {
        Err(self.0.clone())
    }
}

/// Replays canned assistant messages and records each request.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<ChatMessage, OracleError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<ChatMessage, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionOracle for ScriptedOracle {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, OracleError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCallResponse {
    ToolCallResponse {
        id: id.to_string(),
        r#type: "function".to_string(),
        function: FunctionCallResponse {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

pub fn assistant_with_tools(calls: Vec<ToolCallResponse>) -> ChatMessage {
    let mut message = ChatMessage::assistant("");
    message.content = None;
    message.tool_calls = Some(calls);
    message
}

pub fn server(
    invoker: Arc<dyn ToolInvoker>,
    oracle: Option<Arc<dyn CompletionOracle>>,
) -> TestServer {
    TestServer::new(router(AppState::from_components(invoker, oracle))).unwrap()
}

pub fn chat_server(invoker: Arc<dyn ToolInvoker>, oracle: Arc<ScriptedOracle>) -> TestServer {
    let oracle: Arc<dyn CompletionOracle> = oracle;
    server(invoker, Some(oracle))
}
