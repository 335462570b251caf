//! Completion oracle: an OpenAI-compatible chat completions endpoint.
//!
//! The gateway talks to it through [`CompletionOracle`] so chat orchestration
//! can be tested with a scripted oracle. [`OpenAiCompatClient`] is the real
//! implementation over `reqwest` (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use patientdata_lib::ToolName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("invalid completion response: {reason}")]
    InvalidResponse { reason: String },

    #[error("completion response contained no choices")]
    EmptyResponse,
}

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(serialize_with = "serialize_content", default)]
    pub content: Option<String>,
    /// Set on `tool` messages: the id of the call being answered.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
    /// Set on `tool` messages: the name of the tool that ran.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_calls: Option<Vec<ToolCallResponse>>,
    /// Fields this type does not model, forwarded unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` content is sent as `""`; some compatible runtimes reject `null`.
fn serialize_content<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
            extra: Map::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            tool_calls: None,
            extra: Map::new(),
        }
    }

    /// Tool calls requested by an assistant message, possibly none.
    pub fn requested_tool_calls(&self) -> &[ToolCallResponse] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<ToolName> for ToolDefinition {
    fn from(tool: ToolName) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: tool.as_str().to_string(),
                description: tool.description().to_string(),
                parameters: tool.input_schema(),
            },
        }
    }
}

/// A tool call as the oracle emits it; `arguments` is a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub id: String,
    #[serde(default = "function_type")]
    pub r#type: String,
    pub function: FunctionCallResponse,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallResponse {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// What the gateway asks of the oracle for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// `Some` offers the tools with `tool_choice: "auto"`.
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

// ─── Oracle seam ─────────────────────────────────────────────────────────

#[async_trait]
pub trait CompletionOracle: Send + Sync {
    /// Run one completion and return the first choice's assistant message.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, OracleError>;
}

/// Client for any `/chat/completions` endpoint speaking the OpenAI dialect.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionOracle for OpenAiCompatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, OracleError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            tools: request.tools.as_deref(),
            tool_choice: request.tools.as_ref().map(|_| "auto"),
            temperature: request.temperature,
        };

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            with_tools = request.tools.is_some(),
            "requesting completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::ConnectionFailed {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OracleError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| OracleError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(OracleError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_content_serializes_as_empty_string() {
        let mut msg = ChatMessage::assistant("x");
        msg.content = None;
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": ""}));
    }

    #[test]
    fn test_tool_result_message_shape() {
        let value =
            serde_json::to_value(ChatMessage::tool_result("call_1", "get_all_patients", "[]"))
                .unwrap();
        assert_eq!(
            value,
            json!({
                "role": "tool",
                "content": "[]",
                "tool_call_id": "call_1",
                "name": "get_all_patients"
            })
        );
    }

    #[test]
    fn test_assistant_message_with_tool_calls_deserializes() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_9",
                "type": "function",
                "function": {"name": "search_patients", "arguments": "{\"query\":\"john\"}"}
            }]
        }))
        .unwrap();
        assert_eq!(msg.content, None);
        assert_eq!(msg.requested_tool_calls().len(), 1);
        assert_eq!(msg.requested_tool_calls()[0].function.name, "search_patients");
    }

    #[test]
    fn test_tool_definition_from_tool_name() {
        let def = ToolDefinition::from(ToolName::GetPatientById);
        assert_eq!(def.r#type, "function");
        assert_eq!(def.function.name, "get_patient_by_id");
        assert_eq!(def.function.parameters["required"], json!(["patientId"]));
    }

    #[test]
    fn test_request_body_offers_tools_with_auto_choice() {
        let tools = vec![ToolDefinition::from(ToolName::GetAllPatients)];
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatCompletionBody {
            model: "m",
            messages: &messages,
            tools: Some(&tools),
            tool_choice: Some("auto"),
            temperature: 0.3,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["function"]["name"], "get_all_patients");
        assert!(serde_json::to_value(ChatCompletionBody {
            tools: None,
            tool_choice: None,
            ..body
        })
        .unwrap()
        .get("tools")
        .is_none());
    }
}
