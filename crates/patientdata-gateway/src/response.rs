//! JSON envelopes returned by the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::oracle::ToolCallResponse;

/// `{success, data?, count?, error?}` envelope shared by the patient routes
/// and every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Single record.
    pub fn data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            error: None,
        }
    }

    /// Collection; `count` is the array length, or 0 when `data` is not an array.
    pub fn list(data: Value) -> Self {
        let count = data.as_array().map(Vec::len).unwrap_or(0);
        Self {
            success: true,
            data: Some(data),
            count: Some(count),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub service: String,
    pub version: String,
    /// RFC 3339 time the status was produced.
    pub timestamp: String,
}

impl HealthStatus {
    pub fn ok(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            success: true,
            status: "ok".to_string(),
            message: "MCP Bridge Server is running".to_string(),
            service: service.into(),
            version: version.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body of a successful `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    pub message: String,
    /// Tool calls the oracle requested on the first round, in the
    /// OpenAI wire shape. Empty when it answered directly.
    pub tool_calls: Vec<ToolCallResponse>,
}

/// Body of the JSON 404 fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundBody {
    pub success: bool,
    pub error: String,
    pub available_endpoints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_counts_arrays_only() {
        assert_eq!(ApiResponse::list(json!([1, 2, 3])).count, Some(3));
        assert_eq!(ApiResponse::list(json!({"a": 1})).count, Some(0));
    }

    #[test]
    fn test_failure_omits_data_fields() {
        let body = serde_json::to_value(ApiResponse::failure("boom")).unwrap();
        assert_eq!(body, json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_chat_reply_uses_camel_case() {
        let reply = ChatReply {
            success: true,
            message: "hi".to_string(),
            tool_calls: Vec::new(),
        };
        let body = serde_json::to_value(reply).unwrap();
        assert_eq!(body, json!({"success": true, "message": "hi", "toolCalls": []}));
    }
}
