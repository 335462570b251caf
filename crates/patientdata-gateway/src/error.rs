//! Handler errors. Every variant renders as a JSON `{success: false, error}`
//! body so clients never see a non-JSON error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use patientdata_bridge::BridgeError;
use thiserror::Error;
use tracing::warn;

use crate::oracle::OracleError;
use crate::response::ApiResponse;

pub const CHAT_NOT_CONFIGURED: &str = "GROQ_API_KEY not configured. Please create a .env file \
     in the gateway's working directory with: GROQ_API_KEY=your_api_key_here";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// The tool reported the requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The tool ran but reported an error.
    #[error("{0}")]
    ToolFailed(String),

    /// The tool server could not be reached or did not answer.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("{}", CHAT_NOT_CONFIGURED)]
    ChatNotConfigured,

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ToolFailed(_)
            | ApiError::Bridge(_)
            | ApiError::ChatNotConfigured
            | ApiError::Oracle(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}
