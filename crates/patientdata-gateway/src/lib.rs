//! HTTP gateway for the patient tools.
//!
//! REST routes map one-to-one onto tool invocations through a
//! [`patientdata_bridge::ToolInvoker`]; `POST /api/chat` lets a completion
//! oracle pick tools, runs them, and asks it to phrase the answer.
//!
//! - [`routes::router`]: the axum application
//! - [`state::AppState`]: invoker plus optional oracle
//! - [`chat`]: orchestration of one chat turn
//! - [`oracle`]: OpenAI-compatible completion client
//! - [`logging`], [`metrics`], [`middleware`]: ambient concerns

pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod oracle;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{GatewayConfig, LlmConfig};
pub use error::ApiError;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, MetricsConfig};
pub use oracle::{CompletionOracle, OpenAiCompatClient, OracleError};
pub use routes::router;
pub use state::AppState;
