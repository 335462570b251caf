//! One-shot MCP bridge client.
//!
//! Each [`ToolInvoker::invoke`] on a [`BridgeClient`] spawns a tool server
//! subprocess, performs the `initialize` / `notifications/initialized` /
//! `tools/call` handshake over line-delimited JSON-RPC, and settles exactly
//! one outcome from competing signals:
//!
//! - a poll loop that looks for the `tools/call` response (id 2);
//! - a hard timeout that rejects when it never arrives;
//! - a final check once the server's stdout closes, which falls back to the
//!   most recent response of any id.
//!
//! The subprocess is closed and killed exactly once on every exit path.

pub mod client;
pub mod config;
pub mod error;
mod session;
pub mod types;

pub use client::{BridgeClient, ToolInvoker};
pub use config::{BridgeConfig, BridgeTimings};
pub use error::BridgeError;
pub use types::ToolOutcome;
