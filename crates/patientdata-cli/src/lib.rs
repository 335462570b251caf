//! Patient data CLI library.
//!
//! Subcommand handlers live in [`commands`]; `main.rs` only parses arguments
//! and dispatches.

pub mod commands;
