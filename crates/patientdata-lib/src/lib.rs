//! Patient dataset library entry points.
//!
//! This crate owns the patient record model, loads the dataset into an
//! immutable [`Dataset`], and implements the read-only queries behind the
//! tool catalog. The tool server, bridge, gateway and CLI all depend on the
//! items exported here instead of reimplementing behavior.

pub mod dataset;
pub mod error;
pub mod patient;
pub mod query;
pub mod summary;
pub mod tools;

pub use dataset::{default_dataset_path, resolve_dataset_path, Dataset, DATA_PATH_ENV};
pub use error::{Error, Result};
pub use patient::{Address, BloodType, Patient};
pub use summary::PatientSummary;
pub use tools::{ToolCall, ToolName};
