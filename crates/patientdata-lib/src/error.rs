use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the patient data library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset could not be located at the resolved path.
    #[error("dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the dataset location")]
    ProjectDirsUnavailable,

    /// The dataset file exists but is not a valid patient document.
    #[error("failed to parse dataset at {path}: {source}")]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two records in the dataset share an identifier.
    #[error("duplicate patient id in dataset: {id}")]
    DuplicatePatientId { id: String },

    /// Raised when a patient id is absent from the dataset.
    #[error("Patient with ID {id} not found.")]
    PatientNotFound { id: String },

    /// Raised when a tool name is not part of the catalog.
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// Raised when tool arguments do not match the tool's schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Raised when a resource URI does not resolve to any record or view.
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error describes a missing record rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PatientNotFound { .. } | Error::ResourceNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_not_found_message_matches_tool_contract() {
        let err = Error::PatientNotFound {
            id: "P999".to_string(),
        };
        assert_eq!(err.to_string(), "Patient with ID P999 not found.");
        assert!(err.is_not_found());
    }

    #[test]
    fn unknown_tool_message() {
        let err = Error::UnknownTool {
            name: "unknown_tool".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
        assert!(!err.is_not_found());
    }
}
