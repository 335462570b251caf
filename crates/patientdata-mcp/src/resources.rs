//! MCP resource implementations
//!
//! - `patient://all`: every record
//! - `patient://summary`: aggregate counts
//! - `patient://{id}`: a single record (readable, not listed)

use patientdata_lib::{query, Dataset, PatientSummary};
use tracing::warn;

use crate::types::{ReadResourceResult, ResourceContents, ResourceDescriptor};

pub const ALL_PATIENTS_URI: &str = "patient://all";
pub const SUMMARY_URI: &str = "patient://summary";
const URI_SCHEME: &str = "patient://";

const JSON_MIME: &str = "application/json";
const TEXT_MIME: &str = "text/plain";

/// Resources advertised by `resources/list`.
pub fn list() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor {
            uri: ALL_PATIENTS_URI.to_string(),
            name: "All Patients".to_string(),
            description: "Complete list of all patient records".to_string(),
            mime_type: JSON_MIME.to_string(),
        },
        ResourceDescriptor {
            uri: SUMMARY_URI.to_string(),
            name: "Patient Summary".to_string(),
            description: "Summary statistics of patient data".to_string(),
            mime_type: JSON_MIME.to_string(),
        },
    ]
}

/// Read a resource. Unknown URIs yield an error-marked `text/plain` body.
pub fn read(dataset: &Dataset, uri: &str) -> ReadResourceResult {
    let rendered = match uri {
        ALL_PATIENTS_URI => Some(serde_json::to_string_pretty(query::all(dataset))),
        SUMMARY_URI => Some(serde_json::to_string_pretty(&PatientSummary::from_dataset(
            dataset,
        ))),
        _ => uri
            .strip_prefix(URI_SCHEME)
            .and_then(|id| query::find_by_id(dataset, id).ok())
            .map(serde_json::to_string_pretty),
    };

    match rendered {
        Some(Ok(text)) => ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: JSON_MIME.to_string(),
                text,
            }],
            is_error: false,
        },
        Some(Err(err)) => {
            warn!(uri, error = %err, "failed to render resource");
            text_error(uri, format!("Error reading resource: {}", err))
        }
        None => text_error(uri, format!("Resource not found: {}", uri)),
    }
}

fn text_error(uri: &str, text: String) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContents {
            uri: uri.to_string(),
            mime_type: TEXT_MIME.to_string(),
            text,
        }],
        is_error: true,
    }
}
