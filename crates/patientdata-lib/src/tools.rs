//! Tool catalog and typed tool invocations.
//!
//! The catalog is shared by the MCP tool server (`tools/list`) and by the HTTP
//! gateway, which hands the same definitions to the completion oracle.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::query;

/// Names of the five read-only tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetAllPatients,
    GetPatientById,
    SearchPatients,
    GetPatientsByBloodType,
    GetPatientsByAllergy,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::GetAllPatients,
        ToolName::GetPatientById,
        ToolName::SearchPatients,
        ToolName::GetPatientsByBloodType,
        ToolName::GetPatientsByAllergy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetAllPatients => "get_all_patients",
            ToolName::GetPatientById => "get_patient_by_id",
            ToolName::SearchPatients => "search_patients",
            ToolName::GetPatientsByBloodType => "get_patients_by_blood_type",
            ToolName::GetPatientsByAllergy => "get_patients_by_allergy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::GetAllPatients => {
                "Get all patient records from the database. This function takes NO arguments - \
                 call it with an empty object {}. Use this when the user asks to see all patients, \
                 list all patients, or get all patient records. Returns all patients in the system."
            }
            ToolName::GetPatientById => {
                "Get a specific patient record by their ID (e.g., P001, P002)"
            }
            ToolName::SearchPatients => "Search patients by name, email, or ID",
            ToolName::GetPatientsByBloodType => {
                "Get all patients with a specific blood type (e.g., A+, O-, AB+)"
            }
            ToolName::GetPatientsByAllergy => {
                "Get all patients with a specific allergy (e.g., Penicillin, Pollen)"
            }
        }
    }

    /// JSON Schema describing the tool's `arguments` object.
    pub fn input_schema(&self) -> Value {
        match self {
            ToolName::GetAllPatients => json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": false
            }),
            ToolName::GetPatientById => json!({
                "type": "object",
                "properties": {
                    "patientId": {
                        "type": "string",
                        "description": "The patient ID (e.g., P001, P002)"
                    }
                },
                "required": ["patientId"]
            }),
            ToolName::SearchPatients => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query to match against patient names, emails, or IDs"
                    },
                    "field": {
                        "type": "string",
                        "description": "Optional field to search in (firstName, lastName, email, id)",
                        "enum": ["firstName", "lastName", "email", "id"]
                    }
                },
                "required": ["query"]
            }),
            ToolName::GetPatientsByBloodType => json!({
                "type": "object",
                "properties": {
                    "bloodType": {
                        "type": "string",
                        "description": "Blood type to filter by (e.g., A+, O-, AB+)"
                    }
                },
                "required": ["bloodType"]
            }),
            ToolName::GetPatientsByAllergy => json!({
                "type": "object",
                "properties": {
                    "allergy": {
                        "type": "string",
                        "description": "Allergy to search for (e.g., Penicillin, Pollen)"
                    }
                },
                "required": ["allergy"]
            }),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownTool {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIdArgs {
    pub patient_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTypeArgs {
    pub blood_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyArgs {
    pub allergy: String,
}

/// A fully-typed tool invocation.
///
/// `GetAllPatients` carries no arguments; whatever the caller sent is dropped
/// during [`ToolCall::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetAllPatients,
    GetPatientById(PatientIdArgs),
    SearchPatients(SearchArgs),
    GetPatientsByBloodType(BloodTypeArgs),
    GetPatientsByAllergy(AllergyArgs),
}

impl ToolCall {
    /// Build a typed call from a tool name and raw JSON arguments.
    ///
    /// `null` arguments are treated as an empty object.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let tool: ToolName = name.parse()?;
        let arguments = if arguments.is_null() {
            Value::Object(Default::default())
        } else {
            arguments
        };

        let call = match tool {
            ToolName::GetAllPatients => ToolCall::GetAllPatients,
            ToolName::GetPatientById => ToolCall::GetPatientById(typed_args(tool, arguments)?),
            ToolName::SearchPatients => ToolCall::SearchPatients(typed_args(tool, arguments)?),
            ToolName::GetPatientsByBloodType => {
                ToolCall::GetPatientsByBloodType(typed_args(tool, arguments)?)
            }
            ToolName::GetPatientsByAllergy => {
                ToolCall::GetPatientsByAllergy(typed_args(tool, arguments)?)
            }
        };
        Ok(call)
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::GetAllPatients => ToolName::GetAllPatients,
            ToolCall::GetPatientById(_) => ToolName::GetPatientById,
            ToolCall::SearchPatients(_) => ToolName::SearchPatients,
            ToolCall::GetPatientsByBloodType(_) => ToolName::GetPatientsByBloodType,
            ToolCall::GetPatientsByAllergy(_) => ToolName::GetPatientsByAllergy,
        }
    }

    /// Wire form of the arguments, as sent in a `tools/call` request.
    pub fn arguments(&self) -> Value {
        let value = match self {
            ToolCall::GetAllPatients => Ok(json!({})),
            ToolCall::GetPatientById(args) => serde_json::to_value(args),
            ToolCall::SearchPatients(args) => serde_json::to_value(args),
            ToolCall::GetPatientsByBloodType(args) => serde_json::to_value(args),
            ToolCall::GetPatientsByAllergy(args) => serde_json::to_value(args),
        };
        value.unwrap_or_else(|_| json!({}))
    }

    /// Run the query and render its output as pretty-printed JSON text.
    pub fn execute(&self, dataset: &Dataset) -> Result<String> {
        debug!(tool = %self.name(), "executing tool");
        let text = match self {
            ToolCall::GetAllPatients => serde_json::to_string_pretty(query::all(dataset))?,
            ToolCall::GetPatientById(args) => {
                serde_json::to_string_pretty(query::find_by_id(dataset, &args.patient_id)?)?
            }
            ToolCall::SearchPatients(args) => serde_json::to_string_pretty(&query::search(
                dataset,
                &args.query,
                args.field.as_deref(),
            ))?,
            ToolCall::GetPatientsByBloodType(args) => {
                serde_json::to_string_pretty(&query::by_blood_type(dataset, &args.blood_type))?
            }
            ToolCall::GetPatientsByAllergy(args) => {
                serde_json::to_string_pretty(&query::by_allergy(dataset, &args.allergy))?
            }
        };
        Ok(text)
    }
}

fn typed_args<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|err| Error::InvalidArguments {
        tool: tool.as_str().to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_name_parses_back() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
            assert_eq!(tool.input_schema()["type"], "object");
        }
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = ToolCall::parse("unknown_tool", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
    }

    #[test]
    fn get_all_patients_drops_arguments() {
        let call = ToolCall::parse("get_all_patients", json!({"extra": "ignored"})).unwrap();
        assert_eq!(call, ToolCall::GetAllPatients);
        assert_eq!(call.arguments(), json!({}));
    }

    #[test]
    fn search_arguments_are_camel_case() {
        let call = ToolCall::parse(
            "search_patients",
            json!({"query": "john", "field": "lastName"}),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::SearchPatients(SearchArgs {
                query: "john".to_string(),
                field: Some("lastName".to_string()),
            })
        );
        assert_eq!(call.arguments(), json!({"query": "john", "field": "lastName"}));
    }

    #[test]
    fn missing_required_argument_is_invalid() {
        let err = ToolCall::parse("get_patient_by_id", Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { ref tool, .. } if tool == "get_patient_by_id"));
    }
}
