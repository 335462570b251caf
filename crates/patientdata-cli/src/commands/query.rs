//! `query` subcommand: run a tool in-process against the dataset.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use patientdata_lib::tools::{AllergyArgs, BloodTypeArgs, PatientIdArgs, SearchArgs};
use patientdata_lib::{resolve_dataset_path, Dataset, ToolCall};
use tracing::debug;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// List every patient.
    GetAll,
    /// Show one patient by id (e.g. P001).
    ById {
        patient_id: String,
    },
    /// Case-insensitive substring search over id, names and email.
    Search {
        query: String,
        /// Restrict the search to one field (firstName, lastName, email, id).
        #[arg(long)]
        field: Option<String>,
    },
    /// Patients with exactly this blood type (e.g. A+).
    BloodType {
        blood_type: String,
    },
    /// Patients with an allergy containing this text.
    Allergy {
        allergy: String,
    },
}

impl QueryCommand {
    pub fn to_tool_call(&self) -> ToolCall {
        match self {
            QueryCommand::GetAll => ToolCall::GetAllPatients,
            QueryCommand::ById { patient_id } => ToolCall::GetPatientById(PatientIdArgs {
                patient_id: patient_id.clone(),
            }),
            QueryCommand::Search { query, field } => ToolCall::SearchPatients(SearchArgs {
                query: query.clone(),
                field: field.clone(),
            }),
            QueryCommand::BloodType { blood_type } => {
                ToolCall::GetPatientsByBloodType(BloodTypeArgs {
                    blood_type: blood_type.clone(),
                })
            }
            QueryCommand::Allergy { allergy } => ToolCall::GetPatientsByAllergy(AllergyArgs {
                allergy: allergy.clone(),
            }),
        }
    }
}

/// Load the dataset and print the query result as pretty JSON.
pub fn handle_query(data: Option<&Path>, command: &QueryCommand) -> Result<()> {
    let path = resolve_dataset_path(data).context("failed to locate the patient dataset")?;
    let dataset = Dataset::load(&path)
        .with_context(|| format!("failed to load dataset from {}", path.display()))?;

    let call = command.to_tool_call();
    debug!(tool = %call.name(), patients = dataset.len(), "running query");
    let output = call.execute(&dataset)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_keeps_field() {
        let call = QueryCommand::Search {
            query: "john".to_string(),
            field: Some("lastName".to_string()),
        }
        .to_tool_call();
        assert_eq!(
            call.arguments(),
            serde_json::json!({"query": "john", "field": "lastName"})
        );
    }

    #[test]
    fn test_get_all_has_no_arguments() {
        assert_eq!(QueryCommand::GetAll.to_tool_call(), ToolCall::GetAllPatients);
    }
}
