//! The bridge client driving the real tool server binary.

use std::path::PathBuf;

use patientdata_bridge::{BridgeClient, BridgeConfig, ToolInvoker};
use patientdata_lib::tools::PatientIdArgs;
use patientdata_lib::ToolCall;
use serde_json::json;

fn client() -> BridgeClient {
    let fixture =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/patients.json");
    BridgeClient::new(
        BridgeConfig::new(env!("CARGO_BIN_EXE_patientdata-mcp"))
            .arg("--data")
            .arg(fixture)
            .env("RUST_LOG", "warn"),
    )
}

#[tokio::test]
async fn get_all_patients_ignores_extra_arguments() {
    let outcome = client()
        .invoke("get_all_patients", json!({"extra": "ignored"}))
        .await
        .unwrap();
    assert!(!outcome.is_error);
    assert_eq!(outcome.data.as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn unknown_tool_is_error_marked() {
    let outcome = client().invoke("unknown_tool", json!({})).await.unwrap();
    assert!(outcome.is_error);
    assert_eq!(outcome.data, json!("Unknown tool: unknown_tool"));
}

#[tokio::test]
async fn typed_call_by_id_and_not_found() {
    let found = client()
        .call(&ToolCall::GetPatientById(PatientIdArgs {
            patient_id: "P004".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(found.data["firstName"], "Emily");

    let missing = client()
        .invoke("get_patient_by_id", json!({"patientId": "P999"}))
        .await
        .unwrap();
    assert!(missing.is_error);
    assert_eq!(missing.error_message(), "Patient with ID P999 not found.");
}

#[tokio::test]
async fn identical_calls_give_identical_data() {
    let args = json!({"allergy": "pollen"});
    let first = client().invoke("get_patients_by_allergy", args.clone()).await.unwrap();
    let second = client().invoke("get_patients_by_allergy", args).await.unwrap();
    assert_eq!(first, second);

    let ids: Vec<_> = first
        .data
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["P001", "P004", "P007"]);
}
