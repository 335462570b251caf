//! Session behaviour against scripted `/bin/sh` servers.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use patientdata_bridge::{BridgeClient, BridgeConfig, BridgeError, BridgeTimings, ToolInvoker};
use serde_json::json;

fn fast_timings() -> BridgeTimings {
    BridgeTimings {
        init_settle: Duration::from_millis(200),
        ack_settle: Duration::from_millis(50),
        poll_interval: Duration::from_millis(20),
        timeout: Duration::from_millis(400),
    }
}

fn scripted(script: &str) -> BridgeClient {
    BridgeClient::new(
        BridgeConfig::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .with_timings(fast_timings()),
    )
}

/// Script prefix that records the shell's pid so the test can check it died.
fn pid_prefix(pid_file: &Path) -> String {
    format!("echo $$ > '{}'; ", pid_file.display())
}

fn read_pid(pid_file: &Path) -> u32 {
    fs::read_to_string(pid_file)
        .expect("pid file written")
        .trim()
        .parse()
        .expect("pid is numeric")
}

/// Running means present in /proc and not a zombie.
fn process_running(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .map(|state| state != 'Z' && state != 'X')
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn assert_terminated(pid: u32) {
    let start = Instant::now();
    while process_running(pid) {
        if start.elapsed() > Duration::from_secs(3) {
            panic!("server process {} still running", pid);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

const INIT_REPLY: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05"}}"#;

#[tokio::test]
async fn silent_server_times_out_and_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let client = scripted(&format!("{}exec sleep 30", pid_prefix(&pid_file)));

    let started = Instant::now();
    let err = client.invoke("get_all_patients", json!({})).await.unwrap_err();

    assert!(matches!(err, BridgeError::Timeout { ref tool, timeout_ms: 400 } if tool == "get_all_patients"));
    assert!(err.to_string().starts_with("MCP server response timeout"));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_terminated(read_pid(&pid_file));
}

#[tokio::test]
async fn prompt_reply_resolves_with_payload_and_kills_server() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let script = format!(
        "{}read l; printf '%s\\n' '{}'; read l; read l; \
         printf '%s\\n' '{}'; exec sleep 30",
        pid_prefix(&pid_file),
        INIT_REPLY,
        r#"{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"[{\"id\":\"P001\"}]"}]}}"#
    );

    let started = Instant::now();
    let outcome = scripted(&script)
        .invoke("get_all_patients", json!({}))
        .await
        .unwrap();

    assert_eq!(outcome.data, json!([{"id": "P001"}]));
    assert!(!outcome.is_error);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_terminated(read_pid(&pid_file));
}

#[tokio::test]
async fn noise_and_non_numeric_ids_are_ignored() {
    let script = format!(
        "read l; printf '%s\\n' 'booting...' '{}' '{}' '{}'; read l; read l; \
         printf '%s\\n' '{{not json' '{}'; exec sleep 30",
        r#"{"jsonrpc":"2.0","method":"notifications/message"}"#,
        r#"{"jsonrpc":"2.0","id":"2","result":{"content":[{"type":"text","text":"wrong"}]}}"#,
        INIT_REPLY,
        r#"{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"plain words"}]}}"#
    );

    let outcome = scripted(&script)
        .invoke("search_patients", json!({"query": "x"}))
        .await
        .unwrap();
    assert_eq!(outcome.data, json!("plain words"));
}

#[tokio::test]
async fn tool_level_error_is_an_outcome_not_a_failure() {
    let script = format!(
        "read l; printf '%s\\n' '{}'; read l; read l; printf '%s\\n' '{}'; exec sleep 30",
        INIT_REPLY,
        r#"{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"Unknown tool: nope"}],"isError":true}}"#
    );

    let outcome = scripted(&script).invoke("nope", json!({})).await.unwrap();
    assert!(outcome.is_error);
    assert_eq!(outcome.error_message(), "Unknown tool: nope");
}

#[tokio::test]
async fn rpc_error_on_tool_call_rejects() {
    let script = format!(
        "read l; printf '%s\\n' '{}'; read l; read l; printf '%s\\n' '{}'; exec sleep 30",
        INIT_REPLY,
        r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Unknown method: tools/call"}}"#
    );

    let err = scripted(&script).invoke("x", json!({})).await.unwrap_err();
    assert_eq!(
        err,
        BridgeError::Rpc {
            code: -32601,
            message: "Unknown method: tools/call".to_string()
        }
    );
}

#[tokio::test]
async fn server_exit_falls_back_to_last_response() {
    let script = format!("read l; printf '%s\\n' '{}'", INIT_REPLY);

    let started = Instant::now();
    let outcome = scripted(&script).invoke("x", json!({})).await.unwrap();

    assert_eq!(outcome.data, json!({"protocolVersion": "2024-11-05"}));
    assert!(!outcome.is_error);
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn live_server_without_tool_answer_times_out_despite_earlier_response() {
    let script = format!("read l; printf '%s\\n' '{}'; exec sleep 30", INIT_REPLY);

    let err = scripted(&script).invoke("x", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { ref tool, timeout_ms: 400 } if tool == "x"));
}

#[tokio::test]
async fn server_exit_after_error_response_rejects_with_its_message() {
    let script = format!(
        "read l; printf '%s\\n' '{}'",
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"dataset unavailable"}}"#
    );

    let err = scripted(&script).invoke("x", json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "dataset unavailable");
}

#[tokio::test]
async fn immediate_exit_reports_no_response() {
    let err = scripted("exit 0").invoke("x", json!({})).await.unwrap_err();
    assert_eq!(err, BridgeError::NoResponse);
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let client = BridgeClient::new(BridgeConfig::new("/nonexistent/patientdata-mcp"));
    let err = client.invoke("x", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::Spawn { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn dropping_the_call_kills_the_server() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let client = scripted(&format!("{}exec sleep 30", pid_prefix(&pid_file)));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(150), client.invoke("x", json!({}))).await;
    assert!(abandoned.is_err());

    // Give the runtime a moment to reap the killed child.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_terminated(read_pid(&pid_file));
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let make = |n: u32| {
        format!(
            "read l; printf '%s\\n' '{}'; read l; read l; \
             printf '%s\\n' '{{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{{\"content\":[{{\"type\":\"text\",\"text\":\"{}\"}}]}}}}'",
            INIT_REPLY, n
        )
    };
    let a = scripted(&make(1));
    let b = scripted(&make(2));

    let (ra, rb) = tokio::join!(a.invoke("x", json!({})), b.invoke("x", json!({})));
    assert_eq!(ra.unwrap().data, json!(1));
    assert_eq!(rb.unwrap().data, json!(2));
}
