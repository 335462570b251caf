use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/patients.json")
}

fn spawn_server() -> std::io::Result<Child> {
    Command::new(env!("CARGO_BIN_EXE_patientdata-mcp"))
        .arg("--data")
        .arg(fixture_path())
        .env("RUST_LOG", "info")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

/// Ensures the child process is killed when the guard is dropped to avoid leaking processes on test failure.
struct ProcessGuard {
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl ProcessGuard {
    fn new(mut child: Child) -> Self {
        let stdout = child.stdout.take().map(BufReader::new);
        Self {
            child: Some(child),
            stdout,
        }
    }

    fn child_mut(&mut self) -> &mut Child {
        self.child.as_mut().expect("child taken")
    }

    fn send(&mut self, message: Value) {
        let stdin = self
            .child_mut()
            .stdin
            .as_mut()
            .expect("child process should have stdin piped");
        writeln!(stdin, "{}", message).expect("write request");
        stdin.flush().expect("flush request");
    }

    fn send_raw(&mut self, line: &str) {
        let stdin = self.child_mut().stdin.as_mut().expect("stdin piped");
        writeln!(stdin, "{}", line).expect("write raw line");
        stdin.flush().expect("flush raw line");
    }

    fn send_bytes(&mut self, bytes: &[u8]) {
        let stdin = self.child_mut().stdin.as_mut().expect("stdin piped");
        stdin.write_all(bytes).expect("write raw bytes");
        stdin.flush().expect("flush raw bytes");
    }

    fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout
            .as_mut()
            .expect("stdout piped")
            .read_line(&mut line)
            .expect("read response line");
        serde_json::from_str(&line).expect("response is JSON")
    }

    fn request(&mut self, message: Value) -> Value {
        self.send(message);
        self.recv()
    }

    fn close_and_wait(&mut self) -> std::process::ExitStatus {
        let child = self.child_mut();
        drop(child.stdin.take());

        let start = Instant::now();
        loop {
            match child.try_wait().expect("Failed to check server status") {
                Some(status) => return status,
                None => {
                    if start.elapsed() > Duration::from_secs(5) {
                        panic!("Server did not exit within timeout");
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}

#[test]
fn test_stdio_isolation_initialize() {
    let mut guard = ProcessGuard::new(spawn_server().expect("Failed to spawn server"));

    let response = guard.request(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0.0.0"}
        }
    }));

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert!(response["result"]["capabilities"].get("tools").is_some());
    assert!(response["result"]["capabilities"].get("resources").is_some());

    let status = guard.close_and_wait();
    assert!(status.success(), "Server exited with error: {:?}", status);

    let mut stderr = String::new();
    guard
        .child_mut()
        .stderr
        .as_mut()
        .unwrap()
        .read_to_string(&mut stderr)
        .ok();
    assert!(stderr.contains("MCP server initialized"));

    let stdout_str = serde_json::to_string(&response).unwrap();
    assert!(!stdout_str.contains("MCP server initialized"));
}

#[test]
fn test_handshake_then_tool_call() {
    let mut guard = ProcessGuard::new(spawn_server().expect("Failed to spawn server"));

    guard.request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}));
    guard.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));

    let response = guard.request(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": "search_patients", "arguments": {"query": "john", "field": "lastName"}}
    }));

    assert_eq!(response["id"], 2);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let patients: Value = serde_json::from_str(text).unwrap();
    assert_eq!(patients.as_array().unwrap().len(), 1);
    assert_eq!(patients[0]["id"], "P002");

    assert!(guard.close_and_wait().success());
}

#[test]
fn test_tools_list_and_malformed_lines() {
    let mut guard = ProcessGuard::new(spawn_server().expect("Failed to spawn server"));

    guard.send_raw("{ definitely not json");
    let parse_error = guard.recv();
    assert_eq!(parse_error["error"]["code"], -32700);
    assert!(parse_error["id"].is_null());

    let response = guard.request(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}));
    assert_eq!(response["id"], 7);
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "get_all_patients",
            "get_patient_by_id",
            "search_patients",
            "get_patients_by_blood_type",
            "get_patients_by_allergy"
        ]
    );

    assert!(guard.close_and_wait().success());
}

#[test]
fn test_invalid_utf8_line_is_rejected_and_server_keeps_serving() {
    let mut guard = ProcessGuard::new(spawn_server().expect("Failed to spawn server"));

    guard.send_bytes(b"\xff\xfe garbage\n");
    let parse_error = guard.recv();
    assert_eq!(parse_error["error"]["code"], -32700);
    assert!(parse_error["id"].is_null());

    let pong = guard.request(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));
    assert_eq!(pong["id"], 1);
    assert_eq!(pong["result"], json!({}));

    assert!(guard.close_and_wait().success());
}

#[test]
fn test_missing_dataset_fails_fast() {
    let output = Command::new(env!("CARGO_BIN_EXE_patientdata-mcp"))
        .arg("--data")
        .arg("/nonexistent/patients.json")
        .stdin(Stdio::null())
        .output()
        .expect("run server");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
