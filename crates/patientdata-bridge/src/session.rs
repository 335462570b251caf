//! One tool invocation session: spawn, handshake, await, teardown.
//!
//! A session owns its subprocess, the pipes, the background reader and the
//! responses collected so far. [`run`] drives it to exactly one settlement
//! and then tears the subprocess down exactly once. If the future is dropped
//! mid-flight, [`Session`]'s `Drop` kills the child instead.

use std::pin::pin;
use std::process::Stdio;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::select;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::config::{BridgeConfig, BridgeTimings};
use crate::error::BridgeError;
use crate::types::{
    decode_fallback, decode_tool_response, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ToolOutcome, CALL_ID, INIT_ID,
};

/// Run one complete session for `tool`.
pub(crate) async fn run(
    config: &BridgeConfig,
    tool: &str,
    arguments: Value,
) -> Result<ToolOutcome, BridgeError> {
    let mut session = Session::spawn(config)?;

    if let Err(err) = session.handshake(tool, arguments).await {
        // The child may already be gone; the await phase reports what it said.
        debug!(tool, error = %err, "handshake write failed");
    }
    let settlement = session.await_result(tool).await;

    session.teardown().await;
    settlement
}

/// What woke the await loop.
enum Signal {
    Poll,
    Timeout,
}

struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    responses: UnboundedReceiver<JsonRpcResponse>,
    received: Vec<JsonRpcResponse>,
    stdout_closed: bool,
    tasks: Vec<JoinHandle<()>>,
    timings: BridgeTimings,
    torn_down: bool,
}

impl Session {
    fn spawn(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let program = config.program_display();
        let spawn_failed = |reason: String| BridgeError::Spawn {
            program: program.clone(),
            reason,
        };

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .envs(&config.envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_failed(e.to_string()))?;

        debug!(program = %program, pid = ?child.id(), "spawned MCP server");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_failed("stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failed("stdout was not captured".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = vec![tokio::spawn(read_responses(stdout, tx))];
        if let Some(stderr) = child.stderr.take() {
            tasks.push(tokio::spawn(async move {
                drain_stderr(stderr).await;
            }));
        }

        Ok(Self {
            child,
            stdin: Some(stdin),
            responses: rx,
            received: Vec::new(),
            stdout_closed: false,
            tasks,
            timings: config.timings,
            torn_down: false,
        })
    }

    /// initialize → (wait for id=1, bounded) → initialized → (settle) → tools/call
    async fn handshake(&mut self, tool: &str, arguments: Value) -> Result<(), BridgeError> {
        self.write_line(&JsonRpcRequest::initialize()).await?;
        self.await_init().await;

        self.write_line(&JsonRpcNotification::initialized()).await?;
        sleep(self.timings.ack_settle).await;

        self.write_line(&JsonRpcRequest::tools_call(tool, arguments))
            .await
    }

    /// Wait until the `initialize` response arrives, stdout closes, or the
    /// settle bound elapses, whichever comes first.
    async fn await_init(&mut self) {
        let mut bound = pin!(sleep(self.timings.init_settle));
        loop {
            let next = select! {
                _ = &mut bound => None,
                msg = self.responses.recv() => Some(msg),
            };
            match next {
                None => {
                    debug!("initialize response not seen within settle bound");
                    return;
                }
                Some(None) => {
                    self.stdout_closed = true;
                    return;
                }
                Some(Some(response)) => {
                    let is_init = response.id == INIT_ID;
                    self.received.push(response);
                    if is_init {
                        return;
                    }
                }
            }
        }
    }

    /// Race the poll loop against the hard timeout. The final check runs
    /// from the poll arm once the server's stdout has closed.
    async fn await_result(&mut self, tool: &str) -> Result<ToolOutcome, BridgeError> {
        let timings = self.timings;
        let mut poll = interval(timings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut hard_timeout = pin!(sleep(timings.timeout));

        loop {
            let signal = select! {
                biased;
                _ = &mut hard_timeout => Signal::Timeout,
                _ = poll.tick() => Signal::Poll,
            };

            match signal {
                Signal::Poll => {
                    self.collect();
                    if let Some(response) = self.take_response(CALL_ID) {
                        debug!(tool, "tool call answered");
                        return decode_tool_response(response);
                    }
                    if self.stdout_closed {
                        debug!(tool, "server output closed before answering");
                        return self.final_check();
                    }
                }
                Signal::Timeout => {
                    // A reply may have landed since the last tick.
                    self.collect();
                    if let Some(response) = self.take_response(CALL_ID) {
                        return decode_tool_response(response);
                    }
                    let timeout_ms = timings.timeout.as_millis() as u64;
                    warn!(tool, timeout_ms, "MCP server response timeout");
                    return Err(BridgeError::Timeout {
                        tool: tool.to_string(),
                        timeout_ms,
                    });
                }
            }
        }
    }

    /// Settle from whatever was collected: the tool call answer if present,
    /// else the most recent response of any id, else no response.
    fn final_check(&mut self) -> Result<ToolOutcome, BridgeError> {
        if let Some(response) = self.take_response(CALL_ID) {
            return decode_tool_response(response);
        }
        match self.received.pop() {
            Some(last) => {
                debug!(id = last.id, "settling from most recent response");
                decode_fallback(last)
            }
            None => Err(BridgeError::NoResponse),
        }
    }

    /// Move everything the reader has parsed so far into `received`.
    fn collect(&mut self) {
        loop {
            match self.responses.try_recv() {
                Ok(response) => self.received.push(response),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.stdout_closed = true;
                    break;
                }
            }
        }
    }

    /// First collected response with `id`, in arrival order.
    fn take_response(&mut self, id: u64) -> Option<JsonRpcResponse> {
        let index = self.received.iter().position(|r| r.id == id)?;
        Some(self.received.remove(index))
    }

    async fn write_line<T: Serialize>(&mut self, message: &T) -> Result<(), BridgeError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| BridgeError::Transport {
            reason: "stdin already closed".to_string(),
        })?;

        let mut line = serde_json::to_vec(message).map_err(|e| BridgeError::Transport {
            reason: format!("failed to serialize request: {e}"),
        })?;
        line.push(b'\n');

        stdin
            .write_all(&line)
            .await
            .map_err(|e| BridgeError::Transport {
                reason: format!("failed to write to stdin: {e}"),
            })?;
        stdin.flush().await.map_err(|e| BridgeError::Transport {
            reason: format!("failed to flush stdin: {e}"),
        })
    }

    /// Close stdin, force-kill and reap the child. Runs at most once.
    async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        // Dropping the handle closes the pipe so the server sees EOF.
        self.stdin = None;

        if let Err(err) = self.child.start_kill() {
            trace!(error = %err, "MCP server already exited");
        }
        match self.child.wait().await {
            Ok(status) => debug!(?status, "MCP server terminated"),
            Err(err) => warn!(error = %err, "failed to reap MCP server"),
        }

        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.torn_down {
            let _ = self.child.start_kill();
            for task in &self.tasks {
                task.abort();
            }
        }
    }
}

/// Parse each stdout line; keep objects with a numeric id, discard the rest.
async fn read_responses<R>(stdout: R, tx: UnboundedSender<JsonRpcResponse>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(error = %err, "stopped reading MCP server output");
                break;
            }
        }

        match serde_json::from_slice::<JsonRpcResponse>(&line) {
            Ok(response) => {
                if tx.send(response).is_err() {
                    break;
                }
            }
            Err(_) => trace!(
                line = %String::from_utf8_lossy(&line).trim_end(),
                "discarding non-response output"
            ),
        }
    }
}

/// Log the server's stderr until it closes. Undecodable bytes are replaced
/// so the pipe keeps draining.
async fn drain_stderr<R>(stderr: R) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    let mut drained = 0;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(error = %err, "stopped reading MCP server stderr");
                break;
            }
        }
        drained += 1;
        debug!(
            target: "patientdata_bridge::server_stderr",
            "{}",
            String::from_utf8_lossy(&line).trim_end()
        );
    }
    drained
}
