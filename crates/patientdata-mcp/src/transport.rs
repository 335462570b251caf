//! Line-delimited stdio transport and the server read loop.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{
    stdin, stdout, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::select;
use tokio::signal;

use crate::server::ToolServer;

/// Newline-delimited JSON transport over any async reader/writer pair.
pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl StdioTransport<Stdin, Stdout> {
    /// Transport bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(stdin(), stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Read one raw line, undecoded. Returns Ok(None) on EOF.
    pub async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let bytes = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .context("failed to read line")?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    // Map std::io::Result into anyhow::Result while preserving BrokenPipe as io::Error
    fn check_io<T>(res: std::io::Result<T>) -> Result<T> {
        match res {
            Ok(v) => Ok(v),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Client disconnected",
            )
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write one message as a single line and flush.
    pub async fn write_message(&mut self, msg: &Value) -> Result<()> {
        let s = serde_json::to_string(msg)?;

        Self::check_io(self.writer.write_all(s.as_bytes()).await)?;
        Self::check_io(self.writer.write_all(b"\n").await)?;
        Self::check_io(self.writer.flush().await)?;

        Ok(())
    }
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|ioe| ioe.kind() == std::io::ErrorKind::BrokenPipe)
        .unwrap_or(false)
}

/// Serve requests until EOF, Ctrl-C, or the client goes away.
pub async fn run_server_loop<R, W>(
    mut transport: StdioTransport<R, W>,
    server: ToolServer,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!("MCP server initialized, waiting for requests...");

    loop {
        select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, exiting gracefully");
                break;
            }

            line = transport.read_line() => {
                let Some(line) = line? else {
                    tracing::info!("Client disconnected (EOF)");
                    break;
                };

                let Some(response) = server.handle_bytes(&line) else {
                    continue;
                };

                if let Err(e) = transport.write_message(&response).await {
                    if is_broken_pipe(&e) {
                        tracing::info!("Client disconnected (broken pipe)");
                        break;
                    }
                    return Err(e);
                }
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
