//! Stdio transport (spawning a subprocess).
//!
//! Messages are newline-delimited JSON. Lines on stdout that are not the
//! response to the pending request (server notifications, banners printed by
//! wrapper scripts) are skipped.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::Transport;
use crate::error::{Error, Result};
use crate::mcp::config::StdioServer;
use crate::mcp::protocol::{McpNotification, McpRequest, McpResponse};

/// How long a server gets to exit after its stdin is closed
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// JSON-RPC over a child process's stdin/stdout
pub struct StdioTransport {
    /// Server name
    name: String,
    /// Server process, `None` once closed
    child: Mutex<Option<Child>>,
    /// Request/response pipes, locked for a whole exchange
    io: Mutex<StdioIo>,
}

struct StdioIo {
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl StdioTransport {
    /// Spawn the server process
    pub fn spawn(name: &str, server: &StdioServer) -> Result<Self> {
        let program = which::which(&server.command).map_err(|e| {
            Error::Connection(format!(
                "MCP server '{}' command '{}' not found: {}",
                name, server.command, e
            ))
        })?;

        debug!("Spawning MCP server {}: {} {:?}", name, program.display(), server.args);

        let mut child = Command::new(&program)
            .args(&server.args)
            .envs(&server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Connection(format!("Failed to spawn MCP server '{}': {}", name, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Connection("Failed to capture MCP server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Connection("Failed to capture MCP server stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let server_name = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("MCP {} stderr: {}", server_name, line);
                }
            });
        }

        Ok(StdioTransport {
            name: name.to_string(),
            child: Mutex::new(Some(child)),
            io: Mutex::new(StdioIo {
                stdin: Some(stdin),
                stdout: BufReader::new(stdout),
            }),
        })
    }

    fn closed_error(&self) -> Error {
        Error::Connection(format!("MCP server {} is closed", self.name))
    }
}

async fn write_line(stdin: &mut ChildStdin, json: &str) -> Result<()> {
    stdin.write_all(json.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

#[async_trait]
impl Transport for StdioTransport {
    async fn request(&self, request: McpRequest) -> Result<McpResponse> {
        let json = serde_json::to_string(&request)?;
        debug!("MCP request -> {}: {}", self.name, json);

        let mut guard = self.io.lock().await;
        let io = &mut *guard;
        let stdin = io.stdin.as_mut().ok_or_else(|| self.closed_error())?;

        write_line(stdin, &json).await.map_err(|e| {
            Error::Connection(format!("Failed to write to MCP server {}: {}", self.name, e))
        })?;

        loop {
            let mut line = String::new();
            let read = io.stdout.read_line(&mut line).await.map_err(|e| {
                Error::Connection(format!("Failed to read from MCP server {}: {}", self.name, e))
            })?;
            if read == 0 {
                return Err(Error::Connection(format!(
                    "MCP server {} exited before answering {}",
                    self.name, request.method
                )));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(_) => {
                    debug!("Skipping non-JSON output from {}: {}", self.name, trimmed);
                    continue;
                }
            };

            if let Some(method) = value.get("method").and_then(Value::as_str) {
                if method == "ping" {
                    if let Some(id) = value.get("id") {
                        let pong = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": {}});
                        write_line(stdin, &pong.to_string()).await?;
                    }
                } else {
                    debug!("MCP {} sent {}", self.name, method);
                }
                continue;
            }

            if value.get("id").and_then(Value::as_u64) == Some(request.id) {
                debug!("MCP response <- {}: {}", self.name, trimmed);
                return Ok(serde_json::from_value(value)?);
            }

            warn!("Ignoring MCP message from {} with unexpected id: {}", self.name, trimmed);
        }
    }

    async fn notify(&self, notification: McpNotification) -> Result<()> {
        let json = serde_json::to_string(&notification)?;
        debug!("MCP notification -> {}: {}", self.name, json);

        let mut io = self.io.lock().await;
        let stdin = io.stdin.as_mut().ok_or_else(|| self.closed_error())?;
        write_line(stdin, &json).await
    }

    async fn close(&self) -> Result<()> {
        // EOF on stdin is the stdio shutdown signal
        drop(self.io.lock().await.stdin.take());

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("MCP server {} exited with {}", self.name, status);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => {
                warn!("MCP server {} did not exit in time, killing it", self.name);
                child.kill().await.map_err(Error::Io)
            }
        }
    }
}
