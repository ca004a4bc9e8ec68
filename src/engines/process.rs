//! Persistent worker-process transport.
//!
//! The engine runs as a child process that loads its model once and then
//! answers requests forever. Protocol (one JSON document per line):
//!
//! ```text
//! stdin:  {"text": "Emmanuel Macron s'est rendu à Bruxelles."}
//! stdout: {"ents": [{"text": "Emmanuel Macron", "label": "PER"}, ...]}
//! ```
//!
//! A worker may answer `{"error": "..."}` to report an engine fault.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::Transport;

/// Transport backed by a long-lived child process
pub struct ProcessTransport {
    program: String,
    args: Vec<String>,
    call_timeout: Duration,
    /// Spawned on first use; dropped (and killed) after any failure
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    // Held so the child is killed when the worker is dropped
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    /// Write one request line and read one response line
    async fn exchange(&mut self, request: &str) -> Result<serde_json::Value> {
        self.stdin
            .write_all(request.as_bytes())
            .await
            .context("Failed to write to engine stdin")?;
        self.stdin
            .write_all(b"\n")
            .await
            .context("Failed to write to engine stdin")?;
        self.stdin.flush().await.context("Failed to flush engine stdin")?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .context("Failed to read engine stdout")?;

        if read == 0 {
            anyhow::bail!("Engine process exited before answering");
        }

        serde_json::from_str(line.trim()).context("Engine output is not valid JSON")
    }
}

impl ProcessTransport {
    /// Create a transport; the process is not started until the first call
    pub fn new(program: impl Into<String>, args: Vec<String>, call_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            call_timeout,
            worker: Mutex::new(None),
        }
    }

    fn spawn(&self) -> Result<Worker> {
        info!(program = %self.program, "Starting engine worker");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn engine process '{}'", self.describe()))?;

        let stdin = child.stdin.take().context("Engine stdin was not captured")?;
        let stdout = child.stdout.take().context("Engine stdout was not captured")?;

        Ok(Worker {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Whether a worker process is currently alive
    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.is_some()
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    async fn call(&self, text: &str) -> Result<serde_json::Value> {
        let request = serde_json::json!({ "text": text }).to_string();

        // One request at a time per worker
        let mut guard = self.worker.lock().await;
        let mut worker = match guard.take() {
            Some(worker) => worker,
            None => self.spawn()?,
        };

        let value = match timeout(self.call_timeout, worker.exchange(&request)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(engine = %self.describe(), "Engine worker failed, discarding it");
                return Err(e);
            }
            Err(_) => {
                warn!(engine = %self.describe(), "Engine worker timed out, discarding it");
                anyhow::bail!(
                    "Engine '{}' timed out after {:?}",
                    self.describe(),
                    self.call_timeout
                );
            }
        };

        *guard = Some(worker);
        drop(guard);

        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            anyhow::bail!("Engine '{}' reported an error: {}", self.describe(), message);
        }

        debug!(engine = %self.describe(), "Engine answered");
        Ok(value)
    }
}
