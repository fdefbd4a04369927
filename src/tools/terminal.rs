//! Terminal execution tool
//!
//! `terminal.write` is the only place in the crate that spawns OS
//! processes for plan steps. Commands are split into an argv vector and
//! executed directly — never through a shell — with a sanitized
//! environment: a minimal safe baseline, caller overrides, and a forced
//! deterministic locale. Secrets never leak into children because the
//! environment is cleared, not filtered.
//!
//! Two modes, selected by whether the context carries an event channel:
//! - streaming: stdout/stderr chunks are forwarded as they arrive; a
//!   timeout kills the child and emits a cancel event
//! - blocking: a single awaited run with the same timeout and env semantics
//!
//! The `run` signature requires an `EngineCap`, so no process can be
//! spawned except downstream of the engine's enforcement checks.

use crate::engine::EngineCap;
use crate::registry::Tool;
use crate::types::{
    CancelReason, ExecutionContext, StreamKind, ToolCategory, ToolEvent, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default command timeout (60s)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Environment variables carried over from the parent process
const BASELINE_ENV: &[&str] = &["PATH", "HOME", "USER", "SHELL", "TMPDIR"];

/// Read buffer size for chunk forwarding
const CHUNK_BUF_SIZE: usize = 8192;

/// Input payload for `terminal.write`
#[derive(Debug, Clone, Deserialize)]
pub struct TerminalInput {
    /// Command line, split on whitespace into an argv vector
    pub command: String,

    /// Working directory; defaults to the context's project root
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Timeout in milliseconds
    #[serde(rename = "timeoutMs", default)]
    pub timeout_ms: Option<u64>,

    /// Step identifier echoed in streamed events
    #[serde(rename = "stepId", default)]
    pub step_id: Option<String>,

    /// Extra environment variables for the child
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Split a command line into executable and arguments
///
/// Whitespace splitting only; shell operators are not interpreted, so
/// `a | b` spawns `a` with literal `|` and `b` arguments rather than a
/// pipeline.
pub fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(String::from);
    let file = parts.next()?;
    Some((file, parts.collect()))
}

/// Build the sanitized child environment
///
/// Baseline safe variables from the parent, then caller overrides, then a
/// forced deterministic locale (the locale wins over overrides so output
/// parsing stays stable).
pub fn sanitized_env(overrides: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = Vec::new();
    for key in BASELINE_ENV {
        if let Ok(value) = std::env::var(key) {
            env.push((key.to_string(), value));
        }
    }
    for (key, value) in overrides {
        env.retain(|(k, _)| k != key);
        env.push((key.clone(), value.clone()));
    }
    for locale_key in ["LC_ALL", "LANG"] {
        env.retain(|(k, _)| k != locale_key);
        env.push((locale_key.to_string(), "C".to_string()));
    }
    env
}

/// Combine captured stdout and stderr into surfaced output
///
/// Empty parts are omitted; both empty yields `(no output)` so a clean
/// exit still surfaces something for the engine's output check.
fn combine_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stdout, stderr),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (true, true) => "(no output)".to_string(),
    }
}

/// Run an argv vector to completion with sanitized env and a timeout
///
/// Crate-internal spawn helper shared with the VCS tools. Reaching it
/// still requires a capability-bearing `Tool::run` call, so the
/// only-through-the-engine invariant holds.
pub(crate) async fn run_argv(
    file: &str,
    args: &[String],
    cwd: &Path,
    timeout_ms: u64,
) -> ToolResult {
    let start = Instant::now();
    let mut cmd = Command::new(file);
    cmd.args(args)
        .current_dir(cwd)
        .env_clear()
        .envs(sanitized_env(&HashMap::new()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(Duration::from_millis(timeout_ms), cmd.output()).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            ToolResult::with_exit_code(combine_output(&stdout, &stderr), exit_code, start.elapsed())
        }
        Ok(Err(e)) => ToolResult::failure(format!("Failed to spawn {}: {}", file, e), start.elapsed()),
        Err(_) => ToolResult::failure(
            format!("TIMEOUT: {} after {}ms", file, timeout_ms),
            start.elapsed(),
        ),
    }
}

/// The process-spawning terminal tool
pub struct TerminalWriteTool;

impl TerminalWriteTool {
    async fn run_streaming(
        &self,
        input: &TerminalInput,
        cwd: &Path,
        timeout_ms: u64,
        emitter: &mpsc::Sender<ToolEvent>,
    ) -> ToolResult {
        let start = Instant::now();
        let step_id = input.step_id.clone().unwrap_or_default();
        let stream_id = format!("st_{}", Uuid::new_v4().simple());

        let Some((file, args)) = split_command(&input.command) else {
            return ToolResult::failure("Command cannot be empty", start.elapsed());
        };

        let mut cmd = Command::new(&file);
        cmd.args(&args)
            .current_dir(cwd)
            .env_clear()
            .envs(sanitized_env(&input.env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ToolResult::failure(
                    format!("Failed to spawn {}: {}", file, e),
                    start.elapsed(),
                )
            }
        };

        // Forwarders drain the pipes as data arrives; a full channel
        // blocks them here, never the engine loop.
        let stdout_task = forward_stream(
            child.stdout.take(),
            StreamKind::Stdout,
            step_id.clone(),
            emitter.clone(),
        );
        let stderr_task = forward_stream(
            child.stderr.take(),
            StreamKind::Stderr,
            step_id.clone(),
            emitter.clone(),
        );

        match timeout(Duration::from_millis(timeout_ms), child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                let exit_code = status.code().unwrap_or(-1);
                debug!(command = %input.command, exit_code, "terminal command finished");
                ToolResult::with_exit_code(
                    combine_output(&stdout, &stderr),
                    exit_code,
                    start.elapsed(),
                )
            }
            Ok(Err(e)) => {
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                ToolResult::failure(format!("Failed to wait on {}: {}", file, e), start.elapsed())
            }
            Err(_) => {
                warn!(command = %input.command, timeout_ms, "terminal command timed out");
                let _ = child.start_kill();
                let _ = child.wait().await;
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                let _ = emitter
                    .send(ToolEvent::Cancel {
                        stream_id,
                        step_id,
                        command: input.command.clone(),
                        reason: CancelReason::Timeout,
                    })
                    .await;
                ToolResult::failure(
                    format!("TIMEOUT: {} after {}ms", input.command, timeout_ms),
                    start.elapsed(),
                )
            }
        }
    }

    async fn run_blocking(&self, input: &TerminalInput, cwd: &Path, timeout_ms: u64) -> ToolResult {
        let start = Instant::now();
        let Some((file, args)) = split_command(&input.command) else {
            return ToolResult::failure("Command cannot be empty", start.elapsed());
        };

        let mut cmd = Command::new(&file);
        cmd.args(&args)
            .current_dir(cwd)
            .env_clear()
            .envs(sanitized_env(&input.env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match timeout(Duration::from_millis(timeout_ms), cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let exit_code = output.status.code().unwrap_or(-1);
                ToolResult::with_exit_code(
                    combine_output(&stdout, &stderr),
                    exit_code,
                    start.elapsed(),
                )
            }
            Ok(Err(e)) => {
                ToolResult::failure(format!("Failed to spawn {}: {}", file, e), start.elapsed())
            }
            Err(_) => {
                warn!(command = %input.command, timeout_ms, "terminal command timed out");
                ToolResult::failure(
                    format!("TIMEOUT: {} after {}ms", input.command, timeout_ms),
                    start.elapsed(),
                )
            }
        }
    }
}

#[async_trait]
impl Tool for TerminalWriteTool {
    fn name(&self) -> &str {
        "terminal.write"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let input: TerminalInput = match serde_json::from_value(input.clone()) {
            Ok(input) => input,
            Err(e) => {
                return ToolResult::failure(
                    format!("Invalid terminal.write input: {}", e),
                    Duration::ZERO,
                )
            }
        };
        if input.command.trim().is_empty() {
            return ToolResult::failure("Command cannot be empty", Duration::ZERO);
        }

        let cwd = input.cwd.clone().unwrap_or_else(|| ctx.project_root.clone());
        let timeout_ms = input.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);

        match &ctx.emitter {
            Some(emitter) => self.run_streaming(&input, &cwd, timeout_ms, emitter).await,
            None => self.run_blocking(&input, &cwd, timeout_ms).await,
        }
    }
}

/// Forward one child pipe to the event channel, accumulating the text
fn forward_stream<R>(
    pipe: Option<R>,
    kind: StreamKind,
    step_id: String,
    emitter: mpsc::Sender<ToolEvent>,
) -> tokio::task::JoinHandle<String>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut collected = String::new();
        let Some(mut pipe) = pipe else {
            return collected;
        };
        let mut buf = vec![0u8; CHUNK_BUF_SIZE];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buf[..n]).to_string();
                    collected.push_str(&data);
                    // Receiver gone: keep draining so the child can exit
                    let _ = emitter
                        .send(ToolEvent::Chunk {
                            stream: kind,
                            data,
                            step_id: step_id.clone(),
                        })
                        .await;
                }
            }
        }
        collected
    })
}
