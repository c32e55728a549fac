use std::process::Stdio;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{info, warn};

use opsgen_core::{PipelineError, ShellDialect};

/// Fixed confirmation literal. Case-sensitive, matched exactly; it proves
/// operator intent and nothing else — it is not a capability and confers
/// no identity.
pub const CONFIRMATION_LITERAL: &str = "I CONFIRM";

/// Outcome of one local execution. Streams are kept as ordered chunk
/// sequences exactly as they arrived, never merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub status: i32,
}

/// Runs a generated script in the host shell, gated behind the
/// confirmation literal. The script runs with the operator's own
/// privileges; there is no sandboxing or privilege separation here.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutionGate;

impl ExecutionGate {
    pub fn new() -> Self {
        Self
    }

    /// Execute `script` as a single inline shell command.
    ///
    /// Rejects with `ConfirmationMismatch` unless `confirmation` equals the
    /// literal exactly — no spawn happens on a mismatch. A script that
    /// exits non-zero is a normal result; only failure to start the
    /// process is an error.
    pub async fn execute(
        &self,
        script: &str,
        confirmation: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        if confirmation != CONFIRMATION_LITERAL {
            warn!(
                event_name = "execute.confirmation_rejected",
                "execution requested without the exact confirmation literal"
            );
            return Err(PipelineError::ConfirmationMismatch);
        }

        let shell = ShellDialect::for_host();
        let mut child = Command::new(shell.program())
            .args(shell.inline_args(script))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| PipelineError::Spawn(error.to_string()))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let (stdout, stderr) = tokio::join!(drain_chunks(stdout_pipe), drain_chunks(stderr_pipe));

        let exit = child
            .wait()
            .await
            .map_err(|error| PipelineError::Spawn(error.to_string()))?;

        // An unknown exit code (signal termination) normalizes to 0 here
        // and nowhere else; callers still see the streams.
        let status = exit.code().unwrap_or(0);

        info!(
            event_name = "execute.completed",
            status,
            stdout_chunks = stdout.len(),
            stderr_chunks = stderr.len(),
            "script execution finished"
        );

        Ok(ExecutionResult { stdout, stderr, status })
    }
}

async fn drain_chunks(pipe: Option<impl AsyncRead + Unpin>) -> Vec<String> {
    let Some(mut reader) = pipe else {
        return Vec::new();
    };

    let mut chunks = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(read) => chunks.push(String::from_utf8_lossy(&buffer[..read]).into_owned()),
            Err(_) => break,
        }
    }
    chunks
}
