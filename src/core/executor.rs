//! Secure Executor (C5): sandboxed subprocess runner (spec §4.5).

use std::collections::HashSet;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::core::cancel::CancellationToken;
use crate::core::workspace::{CallWorkspace, OutputFile};
use crate::errors::{SandboxCategory, SandboxError};

/// Grace period between a cooperative cancellation/timeout and a forced
/// kill of the subprocess (spec §5).
const CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct InputFile {
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub command: String,
    pub args: Vec<String>,
    pub input_files: Vec<InputFile>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExecutionResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub output_files: Vec<OutputFile>,
    pub error: Option<String>,
    pub category: Option<SandboxCategory>,
}

impl ExecutionResponse {
    pub(crate) fn sandbox_rejected(error: &SandboxError) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            output_files: Vec::new(),
            error: Some(error.message.clone()),
            category: Some(error.category),
        }
    }
}

/// Runs validated tool calls against a fixed, closed command allow-list.
pub struct SecureExecutor {
    allowed_commands: HashSet<String>,
    stdout_cap_bytes: usize,
    stderr_cap_bytes: usize,
    max_input_file_bytes: u64,
}

impl SecureExecutor {
    pub fn new(
        allowed_commands: impl IntoIterator<Item = String>,
        stdout_cap_bytes: usize,
        stderr_cap_bytes: usize,
        max_input_file_bytes: u64,
    ) -> Self {
        Self {
            allowed_commands: allowed_commands.into_iter().collect(),
            stdout_cap_bytes,
            stderr_cap_bytes,
            max_input_file_bytes,
        }
    }

    pub async fn execute(&self, token: &CancellationToken, request: ExecutionRequest) -> ExecutionResponse {
        if !self.allowed_commands.contains(&request.command) {
            return ExecutionResponse::sandbox_rejected(&SandboxError::new(
                SandboxCategory::CommandNotAllowed,
                format!("command '{}' is not in the allow-list", request.command),
            ));
        }

        let workspace = match CallWorkspace::new() {
            Ok(w) => w,
            Err(e) => return ExecutionResponse::sandbox_rejected(&e),
        };

        for input_file in &request.input_files {
            if let Err(e) = workspace.place_input_file(&input_file.relative_path, &input_file.bytes, self.max_input_file_bytes) {
                return ExecutionResponse::sandbox_rejected(&e);
            }
        }
        let before = workspace.snapshot();

        let mut command = Command::new(&request.command);
        command
            .args(&request.args)
            .current_dir(workspace.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                return ExecutionResponse::sandbox_rejected(&SandboxError::new(
                    SandboxCategory::SpawnFailed,
                    format!("failed to spawn '{}': {e}", request.command),
                ));
            }
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_cap = self.stdout_cap_bytes;
        let stderr_cap = self.stderr_cap_bytes;
        let stdout_task = tokio::spawn(async move {
            match stdout_pipe.as_mut() {
                Some(pipe) => capped_read(pipe, stdout_cap).await,
                None => (String::new(), false),
            }
        });
        let stderr_task = tokio::spawn(async move {
            match stderr_pipe.as_mut() {
                Some(pipe) => capped_read(pipe, stderr_cap).await,
                None => (String::new(), false),
            }
        });

        let start = Instant::now();
        let outcome = tokio::select! {
            result = child.wait() => Outcome::Exited(result),
            _ = tokio::time::sleep(request.timeout) => Outcome::TimedOut,
            _ = token.cancelled() => Outcome::Cancelled,
        };
        let duration = start.elapsed();

        let (stdout_raw, stdout_truncated) = stdout_task.await.unwrap_or_default();
        let (stderr_raw, stderr_truncated) = stderr_task.await.unwrap_or_default();
        let mut stdout = stdout_raw;
        if stdout_truncated {
            stdout.push_str("\n… (truncated)");
        }
        let mut stderr = stderr_raw;
        if stderr_truncated {
            stderr.push_str("\n… (truncated)");
        }

        let (exit_code, error, category) = match outcome {
            Outcome::Exited(Ok(status)) => {
                let code = status.code().unwrap_or(-1);
                if code == 0 {
                    (0, None, None)
                } else {
                    (code, Some("nonzero_exit".to_string()), Some(SandboxCategory::NonzeroExit))
                }
            }
            Outcome::Exited(Err(e)) => (
                -1,
                Some(format!("failed to wait on subprocess: {e}")),
                Some(SandboxCategory::InternalError),
            ),
            Outcome::TimedOut => {
                terminate_with_grace(&mut child).await;
                (-1, Some("timeout".to_string()), Some(SandboxCategory::Timeout))
            }
            Outcome::Cancelled => {
                terminate_with_grace(&mut child).await;
                (-1, Some("cancelled".to_string()), Some(SandboxCategory::Cancelled))
            }
        };

        let output_files = if exit_code == 0 {
            match workspace.collect_output_files(&before) {
                Ok(files) => files,
                Err(e) => {
                    return ExecutionResponse {
                        exit_code,
                        stdout,
                        stderr,
                        duration,
                        output_files: Vec::new(),
                        error: Some(e.message),
                        category: Some(e.category),
                    };
                }
            }
        } else {
            Vec::new()
        };

        ExecutionResponse {
            exit_code,
            stdout,
            stderr,
            duration,
            output_files,
            error,
            category,
        }
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Waits out the grace period, giving the process a chance to exit on its
/// own `kill_on_drop` signal before the workspace (and this handle) is torn
/// down regardless.
async fn terminate_with_grace(child: &mut tokio::process::Child) {
    let _ = child.start_kill();
    let _ = tokio::time::timeout(CANCEL_GRACE_PERIOD, child.wait()).await;
}

/// Reads up to `cap` bytes from `pipe`, reporting whether the stream had
/// more data beyond the cap.
async fn capped_read<R: tokio::io::AsyncRead + Unpin>(pipe: &mut R, cap: usize) -> (String, bool) {
    let mut buf = Vec::with_capacity(cap.min(64 * 1024));
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() + n > cap {
                    let remaining = cap.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..remaining]);
                    truncated = true;
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(_) => break,
        }
    }
    (String::from_utf8_lossy(&buf).into_owned(), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SecureExecutor {
        SecureExecutor::new(
            ["true".to_string(), "false".to_string(), "sh".to_string()],
            1024,
            1024,
            crate::core::workspace::MAX_INPUT_FILE_BYTES,
        )
    }

    #[tokio::test]
    async fn disallowed_command_is_rejected_without_spawning() {
        let executor = executor();
        let token = CancellationToken::new();
        let response = executor
            .execute(
                &token,
                ExecutionRequest {
                    command: "rm".to_string(),
                    args: vec![],
                    input_files: vec![],
                    timeout: Duration::from_secs(1),
                },
            )
            .await;
        assert_eq!(response.category, Some(SandboxCategory::CommandNotAllowed));
    }

    #[tokio::test]
    async fn successful_exit_has_no_error() {
        let executor = executor();
        let token = CancellationToken::new();
        let response = executor
            .execute(
                &token,
                ExecutionRequest {
                    command: "true".to_string(),
                    args: vec![],
                    input_files: vec![],
                    timeout: Duration::from_secs(5),
                },
            )
            .await;
        assert_eq!(response.exit_code, 0);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn nonzero_exit_is_categorized() {
        let executor = executor();
        let token = CancellationToken::new();
        let response = executor
            .execute(
                &token,
                ExecutionRequest {
                    command: "false".to_string(),
                    args: vec![],
                    input_files: vec![],
                    timeout: Duration::from_secs(5),
                },
            )
            .await;
        assert_ne!(response.exit_code, 0);
        assert_eq!(response.category, Some(SandboxCategory::NonzeroExit));
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let executor = executor();
        let token = CancellationToken::new();
        let response = executor
            .execute(
                &token,
                ExecutionRequest {
                    command: "sh".to_string(),
                    args: vec!["-c".to_string(), "sleep 5".to_string()],
                    input_files: vec![],
                    timeout: Duration::from_millis(50),
                },
            )
            .await;
        assert_eq!(response.category, Some(SandboxCategory::Timeout));
        assert_eq!(response.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn cancellation_is_reported() {
        let executor = executor();
        let token = CancellationToken::new();
        let run = executor.execute(
            &token,
            ExecutionRequest {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), "sleep 5".to_string()],
                input_files: vec![],
                timeout: Duration::from_secs(30),
            },
        );
        tokio::pin!(run);
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        let response = run.await;
        assert_eq!(response.category, Some(SandboxCategory::Cancelled));
    }

    #[tokio::test]
    async fn oversized_input_file_is_rejected_before_spawn() {
        let executor = executor();
        let token = CancellationToken::new();
        let response = executor
            .execute(
                &token,
                ExecutionRequest {
                    command: "true".to_string(),
                    args: vec![],
                    input_files: vec![InputFile {
                        relative_path: "huge.csv".to_string(),
                        bytes: vec![0u8; (crate::core::workspace::MAX_INPUT_FILE_BYTES + 1) as usize],
                    }],
                    timeout: Duration::from_secs(5),
                },
            )
            .await;
        assert_eq!(response.category, Some(SandboxCategory::WorkspaceSetupFailed));
    }
}
