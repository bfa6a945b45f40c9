use crate::constants::limits::{MAX_OUTPUT_BYTES, READ_CHUNK_BYTES};
use crate::errors::{BrokerError, OutputStream};
use crate::services::logger::Logger;
use crate::utils::paths::normalize_env_value;
use async_trait::async_trait;
use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Outcome of one pipeline run, handed back to the tool layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
            error_detail: None,
            error_code: None,
        }
    }

    pub fn failure(output: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
            error_detail: Some(detail.into()),
            error_code: Some("PROCESS_FAILURE".to_string()),
        }
    }

    pub fn from_error(err: &BrokerError) -> Self {
        Self {
            succeeded: false,
            output: String::new(),
            error_detail: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }
}

/// Seam between the broker and process spawning.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        argv: &[String],
        max_output_bytes: usize,
    ) -> Result<ExecutionResult, BrokerError>;
}

pub fn resolve_max_output_bytes() -> usize {
    normalize_env_value(std::env::var("SSH_BROKER_MAX_OUTPUT_BYTES").ok())
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(MAX_OUTPUT_BYTES)
}

pub fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status: {}", code),
        None => "terminated by signal".to_string(),
    }
}

async fn read_capped<R>(
    reader: Option<R>,
    limit: usize,
    stream: OutputStream,
) -> Result<Vec<u8>, BrokerError>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(captured);
    };
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                return Err(BrokerError::ProcessFailure(format!(
                    "Failed to read {}: {}",
                    stream, err
                )))
            }
        };
        if captured.len() + n > limit {
            return Err(BrokerError::OutputTooLarge { stream, limit });
        }
        captured.extend_from_slice(&buf[..n]);
    }
    Ok(captured)
}

/// Spawns argv directly (no local shell) and waits for it to exit.
#[derive(Clone)]
pub struct ProcessRunner {
    logger: Logger,
}

impl ProcessRunner {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("runner"),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        argv: &[String],
        max_output_bytes: usize,
    ) -> Result<ExecutionResult, BrokerError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(BrokerError::invalid_input("argument vector must not be empty"));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = chrono::Utc::now().timestamp_millis();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.logger.warn(
                    "spawn failed",
                    Some(&serde_json::json!({ "program": program, "error": err.to_string() })),
                );
                return Ok(ExecutionResult::failure(
                    "",
                    format!("Failed to spawn {}: {}", program, err),
                ));
            }
        };

        let stdout = read_capped(child.stdout.take(), max_output_bytes, OutputStream::Stdout);
        let stderr = read_capped(child.stderr.take(), max_output_bytes, OutputStream::Stderr);
        let (stdout, stderr) = match tokio::try_join!(stdout, stderr) {
            Ok(captured) => captured,
            Err(err) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                self.logger.warn(
                    "process output rejected",
                    Some(&serde_json::json!({ "program": program, "error": err.to_string() })),
                );
                return Err(err);
            }
        };

        let status = child.wait().await.map_err(|err| {
            BrokerError::ProcessFailure(format!("Failed to wait for {}: {}", program, err))
        })?;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started;
        self.logger.debug(
            "process finished",
            Some(&serde_json::json!({
                "program": program,
                "exit_code": status.code(),
                "duration_ms": duration_ms,
                "stdout_bytes": stdout.len(),
                "stderr_bytes": stderr.len(),
            })),
        );

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        if status.success() {
            return Ok(ExecutionResult::success(stdout));
        }
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim_end();
        let summary = describe_exit(&status);
        let detail = if stderr.is_empty() {
            summary
        } else {
            format!("{}\n{}", stderr, summary)
        };
        Ok(ExecutionResult::failure(stdout, detail))
    }
}
