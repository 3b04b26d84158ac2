//! CUSTOM tool backend.
//!
//! Runs the tool's code as a child process under its runtime. The input is
//! written to stdin as JSON; stdout becomes the output, parsed as JSON when
//! possible. The child is killed when the budget runs out or when stdout
//! passes the configured output cap.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use hookflow_core::tool::backend::{BackendFuture, ToolBackend};
use hookflow_types::error::ToolError;
use hookflow_types::tool::CustomToolConfig;

/// Longest stderr excerpt kept in an error message.
const STDERR_EXCERPT: usize = 1024;

/// Stderr bytes buffered per run; the rest is discarded.
const STDERR_CAPTURE: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ProcessCustomBackend {
    max_output_bytes: usize,
}

impl ProcessCustomBackend {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }
}

/// Program and inline-code flag for a runtime identifier.
fn interpreter(runtime: &str) -> Result<(&'static str, &'static str), ToolError> {
    match runtime {
        "bash" => Ok(("bash", "-c")),
        "python" | "python3" => Ok(("python3", "-c")),
        "node" => Ok(("node", "-e")),
        other => Err(ToolError::InvalidConfig(format!("unsupported runtime '{other}'"))),
    }
}

impl ProcessCustomBackend {
    async fn run(&self, config: &CustomToolConfig, input: &Value) -> Result<Value, ToolError> {
        let (program, flag) = interpreter(&config.runtime)?;

        let mut child = Command::new(program)
            .arg(flag)
            .arg(&config.code)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Internal(format!("failed to start {program}: {e}")))?;

        let payload =
            serde_json::to_vec(input).map_err(|e| ToolError::Internal(format!("failed to encode input: {e}")))?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Internal("child stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ToolError::Internal("child stderr not captured".to_string()))?;

        let limit = self.max_output_bytes;
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // Code that never reads stdin closes the pipe early.
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!(error = %e, "custom tool did not consume stdin");
                }
            }
            Ok::<(), ToolError>(())
        };
        let read_stdout = async move {
            let mut buf = Vec::new();
            stdout
                .take((limit as u64).saturating_add(1))
                .read_to_end(&mut buf)
                .await
                .map_err(|e| ToolError::Internal(format!("failed to read stdout: {e}")))?;
            if buf.len() > limit {
                return Err(ToolError::Internal(format!("output exceeds {limit} bytes")));
            }
            Ok(buf)
        };
        let read_stderr = async {
            let mut buf = Vec::new();
            (&mut stderr)
                .take(STDERR_CAPTURE)
                .read_to_end(&mut buf)
                .await
                .map_err(|e| ToolError::Internal(format!("failed to read stderr: {e}")))?;
            // Keep the pipe flowing past the capture so the child never blocks.
            tokio::io::copy(&mut stderr, &mut tokio::io::sink())
                .await
                .map_err(|e| ToolError::Internal(format!("failed to read stderr: {e}")))?;
            Ok(buf)
        };

        let (_, stdout, stderr) = match tokio::try_join!(feed, read_stdout, read_stderr) {
            Ok(streams) => streams,
            Err(e) => {
                if let Err(kill) = child.start_kill() {
                    tracing::debug!(error = %kill, "custom tool already exited");
                }
                return Err(e);
            }
        };

        let status = child
            .wait()
            .await
            .map_err(|e| ToolError::Internal(format!("failed to wait for {program}: {e}")))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(ToolError::Internal(format!(
                "{} exited with {}: {}",
                config.runtime, status, excerpt
            )));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        let trimmed = stdout.trim();
        Ok(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
    }
}

impl ToolBackend<CustomToolConfig> for ProcessCustomBackend {
    fn execute<'a>(
        &'a self,
        config: &'a CustomToolConfig,
        input: &'a Value,
        budget: Duration,
    ) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            // Dropping the run future drops the child, which kills it.
            match tokio::time::timeout(budget, self.run(config, input)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(runtime = %config.runtime, ?budget, "custom tool killed after budget");
                    Err(ToolError::Timeout(budget))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bash(code: &str) -> CustomToolConfig {
        CustomToolConfig {
            runtime: "bash".to_string(),
            code: code.to_string(),
            timeout_secs: None,
        }
    }

    const BUDGET: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_json_stdout_is_parsed() {
        let backend = ProcessCustomBackend::new(1024);
        let output = backend
            .execute(&bash(r#"echo '{"ok": true}'"#), &json!({}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_input_arrives_on_stdin() {
        let backend = ProcessCustomBackend::new(1024);
        let output = backend
            .execute(&bash("cat"), &json!({"n": 3}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"n": 3}));
    }

    #[tokio::test]
    async fn test_plain_stdout_becomes_string() {
        let backend = ProcessCustomBackend::new(1024);
        let output = backend
            .execute(&bash("echo hello world"), &json!({}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!("hello world"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_internal_with_stderr() {
        let backend = ProcessCustomBackend::new(1024);
        let err = backend
            .execute(&bash("echo boom >&2; exit 3"), &json!({}), BUDGET)
            .await
            .unwrap_err();
        match err {
            ToolError::Internal(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_output_rejected() {
        let backend = ProcessCustomBackend::new(8);
        let err = backend
            .execute(&bash("echo 0123456789abcdef"), &json!({}), BUDGET)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));
    }

    #[tokio::test]
    async fn test_endless_output_is_cut_off_at_the_cap() {
        let backend = ProcessCustomBackend::new(1024);
        let started = std::time::Instant::now();
        let err = backend
            .execute(&bash("yes"), &json!({}), BUDGET)
            .await
            .unwrap_err();
        match err {
            ToolError::Internal(msg) => assert!(msg.contains("exceeds 1024 bytes")),
            other => panic!("expected Internal, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_block_the_child() {
        let backend = ProcessCustomBackend::new(1024);
        let output = backend
            .execute(&bash(r#"head -c 1000000 /dev/zero >&2; echo '{"ok": true}'"#), &json!({}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_runaway_code_times_out() {
        let backend = ProcessCustomBackend::new(1024);
        let started = std::time::Instant::now();
        let err = backend
            .execute(&bash("sleep 30"), &json!({}), Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unknown_runtime_rejected() {
        let backend = ProcessCustomBackend::new(1024);
        let config = CustomToolConfig {
            runtime: "cobol".to_string(),
            code: String::new(),
            timeout_secs: None,
        };
        let err = backend.execute(&config, &json!({}), BUDGET).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidConfig(_)));
    }
}
