//! Shell execution tool (tool name `cli`), grounded in the teacher's
//! `bash_tool.rs::execute_command` — a system-shell invocation with a
//! configurable timeout, combined stdout/stderr, trimmed (spec §4.3).

use std::process::Stdio;
use std::time::Duration;

use agentkit_core::{ToolHandler, ToolResult, ToolRunnerError, Value};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ShellHandler {
    default_timeout: Duration,
}

impl ShellHandler {
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_default_timeout(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }
}

impl Default for ShellHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for ShellHandler {
    async fn execute(&self, params: &Value) -> Result<ToolResult, ToolRunnerError> {
        let Some(command) = params.get_str("command") else {
            return Ok(ToolResult::failed(
                "missing required parameter: command".to_string(),
            ));
        };

        let timeout_duration = params
            .get("timeout_secs")
            .and_then(Value::as_u64)
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        tracing::debug!(%command, timeout_secs = timeout_duration.as_secs(), "executing shell command");

        let spawn_result = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawn_result {
            Ok(child) => child,
            Err(err) => {
                return Err(ToolRunnerError::Transport {
                    tool: "cli".to_string(),
                    message: format!("failed to spawn shell: {err}"),
                });
            }
        };

        let wait_result = timeout(timeout_duration, child.wait_with_output()).await;

        match wait_result {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                let trimmed = combined.trim().to_string();

                if output.status.success() {
                    Ok(ToolResult::ok(trimmed))
                } else {
                    let code = output.status.code().unwrap_or(-1);
                    Ok(ToolResult::failed(format!(
                        "command exited with status {code}: {trimmed}"
                    )))
                }
            }
            Ok(Err(err)) => Err(ToolRunnerError::Transport {
                tool: "cli".to_string(),
                message: format!("failed to collect command output: {err}"),
            }),
            Err(_) => Ok(ToolResult::failed(format!(
                "command timed out after {}s",
                timeout_duration.as_secs()
            ))),
        }
    }
}
