//! Stateless dispatcher keyed by tool name (spec §4.3). One handler struct
//! may serve multiple tool names; registration is many-to-one, via a
//! dispatch table rather than dynamic dispatch on the handler type (spec
//! §9), grounded in the teacher's `ExecutorRegistry` pattern.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolRunnerError;
use crate::types::ToolResult;
use crate::value::Value;

/// One registered tool implementation. Parameter-validation failures are
/// reported as `Ok(ToolResult::failed(..))` — a tool-level error; only a
/// genuine transport failure (the handler could not even attempt the
/// operation, e.g. exec failed to spawn) returns `Err` (spec §4.3/§7).
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, params: &Value) -> Result<ToolResult, ToolRunnerError>;
}

/// Dispatches a named tool invocation to a registered handler and
/// normalizes its output.
#[derive(Default, Clone)]
pub struct ToolRunner {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`. Calling this again with the same
    /// name replaces the previous registration.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Dispatches by name. Unknown names yield `Ok(result.error = "unsupported
    /// tool: X")` with no transport error — transport errors are reserved for
    /// handler-internal failures surfaced as `Err` (spec §4.3).
    pub async fn run(&self, name: &str, params: &Value) -> Result<ToolResult, ToolRunnerError> {
        match self.handlers.get(name) {
            Some(handler) => {
                tracing::debug!(tool = name, "dispatching tool call");
                handler.execute(params).await
            }
            None => {
                tracing::warn!(tool = name, "unsupported tool requested");
                Ok(ToolResult::failed(format!("unsupported tool: {name}")))
            }
        }
    }
}

/// Test doubles for exercising the orchestrator without real side effects.
/// Grounded in the teacher's `LocalExecutor` test double
/// (`vtcode-core/src/orchestrator/executor.rs`).
pub mod testing {
    use super::*;

    /// Handler that always returns a fixed result.
    pub struct FixedHandler(pub ToolResult);

    #[async_trait]
    impl ToolHandler for FixedHandler {
        async fn execute(&self, _params: &Value) -> Result<ToolResult, ToolRunnerError> {
            Ok(self.0.clone())
        }
    }

    /// Handler that always fails at the transport level, e.g. simulating a
    /// process that could not be spawned.
    pub struct FailingHandler(pub String);

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn execute(&self, _params: &Value) -> Result<ToolResult, ToolRunnerError> {
            Err(ToolRunnerError::Transport {
                tool: "test".into(),
                message: self.0.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingHandler, FixedHandler};
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn unknown_tool_is_a_result_error_not_a_transport_error() {
        let runner = ToolRunner::new();
        let result = runner.run("nonexistent", &Value::Null).await.expect("no transport error");
        assert_eq!(result.error.as_deref(), Some("unsupported tool: nonexistent"));
    }

    #[tokio::test]
    async fn one_handler_can_serve_multiple_names() {
        let mut runner = ToolRunner::new();
        let handler: Arc<dyn ToolHandler> = Arc::new(FixedHandler(ToolResult::ok("ok")));
        runner.register("read_file", handler.clone());
        runner.register("write_file", handler);

        assert_eq!(runner.run("read_file", &Value::Null).await.unwrap().output, "ok");
        assert_eq!(runner.run("write_file", &Value::Null).await.unwrap().output, "ok");
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_err() {
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FailingHandler("could not spawn".into())));
        let result = runner.run("cli", &Value::Null).await;
        assert!(result.is_err());
    }
}
