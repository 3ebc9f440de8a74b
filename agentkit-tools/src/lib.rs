//! Standard tool handlers shipped alongside the orchestrator core: shell
//! execution (`cli`) and file read/write/edit.

pub mod file_ops;
pub mod shell;

pub use file_ops::{EditFileHandler, FileOpsHandler, ReadFileHandler, WriteFileHandler};
pub use shell::ShellHandler;

use std::sync::Arc;
use std::time::Duration;

use agentkit_core::fs::FileSystem;
use agentkit_core::ToolRunner;

/// Builds a `ToolRunner` with the standard handlers registered under their
/// spec §4.3 names, backed by the given filesystem. `shell_timeout` becomes
/// the `cli` handler's default per-call timeout (overridable per call via
/// the `timeout_secs` parameter).
pub fn standard_tool_runner(fs: Arc<dyn FileSystem>, shell_timeout: Duration) -> ToolRunner {
    let mut runner = ToolRunner::new();
    runner.register("cli", Arc::new(ShellHandler::with_default_timeout(shell_timeout)));
    runner.register("read_file", Arc::new(ReadFileHandler(fs.clone())));
    runner.register("write_file", Arc::new(WriteFileHandler(fs.clone())));
    runner.register("edit_file", Arc::new(EditFileHandler(fs)));
    runner
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_core::fs::MemoryFileSystem;
    use agentkit_core::Value;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn standard_runner_registers_all_four_names() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemoryFileSystem::default());
        let runner = standard_tool_runner(fs, Duration::from_secs(30));
        for name in ["cli", "read_file", "write_file", "edit_file"] {
            assert!(runner.is_registered(name));
        }
    }

    #[tokio::test]
    async fn cli_handler_runs_through_the_runner() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemoryFileSystem::default());
        let runner = standard_tool_runner(fs, Duration::from_secs(30));
        let params = Value::object([(
            "command".to_string(),
            Value::String("echo hi".to_string()),
        )]);
        let result = runner.run("cli", &params).await.unwrap();
        assert_eq!(result.output, "hi");
    }
}
