//! Typed error vocabulary for the core, replacing spec §7's prose error
//! taxonomy with matchable variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("failed to read permission rules from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write permission rules to {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("permission rules file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ToolRunnerError {
    #[error("tool runner transport failure for '{tool}': {message}")]
    Transport { tool: String, message: String },
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("llm transport failure: {0}")]
    LlmTransport(String),
    #[error("malformed llm response: finished=false with no tool calls")]
    MalformedResponse,
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    ToolRunner(#[from] ToolRunnerError),
}
