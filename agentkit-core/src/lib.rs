//! Core agent orchestration subsystem: the conversation driver, the
//! permission engine, the tool-execution dispatcher, and the event stream
//! that couples them to any front-end.
//!
//! Front-end rendering, config loading, and concrete non-Anthropic LLM/tool
//! backends are deliberately outside this crate; see `SPEC_FULL.md` at the
//! workspace root for the scope boundary.

pub mod error;
pub mod event;
pub mod fs;
pub mod llm;
pub mod orchestrator;
pub mod permission;
pub mod tools;
pub mod types;
pub mod value;

pub use error::{OrchestratorError, PermissionError, ToolRunnerError};
pub use event::{Event, EventReceiver, EventSender, PermissionRequestData, event_channel};
pub use llm::{ChatResponse, LLMError, LLMProvider};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use permission::{Decision, PermissionEngine, PermissionRule};
pub use tools::{ToolHandler, ToolRunner};
pub use types::{Message, Role, ToolCall, ToolResult};
pub use value::Value;
