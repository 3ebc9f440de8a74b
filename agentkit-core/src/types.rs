//! Conversation-level data types: `Message`, `ToolCall`, `ToolResult`.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role of a transcript entry. Tool results are appended as `ToolResult`
/// messages, not folded into `User` (spec §3 data model table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// One entry in the append-only conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// A single tool invocation requested by the LLM within one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: BTreeMap<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    /// Canonical parameters for this call, used for both permission-rule
    /// keys and display.
    pub fn params(&self) -> Value {
        Value::Object(self.arguments.clone().into_iter().collect())
    }
}

/// Outcome of one tool invocation. Exactly one of `output`/`error` carries
/// meaning; both fields may legitimately be empty strings (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Text representation folded into the next user-role transcript
    /// message (spec §3 ToolResult lifecycle).
    pub fn as_transcript_text(&self) -> &str {
        match &self.error {
            Some(err) => err,
            None => &self.output,
        }
    }
}
