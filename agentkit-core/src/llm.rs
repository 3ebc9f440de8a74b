//! LLM provider contract (spec §4.4). Concrete adapters live outside this
//! crate (e.g. `agentkit-llm`); only the trait and the shared request/
//! response shapes live here.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Message, ToolCall};

/// One assistant turn returned by a provider.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// `true` means the LLM believes the conversation turn is complete.
    /// `false` must be accompanied by at least one tool call; the
    /// orchestrator treats any other combination as malformed.
    pub finished: bool,
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),
    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Given a message transcript and the tool catalog available this turn,
    /// returns an assistant turn or a transport/parsing error.
    async fn chat(
        &self,
        messages: &[Message],
        available_tools: &[String],
    ) -> Result<ChatResponse, LLMError>;
}
