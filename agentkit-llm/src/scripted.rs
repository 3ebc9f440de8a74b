//! In-memory scripted provider for tests and demos, grounded in the
//! teacher's `LocalExecutor`-style test doubles
//! (`vtcode-core/src/orchestrator/executor.rs`).

use agentkit_core::{ChatResponse, LLMError, LLMProvider, Message};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Replays a fixed sequence of responses, one per `chat` call. Panics if
/// exhausted, matching the teacher's scripted-executor behavior of making
/// test misuse loud rather than silently returning a default.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ChatResponse>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        _messages: &[Message],
        _available_tools: &[String],
    ) -> Result<ChatResponse, LLMError> {
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Err(LLMError::Transport(
                "scripted provider exhausted its response queue".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }
}
