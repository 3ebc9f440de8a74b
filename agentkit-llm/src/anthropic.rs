//! Anthropic Messages API adapter, grounded in the teacher's
//! `vtcode-core/src/llm/providers/anthropic` module — trimmed to the
//! request/response shape this system needs: no prompt caching, no
//! extended thinking, no streaming (spec §4.4 Non-goals).

use std::collections::BTreeMap;
use std::time::Duration;

use agentkit_core::{ChatResponse, LLMError, LLMProvider, Message, Role, ToolCall, Value};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    pub fn with_model(api_key: String, model: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client builds with default TLS backend");

        Self {
            api_key,
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Maps transcript roles onto Anthropic's two wire roles, the way the
    /// teacher's `request_builder/messages.rs` does for `MessageRole::Tool`:
    /// tool output rides back to the model as a `user`-role message, here
    /// as a `tool_result` content block rather than plain text so the model
    /// can tell tool output apart from a human follow-up. This transcript
    /// has no `tool_use_id` linkage between a `ToolCall` and the `Message`
    /// carrying its result (spec §3 keeps `Message` call-agnostic), so the
    /// block omits `tool_use_id` rather than fabricating one.
    fn to_anthropic_messages(messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::User => json!({ "role": "user", "content": m.content }),
                Role::Assistant => json!({ "role": "assistant", "content": m.content }),
                Role::ToolResult => json!({
                    "role": "user",
                    "content": [{ "type": "tool_result", "content": m.content }],
                }),
            })
            .collect()
    }

    fn to_anthropic_tools(available_tools: &[String]) -> Vec<serde_json::Value> {
        available_tools
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "description": format!("Invoke the {name} tool"),
                    "input_schema": { "type": "object" },
                })
            })
            .collect()
    }

    fn parse_response(body: serde_json::Value) -> Result<ChatResponse, LLMError> {
        let content = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LLMError::InvalidResponse("missing content array".to_string()))?;

        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in content {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                        text_parts.push(text.to_string());
                    }
                }
                Some("tool_use") => {
                    let id = block.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                    let name = block.get("name").and_then(|v| v.as_str()).unwrap_or_default();
                    if id.is_empty() || name.is_empty() {
                        continue;
                    }
                    let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                    let arguments = match Value::from_json(&input) {
                        Value::Object(map) => map,
                        _ => BTreeMap::new(),
                    };
                    tool_calls.push(ToolCall {
                        id: id.to_string(),
                        name: name.to_string(),
                        arguments,
                    });
                }
                _ => {}
            }
        }

        let stop_reason = body.get("stop_reason").and_then(|s| s.as_str());
        let finished = stop_reason != Some("tool_use") && tool_calls.is_empty();

        Ok(ChatResponse {
            content: text_parts.join("\n"),
            tool_calls,
            finished,
        })
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(
        &self,
        messages: &[Message],
        available_tools: &[String],
    ) -> Result<ChatResponse, LLMError> {
        let request_body = json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "messages": Self::to_anthropic_messages(messages),
            "tools": Self::to_anthropic_tools(available_tools),
        });

        tracing::debug!(model = %self.model, turn_messages = messages.len(), "sending anthropic request");

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| LLMError::Transport(err.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(LLMError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Transport(format!(
                "anthropic returned {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| LLMError::InvalidResponse(err.to_string()))?;

        Self::parse_response(body)
    }
}
