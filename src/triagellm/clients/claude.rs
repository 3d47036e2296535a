//! Anthropic Messages adapter.
//!
//! Implements [`ClientWrapper`] over Anthropic's native Messages API. Tool
//! requests arrive as `tool_use` content blocks and results go back as
//! `tool_result` blocks inside a user message; because the API requires
//! strict user/assistant alternation, consecutive canonical tool results are
//! coalesced into a single user message. The response `content` block array
//! is kept verbatim as the turn's raw content and echoed back unchanged on
//! the follow-up request.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Instant;

use crate::triagellm::client_wrapper::{
    ClientWrapper, LivenessReport, Message, ProviderTurn, ToolCall, ToolDefinition,
};
use crate::triagellm::clients::http_pool::get_http_client;
use crate::triagellm::error::TriageError;

/// Default Anthropic model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Client wrapper for Anthropic's Messages API.
pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    /// Construct a client using the provided API key and the default model.
    pub fn new(secret_key: &str) -> Self {
        Self::new_with_model_str(secret_key, DEFAULT_MODEL)
    }

    /// Construct a client with an explicit model name.
    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client pointing at a custom Claude-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        ClaudeClient {
            client: get_http_client(&base_url),
            api_key: secret_key.to_string(),
            model: model_name.to_string(),
            base_url,
        }
    }
}

#[async_trait]
impl ClientWrapper for ClaudeClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn ping(&self) -> LivenessReport {
        let start = Instant::now();
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) if response.status().is_success() => LivenessReport {
                alive: true,
                latency_ms,
                error: None,
            },
            Ok(response) => LivenessReport {
                alive: false,
                latency_ms,
                error: Some(format!(
                    "models endpoint returned status {}",
                    response.status()
                )),
            },
            Err(err) => LivenessReport {
                alive: false,
                latency_ms,
                error: Some(err.to_string()),
            },
        }
    }

    async fn send_turn(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderTurn, TriageError> {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": render_messages(messages),
            "tools": render_tools(tools),
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                log::error!(
                    "triagellm::clients::claude::send_turn(...): Anthropic API error: {}",
                    err
                );
                TriageError::Orchestration(format!("Anthropic messages request failed: {}", err))
            })?;

        if !response.status().is_success() {
            return Err(TriageError::Orchestration(format!(
                "Anthropic messages request returned status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(|err| {
            TriageError::Orchestration(format!("Anthropic response was not valid JSON: {}", err))
        })?;

        Ok(parse_turn(&payload))
    }
}

/// Render canonical history into Messages API entries, coalescing runs of
/// tool results into one user message of `tool_result` blocks.
fn render_messages(messages: &[Message]) -> Vec<Value> {
    let mut rendered: Vec<Value> = Vec::new();
    let mut pending_results: Vec<Value> = Vec::new();

    for message in messages {
        if let Message::ToolResult {
            tool_call_id,
            content,
        } = message
        {
            pending_results.push(json!({
                "type": "tool_result",
                "tool_use_id": tool_call_id,
                "content": content,
            }));
            continue;
        }

        flush_tool_results(&mut rendered, &mut pending_results);
        match message {
            Message::User { content } => rendered.push(json!({
                "role": "user",
                "content": content,
            })),
            Message::Assistant { raw_content, .. } => rendered.push(json!({
                "role": "assistant",
                "content": raw_content,
            })),
            Message::ToolResult { .. } => {}
        }
    }

    flush_tool_results(&mut rendered, &mut pending_results);
    rendered
}

fn flush_tool_results(rendered: &mut Vec<Value>, pending: &mut Vec<Value>) {
    if pending.is_empty() {
        return;
    }
    rendered.push(json!({
        "role": "user",
        "content": Value::Array(std::mem::take(pending)),
    }));
}

fn render_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}

/// Translate a Messages API response into a canonical turn.
///
/// Tool calls are only extracted when the response stopped for `tool_use`;
/// the raw content block array is preserved as-is for the history echo.
fn parse_turn(payload: &Value) -> ProviderTurn {
    let content = payload
        .get("content")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    let stopped_for_tools = payload.get("stop_reason").and_then(Value::as_str) == Some("tool_use");

    let mut tool_calls = Vec::new();
    let mut text = None;

    if let Some(blocks) = content.as_array() {
        for block in blocks {
            match block.get("type").and_then(Value::as_str) {
                Some("tool_use") if stopped_for_tools => {
                    let arguments = match block.get("input") {
                        Some(Value::Object(map)) => map.clone(),
                        _ => Map::new(),
                    };
                    tool_calls.push(ToolCall {
                        id: block
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        name: block
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        arguments,
                        argument_error: None,
                    });
                }
                Some("text") if text.is_none() => {
                    text = block.get("text").and_then(Value::as_str).map(str::to_string);
                }
                _ => {}
            }
        }
    }

    ProviderTurn {
        text,
        tool_calls,
        raw_content: content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_use_blocks_when_stopped_for_tools() {
        let payload = json!({
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_known_problems", "input": {}},
            ]
        });

        let turn = parse_turn(&payload);
        assert_eq!(turn.text.as_deref(), Some("Let me check."));
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].id, "toolu_1");
        assert_eq!(turn.tool_calls[0].name, "get_known_problems");
        assert_eq!(turn.raw_content, payload["content"]);
    }

    #[test]
    fn ignores_tool_use_blocks_on_other_stop_reasons() {
        let payload = json!({
            "stop_reason": "end_turn",
            "content": [
                {"type": "text", "text": "All done."},
                {"type": "tool_use", "id": "toolu_9", "name": "x", "input": {}},
            ]
        });

        let turn = parse_turn(&payload);
        assert!(turn.tool_calls.is_empty());
        assert_eq!(turn.text.as_deref(), Some("All done."));
    }

    #[test]
    fn coalesces_consecutive_tool_results_into_one_user_message() {
        let raw = json!([{"type": "tool_use", "id": "toolu_1", "name": "a", "input": {}}]);
        let messages = vec![
            Message::User {
                content: "help".to_string(),
            },
            Message::Assistant {
                raw_content: raw.clone(),
                tool_calls: vec![],
            },
            Message::ToolResult {
                tool_call_id: "toolu_1".to_string(),
                content: "[]".to_string(),
            },
            Message::ToolResult {
                tool_call_id: "toolu_2".to_string(),
                content: "{}".to_string(),
            },
        ];

        let rendered = render_messages(&messages);
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[1]["role"], "assistant");
        assert_eq!(rendered[1]["content"], raw);
        assert_eq!(rendered[2]["role"], "user");
        let blocks = rendered[2]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["tool_use_id"], "toolu_1");
        assert_eq!(blocks[1]["tool_use_id"], "toolu_2");
    }

    #[test]
    fn renders_native_tool_schema() {
        let tools = vec![ToolDefinition {
            name: "get_category_lists".to_string(),
            description: "lists".to_string(),
            input_schema: json!({"type": "object"}),
        }];
        let rendered = render_tools(&tools);
        assert_eq!(rendered[0]["name"], "get_category_lists");
        assert_eq!(rendered[0]["input_schema"]["type"], "object");
    }
}
