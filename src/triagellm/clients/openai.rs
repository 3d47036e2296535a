//! OpenAI Chat Completions adapter.
//!
//! Implements [`ClientWrapper`] over the raw Chat Completions wire format:
//! the liveness probe lists models, and `send_turn` posts the canonical
//! history with the tool manifest rendered as `function` tools. The
//! assistant message object returned by the API is kept verbatim as the
//! turn's raw content — OpenAI requires the original `tool_calls` structure
//! to be echoed back on the follow-up request, so the rendered history
//! re-attaches it unchanged.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Instant;

use crate::triagellm::client_wrapper::{
    ClientWrapper, LivenessReport, Message, ProviderTurn, ToolCall, ToolDefinition,
};
use crate::triagellm::clients::http_pool::get_http_client;
use crate::triagellm::error::TriageError;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client wrapper for OpenAI's Chat Completions API.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    /// Construct a client using the provided API key and the default model.
    pub fn new(secret_key: &str) -> Self {
        Self::new_with_model_str(secret_key, DEFAULT_MODEL)
    }

    /// Construct a client with an explicit model name.
    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        OpenAIClient {
            client: get_http_client(&base_url),
            api_key: secret_key.to_string(),
            model: model_name.to_string(),
            base_url,
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn ping(&self) -> LivenessReport {
        let start = Instant::now();
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
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
            "messages": render_messages(messages),
            "tools": render_tools(tools),
            "tool_choice": "auto",
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                log::error!(
                    "triagellm::clients::openai::send_turn(...): OpenAI API error: {}",
                    err
                );
                TriageError::Orchestration(format!("OpenAI chat request failed: {}", err))
            })?;

        if !response.status().is_success() {
            return Err(TriageError::Orchestration(format!(
                "OpenAI chat request returned status {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(|err| {
            TriageError::Orchestration(format!("OpenAI response was not valid JSON: {}", err))
        })?;

        let message = payload
            .pointer("/choices/0/message")
            .cloned()
            .ok_or_else(|| {
                TriageError::Orchestration("OpenAI response carried no message".to_string())
            })?;

        let tool_calls = parse_tool_calls(&message);
        let text = message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ProviderTurn {
            text,
            tool_calls,
            raw_content: message,
        })
    }
}

/// Render canonical history into Chat Completions messages.
///
/// Assistant turns are the raw message objects captured from previous
/// responses, re-attached verbatim; tool results become `role: "tool"`
/// entries correlated by `tool_call_id`.
fn render_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message {
            Message::User { content } => json!({
                "role": "user",
                "content": content,
            }),
            Message::Assistant { raw_content, .. } => raw_content.clone(),
            Message::ToolResult {
                tool_call_id,
                content,
            } => json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "content": content,
            }),
        })
        .collect()
}

fn render_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                },
            })
        })
        .collect()
}

/// Extract canonical tool calls from an assistant message object.
///
/// A call whose `arguments` string cannot be parsed is kept, with the parse
/// failure recorded on the call itself; co-requested well-formed calls are
/// unaffected.
fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
    let raw_calls = match message.get("tool_calls").and_then(Value::as_array) {
        Some(raw_calls) => raw_calls,
        None => return Vec::new(),
    };

    let mut calls = Vec::with_capacity(raw_calls.len());
    for raw in raw_calls {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let function = raw.get("function");
        let name = function
            .and_then(|f| f.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let raw_arguments = function
            .and_then(|f| f.get("arguments"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let (arguments, argument_error) = match parse_function_arguments(raw_arguments) {
            Ok(arguments) => (arguments, None),
            Err(message) => {
                log::warn!(
                    "triagellm::clients::openai::parse_tool_calls(...): tool call '{}' carried unparseable arguments: {}",
                    name,
                    message
                );
                (Map::new(), Some(message))
            }
        };
        calls.push(ToolCall {
            id,
            name,
            arguments,
            argument_error,
        });
    }
    calls
}

/// Function-call arguments arrive as a JSON-encoded string. An empty string
/// means no arguments; anything else must parse to a JSON object.
fn parse_function_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|err| format!("malformed tool arguments: {}", err))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("tool arguments were not an object: {}", other)),
    }
}
