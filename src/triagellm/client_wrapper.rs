//! Canonical conversation types and the provider-facing [`ClientWrapper`] trait.
//!
//! A `ClientWrapper` wraps one vendor's chat/completion API behind a shared
//! interface: a cheap liveness probe ([`ClientWrapper::ping`]) and a
//! single-turn generate call ([`ClientWrapper::send_turn`]) that accepts the
//! canonical tool manifest and canonical message history. Each vendor module
//! under [`clients`](crate::triagellm::clients) translates its native
//! request/response shapes into these types; the orchestration loop never
//! sees vendor wire formats.
//!
//! The one deliberate hole in the abstraction is the `raw_content` carried
//! by [`ProviderTurn`] and [`Message::Assistant`]: each
//! vendor requires its own original assistant content shape to be echoed
//! back for conversation continuity, so the canonical layer carries it as an
//! opaque [`serde_json::Value`] and re-attaches it verbatim, never
//! reconstructing or inspecting it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::triagellm::error::TriageError;

/// One entry of the canonical, append-only conversation history.
///
/// The message list is the sole carrier of conversation state across loop
/// iterations: the orchestrator only ever appends, never mutates a
/// previously appended message.
#[derive(Debug, Clone)]
pub enum Message {
    /// A message from the caller (the seeded problem statement).
    User {
        /// Plain-text content.
        content: String,
    },
    /// An assistant turn that requested tool calls, echoed back into
    /// history so the provider can correlate the results that follow.
    Assistant {
        /// The vendor's original content shape, re-attached verbatim.
        raw_content: Value,
        /// The calls the assistant requested in this turn, in order.
        tool_calls: Vec<ToolCall>,
    },
    /// The result of one dispatched tool call.
    ToolResult {
        /// Provider-assigned id of the call this result answers.
        tool_call_id: String,
        /// The tool result, serialized to a string.
        content: String,
    },
}

/// A provider's request to invoke a named tool with arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned correlation id; must be echoed on the matching
    /// [`Message::ToolResult`].
    pub id: String,
    /// Canonical tool name.
    pub name: String,
    /// Parsed argument mapping. Empty when the provider sent no arguments
    /// or when they could not be parsed.
    pub arguments: Map<String, Value>,
    /// Set when the provider's argument payload could not be parsed into an
    /// object. The call still flows through dispatch, which answers it with
    /// an error payload instead of invoking the tool.
    pub argument_error: Option<String>,
}

/// Canonical descriptor of one invocable tool, as offered to a provider.
///
/// Built each orchestration run from the capability server's advertised
/// tools plus the two fixed built-ins; serialized with the MCP field names
/// (`inputSchema`) on the capability-server wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema-like object describing the accepted arguments.
    #[serde(rename = "inputSchema", alias = "input_schema", default)]
    pub input_schema: Value,
}

/// Outcome of a single liveness probe. Produced fresh per selection
/// attempt and never cached.
#[derive(Debug, Clone)]
pub struct LivenessReport {
    /// Whether the provider answered its minimal read-only call.
    pub alive: bool,
    /// Wall-clock latency from call start to response or failure.
    pub latency_ms: u64,
    /// Failure detail when `alive` is false.
    pub error: Option<String>,
}

/// Canonical result of one adapter turn: either final text (no tool calls)
/// or zero-or-more requested tool calls (text may be absent).
#[derive(Debug, Clone)]
pub struct ProviderTurn {
    /// Textual content of the turn, if any.
    pub text: Option<String>,
    /// Tool calls requested by this turn, in the order the provider
    /// emitted them.
    pub tool_calls: Vec<ToolCall>,
    /// The vendor's original assistant content, owned but never inspected
    /// by the canonical layer.
    pub raw_content: Value,
}

/// Uniform interface over one vendor's LLM API.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Model identifier this wrapper sends with each request.
    fn model_name(&self) -> &str;

    /// Probe whether the vendor is currently reachable and responsive.
    ///
    /// Makes a minimal read-only call (model listing) with no side effects
    /// and measures its wall-clock latency. Never fails the caller:
    /// transport errors are converted into `alive: false` reports.
    async fn ping(&self) -> LivenessReport;

    /// Run one conversation turn against the vendor.
    ///
    /// Transport or API failures propagate as
    /// [`TriageError::Orchestration`] — fatal for the request, with no
    /// retry at this layer.
    async fn send_turn(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderTurn, TriageError>;
}
