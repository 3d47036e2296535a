use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::error::Error;
use std::sync::Arc;
use std::sync::Mutex;

use triagellm::dispatcher::{
    CATEGORY_LISTS_URI, GET_CATEGORY_LISTS_TOOL, GET_KNOWN_PROBLEMS_TOOL, KNOWN_PROBLEMS_URI,
};
use triagellm::orchestrator::run_resolution;
use triagellm::{
    CapabilityClient, ClientWrapper, JsonDecoder, LivenessReport, Message, ProviderTurn,
    ResourceChunk, ResourceContents, ToolCall, ToolDefinition, ToolDispatcher, TriageError,
    FALLBACK_RESULT,
};

struct ScriptedProvider {
    turns: Mutex<VecDeque<ProviderTurn>>,
    /// Snapshot of the history and manifest passed to each send_turn call.
    seen: Mutex<Vec<(Vec<Message>, Vec<String>)>>,
}

impl ScriptedProvider {
    fn new(turns: Vec<ProviderTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ClientWrapper for ScriptedProvider {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn ping(&self) -> LivenessReport {
        LivenessReport {
            alive: true,
            latency_ms: 1,
            error: None,
        }
    }

    async fn send_turn(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ProviderTurn, TriageError> {
        self.seen.lock().unwrap().push((
            messages.to_vec(),
            tools.iter().map(|t| t.name.clone()).collect(),
        ));
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TriageError::Orchestration("provider transport failed".to_string()))
    }
}

#[derive(Default)]
struct MockCapability {
    tools: Vec<ToolDefinition>,
    fail_list: bool,
    read_log: Mutex<Vec<String>>,
}

#[async_trait]
impl CapabilityClient for MockCapability {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, Box<dyn Error + Send + Sync>> {
        if self.fail_list {
            return Err("listing tools failed".into());
        }
        Ok(self.tools.clone())
    }

    async fn read_resource(
        &self,
        uri: &str,
    ) -> Result<ResourceContents, Box<dyn Error + Send + Sync>> {
        self.read_log.lock().unwrap().push(uri.to_string());
        Ok(ResourceContents {
            contents: vec![ResourceChunk {
                text: r#"{"ok":true}"#.to_string(),
            }],
        })
    }

    async fn call_tool(
        &self,
        _name: &str,
        _arguments: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        Ok(json!({"ok": true}))
    }
}

fn text_turn(text: &str) -> ProviderTurn {
    ProviderTurn {
        text: Some(text.to_string()),
        tool_calls: vec![],
        raw_content: json!({"role": "assistant", "content": text}),
    }
}

fn tool_turn(calls: &[(&str, &str)]) -> ProviderTurn {
    ProviderTurn {
        text: None,
        tool_calls: calls
            .iter()
            .map(|(id, name)| ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: Map::new(),
                argument_error: None,
            })
            .collect(),
        raw_content: json!({"role": "assistant", "content": null}),
    }
}

fn server_tool(name: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: String::new(),
        input_schema: json!({"type": "object"}),
    }
}

#[tokio::test]
async fn text_only_turn_terminates_in_one_call() {
    let provider = ScriptedProvider::new(vec![text_turn("Resolved: restart the agent.")]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let resolution = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    assert_eq!(resolution.result, "Resolved: restart the agent.");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn missing_text_yields_fallback_sentence() {
    let provider = ScriptedProvider::new(vec![ProviderTurn {
        text: None,
        tool_calls: vec![],
        raw_content: json!({}),
    }]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let resolution = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    assert_eq!(resolution.result, FALLBACK_RESULT);
}

#[tokio::test]
async fn manifest_lists_capability_tools_before_builtins() {
    let provider = ScriptedProvider::new(vec![text_turn("done")]);
    let capability = Arc::new(MockCapability {
        tools: vec![server_tool("board-archive-tool")],
        ..Default::default()
    });
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    let seen = provider.seen.lock().unwrap();
    let (_, manifest) = &seen[0];
    assert_eq!(
        manifest.as_slice(),
        &[
            "board-archive-tool".to_string(),
            GET_CATEGORY_LISTS_TOOL.to_string(),
            GET_KNOWN_PROBLEMS_TOOL.to_string(),
        ]
    );
}

#[tokio::test]
async fn list_tools_failure_leaves_builtins_only() {
    let provider = ScriptedProvider::new(vec![text_turn("done")]);
    let capability = Arc::new(MockCapability {
        fail_list: true,
        ..Default::default()
    });
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    let seen = provider.seen.lock().unwrap();
    let (_, manifest) = &seen[0];
    assert_eq!(
        manifest.as_slice(),
        &[
            GET_CATEGORY_LISTS_TOOL.to_string(),
            GET_KNOWN_PROBLEMS_TOOL.to_string(),
        ]
    );
}

#[tokio::test]
async fn tool_results_are_appended_in_request_order_with_matching_ids() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[
            ("call_a", GET_CATEGORY_LISTS_TOOL),
            ("call_b", GET_KNOWN_PROBLEMS_TOOL),
        ]),
        text_turn("Ticket created."),
    ]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let resolution = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();
    assert_eq!(resolution.result, "Ticket created.");
    assert_eq!(provider.calls(), 2);

    // Both fixed URIs were read, in the order the calls were requested.
    assert_eq!(
        capability.read_log.lock().unwrap().as_slice(),
        &[
            CATEGORY_LISTS_URI.to_string(),
            KNOWN_PROBLEMS_URI.to_string()
        ]
    );

    // The follow-up turn saw: user seed, assistant echo, two tool results.
    let seen = provider.seen.lock().unwrap();
    let (history, _) = &seen[1];
    assert_eq!(history.len(), 4);
    match &history[0] {
        Message::User { content } => assert!(content.contains("problem")),
        other => panic!("expected user seed, got {:?}", other),
    }
    match &history[1] {
        Message::Assistant { tool_calls, .. } => assert_eq!(tool_calls.len(), 2),
        other => panic!("expected assistant echo, got {:?}", other),
    }
    match (&history[2], &history[3]) {
        (
            Message::ToolResult {
                tool_call_id: first,
                ..
            },
            Message::ToolResult {
                tool_call_id: second,
                ..
            },
        ) => {
            assert_eq!(first, "call_a");
            assert_eq!(second, "call_b");
        }
        other => panic!("expected two tool results, got {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_call_arguments_feed_back_as_error_result() {
    let mut broken_turn = tool_turn(&[
        ("call_a", GET_CATEGORY_LISTS_TOOL),
        ("call_b", "create-ticket-tool"),
    ]);
    broken_turn.tool_calls[1].argument_error =
        Some("malformed tool arguments: expected value".to_string());

    let provider = ScriptedProvider::new(vec![broken_turn, text_turn("Ticket created.")]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let resolution = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    // The broken call does not abort the request; its result carries the
    // failure and the conversation continues.
    assert_eq!(resolution.result, "Ticket created.");
    assert_eq!(provider.calls(), 2);

    let seen = provider.seen.lock().unwrap();
    let (history, _) = &seen[1];
    match &history[3] {
        Message::ToolResult {
            tool_call_id,
            content,
        } => {
            assert_eq!(tool_call_id, "call_b");
            assert!(content.contains("malformed tool arguments"));
        }
        other => panic!("expected tool result for the broken call, got {:?}", other),
    }
}

#[tokio::test]
async fn loop_is_capped_at_three_adapter_turns() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[("c1", GET_CATEGORY_LISTS_TOOL)]),
        tool_turn(&[("c2", GET_KNOWN_PROBLEMS_TOOL)]),
        // Still asking for tools on the last allowed turn.
        tool_turn(&[("c3", GET_CATEGORY_LISTS_TOOL)]),
        // Never reached.
        text_turn("should not appear"),
    ]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let resolution = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem")
        .await
        .unwrap();

    assert_eq!(provider.calls(), 3);
    // The third turn's pending calls are not dispatched.
    assert_eq!(capability.read_log.lock().unwrap().len(), 2);
    assert_eq!(resolution.result, FALLBACK_RESULT);
}

#[tokio::test]
async fn adapter_transport_failure_is_fatal() {
    // Empty script: the very first send_turn fails.
    let provider = ScriptedProvider::new(vec![]);
    let capability = Arc::new(MockCapability::default());
    let dispatcher = ToolDispatcher::new(capability.clone(), Arc::new(JsonDecoder));

    let result = run_resolution(&provider, capability.as_ref(), &dispatcher, "problem").await;

    assert!(matches!(result, Err(TriageError::Orchestration(_))));
}
