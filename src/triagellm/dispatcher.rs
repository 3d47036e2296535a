//! Tool Dispatcher: maps a canonical tool call to a built-in resource read,
//! the built-in ticket-creation call, or a pass-through call to the
//! capability server.
//!
//! Resolution is an ordered match, first hit wins: the two resource
//! built-ins, then the ticket tool, then the generic fallback. Every path
//! returns a result value — failures are converted to `{"error": ...}`
//! payloads rather than raised, so the orchestration loop can always attach
//! a tool result and let the LLM react to the failure. The dispatcher holds
//! no state of its own; side effects are confined to capability-server
//! calls.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::triagellm::capability::CapabilityClient;
use crate::triagellm::client_wrapper::{ToolCall, ToolDefinition};
use crate::triagellm::decode::PayloadDecoder;

/// Built-in tool that lists the category lists on the tracking board.
pub const GET_CATEGORY_LISTS_TOOL: &str = "get_category_lists";
/// Built-in tool that lists previously resolved known problems.
pub const GET_KNOWN_PROBLEMS_TOOL: &str = "get_known_problems";
/// Ticket-creation tool registered by the capability server.
pub const CREATE_TICKET_TOOL: &str = "create-ticket-tool";

/// Resource URI backing [`GET_CATEGORY_LISTS_TOOL`].
pub const CATEGORY_LISTS_URI: &str = "mcp://categories/lists";
/// Resource URI backing [`GET_KNOWN_PROBLEMS_TOOL`].
pub const KNOWN_PROBLEMS_URI: &str = "mcp://known-problems";

// These identifiers are a private protocol between the orchestrator and the
// capability server and must match what that server registers.

/// Routes canonical tool calls to the capability server.
pub struct ToolDispatcher {
    capability: Arc<dyn CapabilityClient>,
    decoder: Arc<dyn PayloadDecoder>,
}

impl ToolDispatcher {
    pub fn new(capability: Arc<dyn CapabilityClient>, decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self {
            capability,
            decoder,
        }
    }

    /// The two fixed resource-tool descriptors appended to every manifest.
    pub fn builtin_tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_CATEGORY_LISTS_TOOL.to_string(),
                description: "Returns the category lists available on the tracking board"
                    .to_string(),
                input_schema: empty_object_schema(),
            },
            ToolDefinition {
                name: GET_KNOWN_PROBLEMS_TOOL.to_string(),
                description: "Returns the list of previously resolved known problems".to_string(),
                input_schema: empty_object_schema(),
            },
        ]
    }

    /// Dispatch one tool call and normalize its outcome into a result value.
    ///
    /// Never fails: capability-server errors, decode errors, and malformed
    /// arguments all come back as `{"error": message}`.
    pub async fn dispatch(&self, call: &ToolCall) -> Value {
        log::info!(
            "triagellm::dispatcher::dispatch(...): calling tool '{}' with args: {}",
            call.name,
            Value::Object(call.arguments.clone())
        );
        if let Some(message) = &call.argument_error {
            log::error!(
                "triagellm::dispatcher::dispatch(...): tool '{}' arrived with unusable arguments: {}",
                call.name,
                message
            );
            return error_payload(message);
        }
        match call.name.as_str() {
            GET_CATEGORY_LISTS_TOOL => self.read_decoded_resource(CATEGORY_LISTS_URI).await,
            GET_KNOWN_PROBLEMS_TOOL => self.read_decoded_resource(KNOWN_PROBLEMS_URI).await,
            CREATE_TICKET_TOOL => self.create_ticket(&call.arguments).await,
            _ => self.forward(call).await,
        }
    }

    /// Read a fixed resource URI and decode each returned content chunk.
    async fn read_decoded_resource(&self, uri: &str) -> Value {
        let resource = match self.capability.read_resource(uri).await {
            Ok(resource) => resource,
            Err(err) => {
                log::error!(
                    "triagellm::dispatcher::read_decoded_resource(...): error reading '{}': {}",
                    uri,
                    err
                );
                return error_payload(&err.to_string());
            }
        };

        let mut decoded = Vec::with_capacity(resource.contents.len());
        for chunk in &resource.contents {
            match self.decoder.decode(&chunk.text) {
                Ok(value) => decoded.push(value),
                Err(err) => {
                    log::error!(
                        "triagellm::dispatcher::read_decoded_resource(...): decode error for '{}': {}",
                        uri,
                        err
                    );
                    return error_payload(&err.to_string());
                }
            }
        }
        Value::Array(decoded)
    }

    /// Create a tracking ticket after resolving argument aliases.
    ///
    /// The list id is taken from `idList` then `listId`, the title from
    /// `name`, and the description from `desc` then `description` — first
    /// non-empty string wins. Missing or empty values short-circuit without
    /// touching the capability server.
    async fn create_ticket(&self, arguments: &Map<String, Value>) -> Value {
        let list_id = first_string_argument(arguments, &["idList", "listId"]);
        let name = first_string_argument(arguments, &["name"]);
        let description = first_string_argument(arguments, &["desc", "description"]);

        let (list_id, name, description) = match (list_id, name, description) {
            (Some(list_id), Some(name), Some(description)) => (list_id, name, description),
            _ => {
                log::error!(
                    "triagellm::dispatcher::create_ticket(...): missing required parameters in: {}",
                    Value::Object(arguments.clone())
                );
                return error_payload("missing required parameters");
            }
        };

        let mut ticket_arguments = Map::new();
        ticket_arguments.insert("listId".to_string(), Value::String(list_id));
        ticket_arguments.insert("name".to_string(), Value::String(name));
        ticket_arguments.insert("description".to_string(), Value::String(description));

        match self
            .capability
            .call_tool(CREATE_TICKET_TOOL, ticket_arguments)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                log::error!(
                    "triagellm::dispatcher::create_ticket(...): capability call error: {}",
                    err
                );
                error_payload(&err.to_string())
            }
        }
    }

    /// Forward an unrecognized tool call verbatim to the capability server.
    async fn forward(&self, call: &ToolCall) -> Value {
        match self
            .capability
            .call_tool(&call.name, call.arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(err) => {
                log::error!(
                    "triagellm::dispatcher::forward(...): dynamic tool call '{}' error: {}",
                    call.name,
                    err
                );
                error_payload(&err.to_string())
            }
        }
    }
}

fn empty_object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

fn error_payload(message: &str) -> Value {
    json!({ "error": message })
}

/// First key in `keys` whose value is a non-empty string.
fn first_string_argument(arguments: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        arguments
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolution_prefers_first_key() {
        let mut args = Map::new();
        args.insert("idList".to_string(), json!("from-idList"));
        args.insert("listId".to_string(), json!("from-listId"));
        assert_eq!(
            first_string_argument(&args, &["idList", "listId"]),
            Some("from-idList".to_string())
        );
    }

    #[test]
    fn alias_resolution_skips_empty_strings() {
        let mut args = Map::new();
        args.insert("idList".to_string(), json!(""));
        args.insert("listId".to_string(), json!("L2"));
        assert_eq!(
            first_string_argument(&args, &["idList", "listId"]),
            Some("L2".to_string())
        );
    }

    #[test]
    fn alias_resolution_ignores_non_strings() {
        let mut args = Map::new();
        args.insert("name".to_string(), json!(42));
        assert_eq!(first_string_argument(&args, &["name"]), None);
    }

    #[test]
    fn builtin_definitions_cover_both_resource_tools() {
        let names: Vec<String> = ToolDispatcher::builtin_tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![GET_CATEGORY_LISTS_TOOL, GET_KNOWN_PROBLEMS_TOOL]);
    }
}
