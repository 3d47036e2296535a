//! Provider Selector: picks the first live provider from a configured
//! priority list and delegates the whole orchestration to it.
//!
//! Selection is a strict short-circuit, not a best-of: providers are probed
//! in priority order and the first one reporting alive handles the request;
//! later entries are never probed. Liveness is checked once at selection
//! time — a transport failure after selection is fatal for the request and
//! does not fail over to the next-priority provider.
//!
//! New vendors are added as a [`ProviderId`] variant plus a registered
//! [`ClientWrapper`], not by modifying the selection logic.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::triagellm::capability::CapabilityClient;
use crate::triagellm::client_wrapper::ClientWrapper;
use crate::triagellm::clients::claude::ClaudeClient;
use crate::triagellm::clients::openai::OpenAIClient;
use crate::triagellm::config::TriageConfig;
use crate::triagellm::decode::PayloadDecoder;
use crate::triagellm::dispatcher::ToolDispatcher;
use crate::triagellm::error::TriageError;
use crate::triagellm::orchestrator::{run_resolution, Resolution};

/// Configuration and selection key for one LLM vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
}

impl ProviderId {
    /// The identifier used in the priority configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" => Ok(ProviderId::Anthropic),
            other => Err(TriageError::Configuration(format!(
                "unknown LLM provider '{}' in priority list",
                other
            ))),
        }
    }
}

/// Parse a comma-separated priority string into an ordered provider list.
///
/// Entries are trimmed; an empty list, empty entries, or unknown
/// identifiers are configuration errors.
pub fn parse_priority(priority: &str) -> Result<Vec<ProviderId>, TriageError> {
    if priority.trim().is_empty() {
        return Err(TriageError::Configuration(
            "LLM priority list is empty".to_string(),
        ));
    }
    priority
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(TriageError::Configuration(
                    "LLM priority list contains an empty entry".to_string(),
                ));
            }
            entry.parse()
        })
        .collect()
}

/// Entry point of the triage core: resolves free-text problem reports by
/// delegating to the first live provider in priority order.
pub struct ProblemResolver {
    priority: Vec<ProviderId>,
    providers: Vec<(ProviderId, Arc<dyn ClientWrapper>)>,
    capability: Arc<dyn CapabilityClient>,
    dispatcher: ToolDispatcher,
}

impl ProblemResolver {
    /// Create a resolver with the given priority order, capability
    /// connection, and payload decoder. Providers are attached with
    /// [`register_provider`](Self::register_provider).
    pub fn new(
        priority: Vec<ProviderId>,
        capability: Arc<dyn CapabilityClient>,
        decoder: Arc<dyn PayloadDecoder>,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(Arc::clone(&capability), decoder);
        Self {
            priority,
            providers: Vec::new(),
            capability,
            dispatcher,
        }
    }

    /// Wire a resolver from a validated [`TriageConfig`]: one adapter per
    /// supported vendor over the shared capability connection.
    pub fn from_config(config: &TriageConfig, decoder: Arc<dyn PayloadDecoder>) -> Self {
        let capability: Arc<dyn CapabilityClient> = Arc::new(
            crate::triagellm::capability::McpHttpClient::new(config.mcp_server_uri.clone()),
        );
        Self::new(config.provider_priority.clone(), capability, decoder)
            .register_provider(
                ProviderId::OpenAi,
                Arc::new(OpenAIClient::new(&config.openai_api_key)),
            )
            .register_provider(
                ProviderId::Anthropic,
                Arc::new(ClaudeClient::new(&config.anthropic_api_key)),
            )
    }

    /// Attach the adapter that handles `id` (builder pattern).
    pub fn register_provider(
        mut self,
        id: ProviderId,
        client: Arc<dyn ClientWrapper>,
    ) -> Self {
        self.providers.push((id, client));
        self
    }

    fn provider(&self, id: ProviderId) -> Option<&Arc<dyn ClientWrapper>> {
        self.providers
            .iter()
            .find(|(registered, _)| *registered == id)
            .map(|(_, client)| client)
    }

    /// Resolve one problem report.
    ///
    /// Probes each configured provider in priority order and delegates the
    /// orchestration to the first live one. Fails with
    /// [`TriageError::NoLiveProvider`] when the whole list is exhausted.
    pub async fn resolve(&self, problem: &str) -> Result<Resolution, TriageError> {
        if self.priority.is_empty() {
            return Err(TriageError::Configuration(
                "LLM priority list is empty".to_string(),
            ));
        }

        for id in &self.priority {
            let client = self.provider(*id).ok_or_else(|| {
                TriageError::Configuration(format!(
                    "no adapter registered for provider '{}'",
                    id
                ))
            })?;

            let report = client.ping().await;
            if report.alive {
                log::info!(
                    "triagellm::resolver::resolve(...): provider '{}' alive in {} ms, delegating",
                    id,
                    report.latency_ms
                );
                return run_resolution(
                    client.as_ref(),
                    self.capability.as_ref(),
                    &self.dispatcher,
                    problem,
                )
                .await;
            }

            log::warn!(
                "triagellm::resolver::resolve(...): provider '{}' not alive after {} ms: {}",
                id,
                report.latency_ms,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }

        Err(TriageError::NoLiveProvider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_priority_trims_and_orders() {
        let parsed = parse_priority(" openai , anthropic ").unwrap();
        assert_eq!(parsed, vec![ProviderId::OpenAi, ProviderId::Anthropic]);
    }

    #[test]
    fn parse_priority_rejects_empty_string() {
        assert!(matches!(
            parse_priority("   "),
            Err(TriageError::Configuration(_))
        ));
    }

    #[test]
    fn parse_priority_rejects_empty_entries() {
        assert!(matches!(
            parse_priority("openai,,anthropic"),
            Err(TriageError::Configuration(_))
        ));
    }

    #[test]
    fn parse_priority_rejects_unknown_identifiers() {
        assert!(matches!(
            parse_priority("openai,mistral"),
            Err(TriageError::Configuration(_))
        ));
    }

    #[test]
    fn provider_id_round_trips_through_display() {
        for id in [ProviderId::OpenAi, ProviderId::Anthropic] {
            assert_eq!(id.to_string().parse::<ProviderId>().unwrap(), id);
        }
    }
}
