//! Process configuration for the triage core.
//!
//! Mirrors the deployment surface: one capability-server URI, one API key
//! per vendor, and the provider priority list. [`TriageConfig::from_env`]
//! validates everything up front so a misconfigured process fails at
//! startup instead of on the first request.

use std::env;

use crate::triagellm::error::TriageError;
use crate::triagellm::resolver::{parse_priority, ProviderId};

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Endpoint of the MCP-style capability server.
    pub mcp_server_uri: String,
    /// API key for the OpenAI adapter.
    pub openai_api_key: String,
    /// API key for the Anthropic adapter.
    pub anthropic_api_key: String,
    /// Ordered provider priority list.
    pub provider_priority: Vec<ProviderId>,
}

impl TriageConfig {
    /// Load and validate configuration from the environment.
    ///
    /// Reads `MCP_SERVER_URI`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, and
    /// `LLM_PRIORITY`; any missing or empty variable is a
    /// [`TriageError::Configuration`].
    pub fn from_env() -> Result<Self, TriageError> {
        Ok(Self {
            mcp_server_uri: require_env("MCP_SERVER_URI")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            provider_priority: parse_priority(&require_env("LLM_PRIORITY")?)?,
        })
    }
}

fn require_env(name: &str) -> Result<String, TriageError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TriageError::Configuration(format!(
            "required environment variable {} is not set",
            name
        ))),
    }
}
