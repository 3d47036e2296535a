//! # TriageLLM
//!
//! TriageLLM is a Rust toolkit for LLM-driven problem triage: a caller
//! submits a free-text problem description and receives an automated
//! resolution. The text is handed to a large-language-model provider, which
//! may request invocation of external tools and resources — listing the
//! category lists on a tracking board, checking a knowledge base of known
//! problems, filing a tracking ticket — before producing its final answer.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Provider Selection**: [`ProblemResolver`] iterates a configured
//!   priority list of providers, probes liveness, and delegates the whole
//!   orchestration to the first live one
//! * **Provider Flexibility**: the [`ClientWrapper`] trait is implemented
//!   for OpenAI and Anthropic Claude, each translating its native tool-call
//!   representation into one canonical invocation shape
//! * **Tool Routing**: [`ToolDispatcher`] resolves canonical tool names to
//!   built-in resource reads, the built-in ticket-creation call, or a
//!   pass-through call to the capability server — always producing a result
//!   the conversation can continue with
//! * **Capability Server Access**: the [`CapabilityClient`] trait plus an
//!   MCP HTTP relay implementation ([`McpHttpClient`]) shared safely across
//!   concurrent requests
//!
//! ## Resolving a problem
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use triagellm::{JsonDecoder, ProblemResolver, TriageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     triagellm::init_logger();
//!
//!     let config = TriageConfig::from_env()?;
//!     let resolver = ProblemResolver::from_config(&config, Arc::new(JsonDecoder));
//!
//!     let resolution = resolver
//!         .resolve("The VPN connection drops every hour for the sales team")
//!         .await?;
//!     println!("{}", resolution.result);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom wiring
//!
//! Every seam is a trait: plug in your own [`CapabilityClient`] transport,
//! [`PayloadDecoder`] for the capability server's compact payload format, or
//! [`ClientWrapper`] for an additional vendor, and assemble the resolver
//! with [`ProblemResolver::new`] + `register_provider`.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// ```rust
/// triagellm::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `triagellm` module.
pub mod triagellm;

// Re-exporting key items for easier external access.
pub use crate::triagellm::capability;
pub use crate::triagellm::capability::{
    CapabilityClient, McpHttpClient, ResourceChunk, ResourceContents,
};
pub use crate::triagellm::client_wrapper;
pub use crate::triagellm::client_wrapper::{
    ClientWrapper, LivenessReport, Message, ProviderTurn, ToolCall, ToolDefinition,
};
pub use crate::triagellm::clients;
pub use crate::triagellm::config::TriageConfig;
pub use crate::triagellm::decode::{JsonDecoder, PayloadDecoder};
pub use crate::triagellm::dispatcher;
pub use crate::triagellm::dispatcher::ToolDispatcher;
pub use crate::triagellm::error::TriageError;
pub use crate::triagellm::orchestrator;
pub use crate::triagellm::orchestrator::{run_resolution, Resolution, FALLBACK_RESULT};
pub use crate::triagellm::resolver::{parse_priority, ProblemResolver, ProviderId};
