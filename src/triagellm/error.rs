//! Error taxonomy for the triage core.
//!
//! Three failure classes reach the caller of
//! [`ProblemResolver::resolve`](crate::triagellm::resolver::ProblemResolver::resolve):
//!
//! * [`TriageError::Configuration`] — the priority list or process
//!   configuration is invalid. Fatal, surfaced immediately, never retried.
//! * [`TriageError::NoLiveProvider`] — every configured provider failed its
//!   liveness probe. Individual probe failures are recovered locally (the
//!   selector moves on to the next provider) and only become visible when
//!   the whole list is exhausted.
//! * [`TriageError::Orchestration`] — the chosen provider's API call failed
//!   after it had been selected as live. Fatal for that request; there is no
//!   failover to the next-priority provider once orchestration has started.
//!
//! Tool and resource dispatch failures never appear here: the dispatcher
//! converts them into `{"error": ...}` payloads that are fed back into the
//! conversation as tool results.

use thiserror::Error;

/// Errors surfaced by the problem-triage core.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The process configuration (priority list, env variables, provider
    /// registration) is missing or malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Every provider in the configured priority list probed as not alive.
    #[error("no live LLM provider available")]
    NoLiveProvider,

    /// A provider API call failed after the provider had been selected.
    #[error("orchestration failed: {0}")]
    Orchestration(String),
}
