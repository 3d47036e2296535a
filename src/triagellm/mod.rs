// src/triagellm/mod.rs

pub mod capability;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod resolver;

// Export the entry point directly so callers reach it as
// triagellm::ProblemResolver instead of triagellm::resolver::ProblemResolver.
pub use resolver::ProblemResolver;
