//! Vendor specific [`ClientWrapper`](crate::triagellm::client_wrapper::ClientWrapper)
//! implementations.
//!
//! Each submodule offers a concrete adapter that speaks a particular
//! vendor's API while conforming to the uniform triage contract.

pub mod http_pool;

pub mod claude;
pub mod openai;
