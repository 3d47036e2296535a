//! Capability server boundary.
//!
//! The capability server is the external MCP-style service that exposes
//! resources (read-only data) and tools (side-effecting actions) to the
//! orchestrator. This module defines the [`CapabilityClient`] trait the rest
//! of the crate consumes, plus [`McpHttpClient`], a reqwest-backed
//! implementation against an MCP HTTP relay.
//!
//! One capability connection is shared by every concurrent request. The
//! client is stateless over a pooled `reqwest::Client`, so concurrent
//! outstanding calls are safe; each call is independent and carries no
//! session affinity.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use thiserror::Error;

use crate::triagellm::client_wrapper::ToolDefinition;

/// One chunk of a resource read response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceChunk {
    /// Compact-encoded payload text; decoded by the external
    /// [`PayloadDecoder`](crate::triagellm::decode::PayloadDecoder).
    pub text: String,
}

/// Response shape of a resource read.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceContents {
    pub contents: Vec<ResourceChunk>,
}

/// Errors produced by [`McpHttpClient`] when the relay misbehaves.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The relay answered with a non-success HTTP status.
    #[error("capability server returned status: {0}")]
    Protocol(String),
}

/// Connection to the external tool/resource server.
#[async_trait]
pub trait CapabilityClient: Send + Sync {
    /// List the tools the capability server advertises.
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, Box<dyn Error + Send + Sync>>;

    /// Read the resource registered at `uri`.
    async fn read_resource(
        &self,
        uri: &str,
    ) -> Result<ResourceContents, Box<dyn Error + Send + Sync>>;

    /// Invoke a named tool with the given argument mapping.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>>;
}

/// HTTP client for a remote MCP relay.
///
/// Endpoints:
/// - `GET  {endpoint}/tools` — tool metadata listing
/// - `POST {endpoint}/resources/read` — read a resource by URI
/// - `POST {endpoint}/execute` — execute a tool with parameters
pub struct McpHttpClient {
    endpoint: String,
    client: reqwest::Client,
}

impl McpHttpClient {
    /// Create a client against the given relay endpoint with a 30 second
    /// request timeout.
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Override the default request timeout for subsequent HTTP calls.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        self
    }

    /// The relay endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CapabilityClient for McpHttpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .get(format!("{}/tools", self.endpoint))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Box::new(CapabilityError::Protocol(
                response.status().to_string(),
            )));
        }

        let tools: Vec<ToolDefinition> = response.json().await?;
        Ok(tools)
    }

    async fn read_resource(
        &self,
        uri: &str,
    ) -> Result<ResourceContents, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(format!("{}/resources/read", self.endpoint))
            .json(&serde_json::json!({ "uri": uri }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Box::new(CapabilityError::Protocol(
                response.status().to_string(),
            )));
        }

        let contents: ResourceContents = response.json().await?;
        Ok(contents)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(format!("{}/execute", self.endpoint))
            .json(&serde_json::json!({
                "tool": name,
                "parameters": Value::Object(arguments)
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Box::new(CapabilityError::Protocol(
                response.status().to_string(),
            )));
        }

        let result: Value = response.json().await?;
        Ok(result)
    }
}
