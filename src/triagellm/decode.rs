//! Compact payload decoder boundary.
//!
//! Resource responses from the capability server arrive as compact-encoded
//! text chunks. The decoder that turns a chunk into a structured value is an
//! external collaborator consumed opaquely as `decode(text) -> value`; this
//! module only pins down the seam.

use serde_json::Value;
use std::error::Error;

/// Decodes one compact-encoded text chunk into a structured value.
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, text: &str) -> Result<Value, Box<dyn Error + Send + Sync>>;
}

/// Default decoder that treats chunks as plain JSON.
///
/// Deployments whose capability server speaks a different compact format
/// plug in their own [`PayloadDecoder`] instead.
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, text: &str) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let value = serde_json::from_str(text)?;
        Ok(value)
    }
}
