//! Base64 encode/decode endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

use super::Action;

// ============================================================================
// Endpoint Parameters
// ============================================================================

/// Parameters for the base64 endpoint.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Base64Params {
    /// Text to encode, or base64 to decode.
    pub text: Option<String>,

    /// `encode` (default) or `decode`.
    #[serde(default)]
    pub action: Action,
}

// ============================================================================
// Endpoint Definition
// ============================================================================

pub struct Base64Tool;

#[async_trait]
impl Endpoint for Base64Tool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "base64";
    const DESCRIPTION: &'static str = "Encode text to base64 or decode base64 back to text";
    type Params = Base64Params;

    async fn execute(&self, params: Base64Params) -> Result<HandlerOutcome, EndpointError> {
        let text = required(params.text.as_deref(), "Text parameter required")?;

        match params.action {
            Action::Encode => Ok(HandlerOutcome::success(json!({
                "action": "encode",
                "original": text,
                "encoded": STANDARD.encode(text.as_bytes()),
            }))),
            Action::Decode => {
                let Ok(bytes) = STANDARD.decode(text.trim()) else {
                    return Ok(Failure::invalid_input("Invalid Base64 string").into());
                };
                Ok(HandlerOutcome::success(json!({
                    "action": "decode",
                    "original": text,
                    "decoded": String::from_utf8_lossy(&bytes),
                })))
            }
        }
    }
}
