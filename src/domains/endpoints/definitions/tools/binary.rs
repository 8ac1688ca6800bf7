//! Text to 8-bit binary endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

use super::Action;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BinaryParams {
    /// Text to encode, or space separated binary groups to decode.
    pub text: Option<String>,

    #[serde(default)]
    pub action: Action,
}

pub struct BinaryTool;

fn groups(binary: &str) -> Vec<Value> {
    binary
        .split_whitespace()
        .map(|group| {
            json!({
                "binary": group,
                "decimal": u32::from_str_radix(group, 2).ok(),
            })
        })
        .collect()
}

/// Encode each byte of the UTF-8 text as an 8-bit group.
fn encode(text: &str) -> String {
    text.bytes().map(|b| format!("{:08b}", b)).collect::<Vec<_>>().join(" ")
}

fn decode(binary: &str) -> Option<String> {
    let bytes = binary
        .split_whitespace()
        .map(|group| u8::from_str_radix(group, 2).ok())
        .collect::<Option<Vec<u8>>>()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl Endpoint for BinaryTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "binary";
    const DESCRIPTION: &'static str = "Convert text to 8-bit binary groups and back";
    type Params = BinaryParams;

    async fn execute(&self, params: BinaryParams) -> Result<HandlerOutcome, EndpointError> {
        let text = required(params.text.as_deref(), "Text parameter required")?;

        match params.action {
            Action::Encode => {
                let binary = encode(text);
                let bytes = text.len();
                Ok(HandlerOutcome::success(json!({
                    "action": "encode",
                    "original": text,
                    "binary": binary,
                    "bits": bytes * 8,
                    "bytes": bytes,
                    "groups": groups(&binary),
                })))
            }
            Action::Decode => {
                let Some(ascii) = decode(text) else {
                    return Ok(Failure::invalid_input("Invalid binary string")
                        .with_suggestion("Use space separated groups of up to 8 bits, e.g. 01101000 01101001")
                        .into());
                };
                Ok(HandlerOutcome::success(json!({
                    "action": "decode",
                    "original": text,
                    "ascii": ascii,
                    "valid": true,
                    "groups": groups(text),
                })))
            }
        }
    }
}
