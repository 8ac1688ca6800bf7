//! JSON document validation endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct JsonParams {
    /// JSON text to validate.
    pub json: Option<String>,
}

pub struct JsonValidator;

/// Nesting depth; scalars are 0, `{}` and `[]` are 1.
pub fn depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Endpoint for JsonValidator {
    const CATEGORY: &'static str = "validator";
    const NAME: &'static str = "json";
    const DESCRIPTION: &'static str = "Validate and pretty-print a JSON document";
    type Params = JsonParams;

    async fn execute(&self, params: JsonParams) -> Result<HandlerOutcome, EndpointError> {
        let raw = required(params.json.as_deref(), "JSON parameter required")?;

        let parsed: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                return Ok(Failure::invalid_input(format!("Invalid JSON: {}", e))
                    .with_detail("valid", false)
                    .with_detail("line", e.line())
                    .with_detail("column", e.column())
                    .into());
            }
        };

        let keys_count = match &parsed {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        };

        let formatted = serde_json::to_string_pretty(&parsed)
            .map_err(|e| EndpointError::execution_failed(format!("Could not format JSON: {}", e)))?;

        Ok(HandlerOutcome::success(json!({
            "valid": true,
            "size_bytes": raw.len(),
            "type": type_name(&parsed),
            "keys_count": keys_count,
            "depth": depth(&parsed),
            "formatted": formatted,
        })))
    }
}
