//! Flux text-to-image endpoint.
//!
//! Proxies `/flux` upstream and reshapes an image result into
//! prompt/image_url/format/size_kb/download_url.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};
use crate::domains::upstream::UpstreamClient;

const UPSTREAM_PATH: &str = "/flux";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FluxParams {
    /// Image description.
    pub prompt: Option<String>,
}

pub struct FluxTool {
    upstream: Arc<UpstreamClient>,
}

impl FluxTool {
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        Self { upstream }
    }
}

fn reshape(prompt: &str, outcome: HandlerOutcome) -> HandlerOutcome {
    let HandlerOutcome::Success(payload) = &outcome else {
        return outcome;
    };
    let Some(image) = payload.get("image").and_then(Value::as_str) else {
        return outcome;
    };
    let size = payload.get("size").and_then(Value::as_u64).unwrap_or(0);
    HandlerOutcome::success(json!({
        "prompt": prompt,
        "image_url": image,
        "format": payload.get("format").cloned().unwrap_or(Value::Null),
        "size_kb": (size as f64 / 1024.0).round() as u64,
        "download_url": image,
    }))
}

#[async_trait]
impl Endpoint for FluxTool {
    const CATEGORY: &'static str = "image";
    const NAME: &'static str = "flux";
    const DESCRIPTION: &'static str = "Generate an image from a text prompt with the Flux model";
    type Params = FluxParams;

    async fn execute(&self, params: FluxParams) -> Result<HandlerOutcome, EndpointError> {
        let prompt = required(params.prompt.as_deref(), "Prompt parameter required")?;
        let query = [("prompt".to_string(), prompt.to_string())];
        let outcome = self.upstream.call(UPSTREAM_PATH, &query).await;
        Ok(reshape(prompt, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::endpoints::Failure;

    #[test]
    fn test_reshape_image() {
        let upstream = HandlerOutcome::success(json!({
            "image": "data:image/jpeg;base64,AAAA",
            "format": "jpeg",
            "size": 4096,
        }));
        let outcome = reshape("a cat", upstream);
        let payload = outcome.payload();
        assert_eq!(payload["prompt"], "a cat");
        assert_eq!(payload["size_kb"], 4);
        assert_eq!(payload["image_url"], payload["download_url"]);
        assert_eq!(outcome.image_data_url(), Some("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn test_reshape_passes_through_other_results() {
        let json_result = HandlerOutcome::success(json!({ "url": "https://cdn.example/x.png" }));
        assert_eq!(reshape("p", json_result.clone()), json_result);

        let failure: HandlerOutcome = Failure::invalid_input("nope").into();
        assert_eq!(reshape("p", failure.clone()), failure);
    }
}
