//! Declarative proxy endpoints.
//!
//! A proxy endpoint forwards a fixed set of query parameters to one upstream
//! path. The same [`ProxySpec`] describes both the built-in proxy table and
//! the `*.toml` manifests found in the endpoints directory:
//!
//! ```toml
//! upstream = "/ytdown"
//! description = "Download YouTube audio or video"
//! params = ["url", "format"]
//! required = ["url"]
//! pick = ["title", "downloadURL"]
//!
//! [defaults]
//! format = "mp3"
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::error::EndpointError;
use super::handlers::EndpointHandler;
use super::outcome::{Failure, HandlerOutcome};
use super::query::QueryParams;
use crate::domains::upstream::UpstreamClient;

// ============================================================================
// Proxy definition
// ============================================================================

/// Description of one proxied endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxySpec {
    /// Upstream path, e.g. `/chatgpt`.
    pub upstream: String,

    #[serde(default)]
    pub description: String,

    /// Query parameters forwarded upstream, in order.
    #[serde(default)]
    pub params: Vec<String>,

    /// Parameters that must be present and non-blank.
    #[serde(default)]
    pub required: Vec<String>,

    /// Values used when a forwarded parameter is absent.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// When non-empty, only these fields of a successful result are kept.
    #[serde(default)]
    pub pick: Vec<String>,
}

impl ProxySpec {
    /// A spec forwarding `params`, with the first one required.
    pub fn new(upstream: &str, description: &str, params: &[&str]) -> Self {
        Self {
            upstream: upstream.to_string(),
            description: description.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            required: params.first().map(|p| vec![p.to_string()]).unwrap_or_default(),
            defaults: BTreeMap::new(),
            pick: Vec::new(),
        }
    }

    pub fn with_default(mut self, param: &str, value: &str) -> Self {
        self.defaults.insert(param.to_string(), value.to_string());
        self
    }

    pub fn with_pick(mut self, fields: &[&str]) -> Self {
        self.pick = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, EndpointError> {
        let raw = std::fs::read_to_string(path).map_err(|e| EndpointError::manifest(path, e.to_string()))?;
        let spec: Self = toml::from_str(&raw).map_err(|e| EndpointError::manifest(path, e.to_string()))?;
        spec.validate().map_err(|reason| EndpointError::manifest(path, reason))?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), String> {
        if !self.upstream.starts_with('/') {
            return Err(format!("upstream path must start with '/': {:?}", self.upstream));
        }
        if let Some(missing) = self.required.iter().find(|r| !self.params.contains(r)) {
            return Err(format!("required parameter {:?} is not forwarded", missing));
        }
        Ok(())
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Handler that forwards a request to the upstream API.
pub struct ProxyEndpoint {
    spec: ProxySpec,
    upstream: Arc<UpstreamClient>,
}

impl ProxyEndpoint {
    pub fn new(spec: ProxySpec, upstream: Arc<UpstreamClient>) -> Self {
        Self { spec, upstream }
    }

    pub fn spec(&self) -> &ProxySpec {
        &self.spec
    }

    fn forwarded_params(&self, query: &QueryParams) -> Vec<(String, String)> {
        self.spec
            .params
            .iter()
            .filter_map(|name| {
                query
                    .get_non_empty(name)
                    .or_else(|| self.spec.defaults.get(name).map(String::as_str))
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    }

    fn pick_fields(&self, outcome: HandlerOutcome) -> HandlerOutcome {
        match outcome {
            HandlerOutcome::Success(payload) if !self.spec.pick.is_empty() => {
                let picked: Map<String, Value> = self
                    .spec
                    .pick
                    .iter()
                    .filter_map(|field| payload.get(field).map(|v| (field.clone(), v.clone())))
                    .collect();
                HandlerOutcome::Success(picked)
            }
            other => other,
        }
    }
}

#[async_trait]
impl EndpointHandler for ProxyEndpoint {
    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameters(&self) -> Value {
        let params: Map<String, Value> = self
            .spec
            .params
            .iter()
            .map(|name| {
                let mut info = json!({
                    "type": "string",
                    "required": self.spec.required.contains(name),
                });
                if let Some(default) = self.spec.defaults.get(name) {
                    info["default"] = json!(default);
                }
                (name.clone(), info)
            })
            .collect();
        Value::Object(params)
    }

    async fn handle(&self, query: &QueryParams) -> Result<HandlerOutcome, EndpointError> {
        if let Some(missing) = self.spec.required.iter().find(|r| query.get_non_empty(r).is_none()) {
            return Ok(Failure::invalid_input(format!("{} parameter required", missing))
                .with_suggestion(format!("Add ?{}=... to the request", missing))
                .into());
        }

        let params = self.forwarded_params(query);
        let outcome = self.upstream.call(&self.spec.upstream, &params).await;
        Ok(self.pick_fields(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UpstreamConfig;
    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    async fn spawn_upstream() -> String {
        let app = Router::new().route(
            "/ytdown",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                axum::Json(json!({
                    "success": true,
                    "title": "Song",
                    "downloadURL": format!("https://cdn.example/{}.{}", q["url"].len(), q["format"]),
                    "internal": "dropped"
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn ytdown_spec() -> ProxySpec {
        ProxySpec::new("/ytdown", "Download YouTube media", &["url", "format"])
            .with_default("format", "mp3")
            .with_pick(&["title", "downloadURL"])
    }

    fn upstream(base_url: String) -> Arc<UpstreamClient> {
        Arc::new(
            UpstreamClient::new(&UpstreamConfig {
                base_url,
                ..UpstreamConfig::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_required_param() {
        let endpoint = ProxyEndpoint::new(ytdown_spec(), upstream("http://127.0.0.1:9".to_string()));
        let outcome = endpoint.handle(&QueryParams::new()).await.unwrap();
        let HandlerOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.message, "url parameter required");
        assert_eq!(failure.status, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_defaults_and_pick() {
        let endpoint = ProxyEndpoint::new(ytdown_spec(), upstream(spawn_upstream().await));
        let query = QueryParams::from_pairs([("url", "abc")]);
        let outcome = endpoint.handle(&query).await.unwrap();

        let payload = outcome.payload();
        assert_eq!(payload["title"], "Song");
        assert_eq!(payload["downloadURL"], "https://cdn.example/3.mp3");
        assert!(!payload.contains_key("internal"));
    }

    #[test]
    fn test_forwarded_params_skip_absent() {
        let spec = ProxySpec::new("/aivideo", "", &["prompt", "type"]);
        let endpoint = ProxyEndpoint::new(spec, upstream("http://127.0.0.1:9".to_string()));
        let query = QueryParams::from_pairs([("prompt", "cat"), ("other", "x")]);
        assert_eq!(
            endpoint.forwarded_params(&query),
            vec![("prompt".to_string(), "cat".to_string())]
        );
    }

    #[test]
    fn test_parameters_describe_defaults() {
        let endpoint = ProxyEndpoint::new(ytdown_spec(), upstream("http://127.0.0.1:9".to_string()));
        let params = endpoint.parameters();
        assert_eq!(params["url"]["required"], true);
        assert_eq!(params["format"]["default"], "mp3");
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatbot.toml");
        std::fs::write(&path, "upstream = \"/chatgpt\"\nparams = [\"prompt\"]\nrequired = [\"prompt\"]\n").unwrap();
        let spec = ProxySpec::load(&path).unwrap();
        assert_eq!(spec.upstream, "/chatgpt");
        assert_eq!(spec.required, vec!["prompt"]);
    }

    #[test]
    fn test_load_manifest_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();

        let relative = dir.path().join("relative.toml");
        std::fs::write(&relative, "upstream = \"chatgpt\"\n").unwrap();
        assert!(matches!(ProxySpec::load(&relative), Err(EndpointError::Manifest { .. })));

        let unknown = dir.path().join("unknown.toml");
        std::fs::write(&unknown, "upstream = \"/x\"\nbogus = 1\n").unwrap();
        assert!(ProxySpec::load(&unknown).is_err());

        let dangling = dir.path().join("dangling.toml");
        std::fs::write(&dangling, "upstream = \"/x\"\nrequired = [\"q\"]\n").unwrap();
        assert!(ProxySpec::load(&dangling).is_err());
    }
}
