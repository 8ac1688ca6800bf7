//! HTTP client for the upstream ("Elite") API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{self, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::UpstreamError;
use crate::core::config::UpstreamConfig;
use crate::domains::endpoints::HandlerOutcome;

const ACCEPT: &str = "application/json, image/*;q=0.9, */*;q=0.8";

/// Largest upstream error body kept in failure details.
const MAX_ERROR_BODY: usize = 512;

/// Shared, cloneable upstream client.
///
/// Every proxy endpoint makes exactly one GET through [`call`](Self::call).
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::Client(format!("invalid base URL {:?}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let referer = HeaderValue::from_str(&config.referer)
            .map_err(|e| UpstreamError::Client(format!("invalid referer: {}", e)))?;
        headers.insert(header::REFERER, referer);

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for an endpoint suffix such as `/chatgpt`.
    pub fn endpoint_url(&self, suffix: &str, params: &[(String, String)]) -> Result<Url, UpstreamError> {
        let suffix = suffix.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", self.base_url, suffix))
            .map_err(|e| UpstreamError::Request(format!("invalid endpoint {:?}: {}", suffix, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Call the upstream; all failures are folded into a `Failure` outcome.
    pub async fn call(&self, suffix: &str, params: &[(String, String)]) -> HandlerOutcome {
        match self.fetch(suffix, params).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Upstream call to {} failed: {}", suffix, e);
                e.into_failure().into()
            }
        }
    }

    /// Perform one upstream GET and interpret the response by content type.
    #[instrument(skip(self, params), fields(base = %self.base_url))]
    pub async fn fetch(&self, suffix: &str, params: &[(String, String)]) -> Result<HandlerOutcome, UpstreamError> {
        let url = self.endpoint_url(suffix, params)?;
        debug!("Fetching {}", url.path());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty()).map(truncate_body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let essence = media_type_essence(&content_type);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        if let Some(format) = essence.strip_prefix("image/") {
            return Ok(image_outcome(&essence, format, &bytes));
        }

        if essence == "application/json" || essence.ends_with("+json") {
            let value: Value =
                serde_json::from_slice(&bytes).map_err(|e| UpstreamError::BadResponse(e.to_string()))?;
            return Ok(json_outcome(value));
        }

        // Some upstream routes send JSON under a text content type.
        let text = String::from_utf8_lossy(&bytes).into_owned();
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => Ok(json_outcome(value)),
            _ => Ok(HandlerOutcome::success(json!({
                "content": text,
                "content_type": content_type,
            }))),
        }
    }
}

fn json_outcome(value: Value) -> HandlerOutcome {
    match value {
        value @ Value::Object(_) => HandlerOutcome::from_value(value),
        other => HandlerOutcome::success(other),
    }
}

fn image_outcome(mime: &str, format: &str, bytes: &[u8]) -> HandlerOutcome {
    HandlerOutcome::success(json!({
        "image": format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        "format": format,
        "size": bytes.len(),
    }))
}

/// `image/png; charset=binary` -> `image/png`
fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::collections::HashMap;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/chatgpt",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    axum::Json(json!({ "success": true, "reply": q.get("prompt") }))
                }),
            )
            .route("/refuse", get(|| async { axum::Json(json!({ "success": false, "error": "bad url" })) }))
            .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route(
                "/logo",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']) }),
            )
            .route("/list", get(|| async { axum::Json(json!([1, 2, 3])) }))
            .route("/plain", get(|| async { "hello" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String, timeout_ms: u64) -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig {
            base_url,
            timeout_ms,
            ..UpstreamConfig::default()
        })
        .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let client = client_for("https://example.com/v1/".to_string(), 1000);
        let url = client.endpoint_url("/chatgpt", &params(&[("prompt", "hi there")])).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/chatgpt?prompt=hi+there");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = UpstreamClient::new(&UpstreamConfig {
            base_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_REQUEST_FAILED");
    }

    #[tokio::test]
    async fn test_json_success_is_forwarded() {
        let client = client_for(spawn_upstream().await, 2000);
        let outcome = client.call("/chatgpt", &params(&[("prompt", "hello")])).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.payload()["reply"], "hello");
    }

    #[tokio::test]
    async fn test_upstream_reported_failure() {
        let client = client_for(spawn_upstream().await, 2000);
        let HandlerOutcome::Failure(failure) = client.call("/refuse", &[]).await else {
            panic!("expected failure");
        };
        assert_eq!(failure.message, "bad url");
    }

    #[tokio::test]
    async fn test_http_500_becomes_failure() {
        let client = client_for(spawn_upstream().await, 2000);
        let HandlerOutcome::Failure(failure) = client.call("/broken", &[]).await else {
            panic!("expected failure");
        };
        assert_eq!(failure.code, "UPSTREAM_STATUS");
        assert_eq!(failure.status, StatusCode::BAD_GATEWAY);
        assert_eq!(failure.details["upstream_status"], 500);
    }

    #[tokio::test]
    async fn test_image_becomes_data_url() {
        let client = client_for(spawn_upstream().await, 2000);
        let outcome = client.call("/logo", &[]).await;
        let payload = outcome.payload();
        assert_eq!(payload["format"], "png");
        assert_eq!(payload["size"], 4);
        assert_eq!(payload["image"], "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_non_object_json_is_wrapped() {
        let client = client_for(spawn_upstream().await, 2000);
        let outcome = client.call("/list", &[]).await;
        assert_eq!(outcome.payload()["data"], json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_plain_text_body() {
        let client = client_for(spawn_upstream().await, 2000);
        let outcome = client.call("/plain", &[]).await;
        assert_eq!(outcome.payload()["content"], "hello");
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let client = client_for(spawn_upstream().await, 200);
        let HandlerOutcome::Failure(failure) = client.call("/slow", &[]).await else {
            panic!("expected failure");
        };
        assert_eq!(failure.code, "UPSTREAM_TIMEOUT");
        assert_eq!(failure.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr), 2000);
        let outcome = client.call("/chatgpt", &[]).await;
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_media_type_essence() {
        assert_eq!(media_type_essence("Image/PNG; charset=binary"), "image/png");
        assert_eq!(media_type_essence(""), "");
    }
}
