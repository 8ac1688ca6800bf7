//! URL validation endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

const VALID_SCHEMES: &[&str] = &["http", "https", "ftp"];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UrlParams {
    /// URL to validate; must include the scheme to count as valid.
    pub url: Option<String>,
}

pub struct UrlValidator;

#[async_trait]
impl Endpoint for UrlValidator {
    const CATEGORY: &'static str = "validator";
    const NAME: &'static str = "url";
    const DESCRIPTION: &'static str = "Validate a URL and split it into components";
    type Params = UrlParams;

    async fn execute(&self, params: UrlParams) -> Result<HandlerOutcome, EndpointError> {
        let raw = required(params.url.as_deref(), "URL parameter required")?.trim();
        let has_scheme = raw.contains("://");
        let candidate = if has_scheme {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };

        let Ok(parsed) = Url::parse(&candidate) else {
            return Ok(Failure::invalid_input("URL could not be parsed")
                .with_detail("url", raw)
                .with_detail("valid", false)
                .into());
        };

        let host = parsed.host_str().unwrap_or_default().to_string();
        let labels: Vec<&str> = host.split('.').collect();
        let subdomain = if labels.len() > 2 {
            labels[..labels.len() - 2].join(".")
        } else {
            "none".to_string()
        };
        let valid = has_scheme
            && VALID_SCHEMES.contains(&parsed.scheme())
            && !host.is_empty()
            && (host.contains('.') || host == "localhost");
        let port = parsed
            .port()
            .map(|p| json!(p))
            .unwrap_or_else(|| json!("default"));

        Ok(HandlerOutcome::success(json!({
            "url": raw,
            "valid": valid,
            "details": {
                "protocol": format!("{}:", parsed.scheme()),
                "hostname": host,
                "path": parsed.path(),
                "query": parsed.query(),
                "is_https": parsed.scheme() == "https",
                "port": port,
            },
            "components": {
                "scheme": parsed.scheme(),
                "domain": host,
                "tld": labels.last().copied().unwrap_or_default(),
                "subdomain": subdomain,
            },
        })))
    }
}
