//! HTTP status code reference endpoint.

use async_trait::async_trait;
use http::StatusCode;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

const CATEGORIES: &[&str] = &[
    "Informational",
    "Success",
    "Redirection",
    "Client Error",
    "Server Error",
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpStatusParams {
    /// Look up a single status code.
    pub code: Option<String>,

    /// Filter the listing by category, e.g. `client error`.
    pub category: Option<String>,

    /// Filter the listing by reason phrase or code substring.
    pub search: Option<String>,
}

pub struct HttpStatusTool;

fn category(status: StatusCode) -> &'static str {
    match status.as_u16() / 100 {
        1 => CATEGORIES[0],
        2 => CATEGORIES[1],
        3 => CATEGORIES[2],
        4 => CATEGORIES[3],
        _ => CATEGORIES[4],
    }
}

/// Every status code with a registered reason phrase.
fn known_statuses() -> impl Iterator<Item = (StatusCode, &'static str)> {
    (100u16..600).filter_map(|code| {
        let status = StatusCode::from_u16(code).ok()?;
        status.canonical_reason().map(|reason| (status, reason))
    })
}

fn description(code: u16) -> &'static str {
    match code {
        200 => "Standard response for successful HTTP requests.",
        201 => "Request succeeded and a new resource was created.",
        400 => "Server cannot process request due to client error.",
        401 => "Authentication is required and has failed or not been provided.",
        404 => "Requested resource could not be found.",
        429 => "The client has sent too many requests in a given amount of time.",
        500 => "Generic error message when server encounters unexpected condition.",
        _ => "Standard HTTP status code.",
    }
}

fn causes(code: u16) -> &'static [&'static str] {
    match code {
        400 => &["Malformed request syntax", "Invalid request message framing"],
        404 => &["Wrong URL", "Resource deleted", "Typo in URL"],
        429 => &["Rate limit exceeded", "Burst of automated requests"],
        500 => &["Unhandled exception", "Database connection failed", "Server misconfiguration"],
        _ => &["Various server or client issues"],
    }
}

fn solution(code: u16) -> &'static str {
    match code {
        400 => "Check request syntax and parameters.",
        404 => "Verify URL and resource existence.",
        429 => "Wait for the rate limit window to reset and retry.",
        500 => "Check server logs and application code.",
        _ => "Investigate server or client configuration.",
    }
}

fn lookup(raw: &str) -> HandlerOutcome {
    let status = raw
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .and_then(|status| status.canonical_reason().map(|reason| (status, reason)));

    let Some((status, reason)) = status else {
        return Failure::invalid_input(format!("HTTP status code {} not found", raw))
            .with_suggestion("Use codes between 100-599")
            .into();
    };

    let code = status.as_u16();
    HandlerOutcome::success(json!({
        "code": code,
        "message": reason,
        "category": category(status),
        "description": description(code),
        "common_causes": causes(code),
        "solution": solution(code),
    }))
}

#[async_trait]
impl Endpoint for HttpStatusTool {
    const CATEGORY: &'static str = "web";
    const NAME: &'static str = "http-status";
    const DESCRIPTION: &'static str = "Look up HTTP status codes by code, category or keyword";
    type Params = HttpStatusParams;

    async fn execute(&self, params: HttpStatusParams) -> Result<HandlerOutcome, EndpointError> {
        if let Some(code) = params.code.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(lookup(code));
        }

        let category_filter = params.category.as_deref().map(str::to_lowercase);
        let search = params.search.as_deref().map(str::to_lowercase);

        let statuses: Vec<Value> = known_statuses()
            .filter(|(status, _)| {
                category_filter
                    .as_deref()
                    .is_none_or(|wanted| category(*status).to_lowercase() == wanted)
            })
            .filter(|(status, reason)| {
                search.as_deref().is_none_or(|needle| {
                    reason.to_lowercase().contains(needle) || status.as_str().contains(needle)
                })
            })
            .map(|(status, reason)| {
                json!({
                    "code": status.as_u16(),
                    "message": reason,
                    "category": category(status),
                    "link": format!("https://http.cat/{}", status.as_u16()),
                })
            })
            .collect();

        Ok(HandlerOutcome::success(json!({
            "count": statuses.len(),
            "categories": CATEGORIES,
            "status_codes": statuses,
            "popular": {
                "success": [200, 201, 204],
                "client_error": [400, 401, 403, 404, 429],
                "server_error": [500, 502, 503, 504],
            },
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: Option<&str>, category: Option<&str>, search: Option<&str>) -> HttpStatusParams {
        HttpStatusParams {
            code: code.map(str::to_string),
            category: category.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_lookup_code() {
        let outcome = HttpStatusTool.execute(params(Some("418"), None, None)).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["message"], "I'm a teapot");
        assert_eq!(payload["category"], "Client Error");
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let outcome = HttpStatusTool.execute(params(Some("799"), None, None)).await.unwrap();
        assert!(!outcome.is_success());
        let outcome = HttpStatusTool.execute(params(Some("abc"), None, None)).await.unwrap();
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_filters() {
        let outcome = HttpStatusTool
            .execute(params(None, Some("server error"), Some("gateway")))
            .await
            .unwrap();
        let codes: Vec<u64> = outcome.payload()["status_codes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["code"].as_u64().unwrap())
            .collect();
        assert_eq!(codes, vec![502, 504]);
    }

    #[tokio::test]
    async fn test_search_by_code() {
        let outcome = HttpStatusTool.execute(params(None, None, Some("404"))).await.unwrap();
        assert_eq!(outcome.payload()["count"], 1);
    }
}
