//! Email format validation endpoint.

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("email pattern is valid")
});

/// Known throwaway mailbox providers.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "10minutemail.com",
    "tempmail.com",
    "yopmail.com",
    "trashmail.com",
];

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254
        && EMAIL_PATTERN.is_match(email)
        && email.split('@').next().is_some_and(|local| local.len() <= 64)
        && !email.contains("..")
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EmailParams {
    /// Address to validate.
    pub email: Option<String>,
}

pub struct EmailValidator;

#[async_trait]
impl Endpoint for EmailValidator {
    const CATEGORY: &'static str = "validators";
    const NAME: &'static str = "email";
    const DESCRIPTION: &'static str = "Check an email address for valid format";
    type Params = EmailParams;

    async fn execute(&self, params: EmailParams) -> Result<HandlerOutcome, EndpointError> {
        let email = required(params.email.as_deref(), "Email parameter required")?.trim();
        let valid = is_valid_email(email);
        let domain = email.rsplit_once('@').map(|(_, d)| d.to_ascii_lowercase());
        let disposable = valid
            && domain
                .as_deref()
                .is_some_and(|d| d.contains("disposable") || DISPOSABLE_DOMAINS.contains(&d));

        Ok(HandlerOutcome::success(json!({
            "email": email,
            "valid": valid,
            "details": {
                "format_valid": valid,
                "domain": domain,
                "disposable": disposable,
                "suggestion": if valid { "Email format is valid" } else { "Check email format" },
            },
            "score": if valid { 100 } else { 0 },
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.ke"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("a..b@example.com"));
        assert!(!is_valid_email("no spaces@example.com"));
    }

    #[tokio::test]
    async fn test_disposable_domain() {
        let params = EmailParams {
            email: Some("bot@mailinator.com".to_string()),
        };
        let outcome = EmailValidator.execute(params).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["valid"], true);
        assert_eq!(payload["details"]["disposable"], true);
        assert_eq!(payload["details"]["domain"], "mailinator.com");
    }

    #[tokio::test]
    async fn test_invalid_is_still_success() {
        let params = EmailParams {
            email: Some("nope".to_string()),
        };
        let outcome = EmailValidator.execute(params).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.payload()["score"], 0);
    }
}
