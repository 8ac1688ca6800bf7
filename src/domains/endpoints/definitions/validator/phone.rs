//! Phone number validation endpoint.
//!
//! Kenyan mobile numbers are recognised in local (`07..`/`01..`) and
//! international (`+254..`) form; anything else is checked against the
//! E.164 length rules only.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

/// Local prefixes, longest first so specific ranges win.
const KENYAN_CARRIERS: &[(&str, &str)] = &[
    ("074", "Safaricom"),
    ("075", "Telkom"),
    ("07", "Safaricom"),
    ("01", "Airtel"),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PhoneParams {
    /// Phone number, with or without country code.
    pub phone: Option<String>,
}

pub struct PhoneValidator;

/// Convert a Kenyan number to its ten-digit local form, e.g. `0712345678`.
pub fn kenyan_local_form(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let local = if let Some(rest) = digits.strip_prefix("254") {
        format!("0{}", rest)
    } else {
        digits
    };
    let is_mobile = local.len() == 10 && (local.starts_with("07") || local.starts_with("01"));
    is_mobile.then_some(local)
}

fn carrier(local: &str) -> &'static str {
    KENYAN_CARRIERS
        .iter()
        .find(|(prefix, _)| local.starts_with(prefix))
        .map(|(_, carrier)| *carrier)
        .unwrap_or("Unknown")
}

fn looks_like_e164(phone: &str) -> bool {
    let trimmed = phone.trim();
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    allowed && (7..=15).contains(&digits)
}

#[async_trait]
impl Endpoint for PhoneValidator {
    const CATEGORY: &'static str = "validator";
    const NAME: &'static str = "phone";
    const DESCRIPTION: &'static str = "Validate a phone number and detect Kenyan mobile carriers";
    type Params = PhoneParams;

    async fn execute(&self, params: PhoneParams) -> Result<HandlerOutcome, EndpointError> {
        let phone = required(params.phone.as_deref(), "Phone parameter required")?.trim();
        let kenyan = kenyan_local_form(phone);
        let valid = kenyan.is_some() || looks_like_e164(phone);

        Ok(HandlerOutcome::success(json!({
            "phone": phone,
            "valid": valid,
            "country_detected": if kenyan.is_some() { "Kenya" } else { "Unknown" },
            "international": kenyan.as_ref().map(|local| format!("+254{}", &local[1..])),
            "format": if valid { "mobile" } else { "unknown" },
            "carrier": kenyan.as_deref().map(carrier).unwrap_or("Unknown"),
            "suggestion": if valid { "Valid phone number" } else { "Check phone format" },
        })))
    }
}
