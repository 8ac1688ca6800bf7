//! UUID v4 generation endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

pub const MAX_UUIDS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UuidFormat {
    #[default]
    Standard,
    Numeric,
    Alphanumeric,
    Base64,
}

impl UuidFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Numeric => "numeric",
            Self::Alphanumeric => "alphanumeric",
            Self::Base64 => "base64",
        }
    }

    fn character_set(self) -> &'static str {
        match self {
            Self::Numeric => "0-9",
            Self::Base64 => "A-Za-z0-9+/=",
            Self::Standard | Self::Alphanumeric => "0-9a-f",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UuidParams {
    /// How many UUIDs to generate (1-1000).
    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default)]
    pub format: UuidFormat,

    /// Keep hyphens in the standard format.
    #[serde(default = "default_true")]
    pub hyphenate: bool,

    #[serde(default)]
    pub uppercase: bool,
}

fn default_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

pub struct UuidTool;

fn format_uuid(uuid: &Uuid, params: &UuidParams) -> String {
    let hyphenated = uuid.hyphenated().to_string();
    let formatted = match params.format {
        UuidFormat::Standard if params.hyphenate => hyphenated,
        UuidFormat::Standard | UuidFormat::Alphanumeric => uuid.simple().to_string(),
        UuidFormat::Numeric => hyphenated.chars().filter(char::is_ascii_digit).collect(),
        UuidFormat::Base64 => STANDARD.encode(uuid.as_bytes()),
    };
    if params.uppercase {
        formatted.to_uppercase()
    } else {
        formatted
    }
}

fn describe(uuid: &Uuid, formatted: &str, params: &UuidParams) -> Value {
    let raw = uuid.hyphenated().to_string();
    let parts: Vec<&str> = raw.split('-').collect();
    json!({
        "raw": raw,
        "formatted": formatted,
        "format": params.format.as_str(),
        "version": uuid.get_version_num(),
        "variant": "RFC 4122",
        "components": {
            "time_low": parts[0],
            "time_mid": parts[1],
            "time_hi_and_version": parts[2],
            "clock_seq_hi_and_reserved": &parts[3][..2],
            "clock_seq_low": &parts[3][2..],
            "node": parts[4],
        },
        "characteristics": {
            "length": formatted.len(),
            "has_hyphens": formatted.contains('-'),
            "is_uppercase": params.uppercase,
            "character_set": params.format.character_set(),
        },
    })
}

#[async_trait]
impl Endpoint for UuidTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "uuid";
    const DESCRIPTION: &'static str = "Generate random (v4) UUIDs in several formats";
    type Params = UuidParams;

    async fn execute(&self, params: UuidParams) -> Result<HandlerOutcome, EndpointError> {
        if params.count == 0 || params.count > MAX_UUIDS {
            return Ok(Failure::invalid_input(format!("Count must be between 1 and {}", MAX_UUIDS))
                .with_suggestion("For bulk generation, use count between 1 and 100")
                .into());
        }

        let generated: Vec<(String, Value)> = (0..params.count)
            .map(|_| {
                let uuid = Uuid::new_v4();
                let formatted = format_uuid(&uuid, &params);
                let details = describe(&uuid, &formatted, &params);
                (formatted, details)
            })
            .collect();

        let data = match generated.as_slice() {
            [(_, details)] => details.clone(),
            _ => {
                let (uuids, details): (Vec<String>, Vec<Value>) = generated.into_iter().unzip();
                json!({ "count": params.count, "uuids": uuids, "details": details })
            }
        };

        Ok(HandlerOutcome::success(json!({
            "type": "uuid_generation",
            "data": data,
            "generation_info": {
                "algorithm": "cryptographically secure random generation (RFC 4122)",
                "parameters_used": {
                    "count": params.count,
                    "format": params.format.as_str(),
                    "hyphenate": params.hyphenate,
                    "uppercase": params.uppercase,
                },
            },
        })))
    }
}
