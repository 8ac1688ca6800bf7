//! Realistic user-agent generator.
//!
//! Strings are built from per-device templates, then parsed back with
//! woothee so the browser and OS fields describe the actual string.

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::ops::RangeInclusive;
use woothee::parser::Parser;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

pub const MAX_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
    Tablet,
    Bot,
}

impl Device {
    fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Bot => "bot",
        }
    }
}

struct Template {
    device: Device,
    platform: &'static str,
    vendor: &'static str,
    model: &'static str,
    /// `{v}` is replaced with a major version drawn from `versions`.
    pattern: &'static str,
    versions: RangeInclusive<u32>,
    screen: (u32, u32),
}

const TEMPLATES: &[Template] = &[
    Template {
        device: Device::Desktop,
        platform: "Win32",
        vendor: "",
        model: "",
        pattern: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Safari/537.36",
        versions: 118..=126,
        screen: (1920, 1080),
    },
    Template {
        device: Device::Desktop,
        platform: "Win32",
        vendor: "",
        model: "",
        pattern: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:{v}.0) Gecko/20100101 Firefox/{v}.0",
        versions: 115..=127,
        screen: (1366, 768),
    },
    Template {
        device: Device::Desktop,
        platform: "MacIntel",
        vendor: "Apple",
        model: "",
        pattern: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{v}.0 Safari/605.1.15",
        versions: 15..=17,
        screen: (1440, 900),
    },
    Template {
        device: Device::Desktop,
        platform: "Linux x86_64",
        vendor: "",
        model: "",
        pattern: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Safari/537.36",
        versions: 118..=126,
        screen: (1920, 1080),
    },
    Template {
        device: Device::Mobile,
        platform: "iPhone",
        vendor: "Apple",
        model: "iPhone",
        pattern: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{v}.0 Mobile/15E148 Safari/604.1",
        versions: 16..=17,
        screen: (390, 844),
    },
    Template {
        device: Device::Mobile,
        platform: "Linux armv8l",
        vendor: "Google",
        model: "Pixel 8",
        pattern: "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Mobile Safari/537.36",
        versions: 118..=126,
        screen: (412, 915),
    },
    Template {
        device: Device::Tablet,
        platform: "iPad",
        vendor: "Apple",
        model: "iPad",
        pattern: "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{v}.0 Mobile/15E148 Safari/604.1",
        versions: 16..=17,
        screen: (820, 1180),
    },
    Template {
        device: Device::Tablet,
        platform: "Linux armv8l",
        vendor: "Samsung",
        model: "SM-X700",
        pattern: "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Safari/537.36",
        versions: 118..=126,
        screen: (800, 1280),
    },
    Template {
        device: Device::Bot,
        platform: "",
        vendor: "Google",
        model: "",
        pattern: "Mozilla/5.0 (compatible; Googlebot/{v}.1; +http://www.google.com/bot.html)",
        versions: 2..=2,
        screen: (0, 0),
    },
    Template {
        device: Device::Bot,
        platform: "",
        vendor: "Microsoft",
        model: "",
        pattern: "Mozilla/5.0 (compatible; bingbot/{v}.0; +http://www.bing.com/bingbot.htm)",
        versions: 2..=2,
        screen: (0, 0),
    },
];

const COMMON_AGENTS: &[(&str, &str)] = &[
    (
        "chrome_desktop",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "safari_mobile",
        "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1",
    ),
    (
        "firefox",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    ),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UserAgentParams {
    /// `desktop` (default), `mobile`, `tablet` or `bot`.
    #[serde(default)]
    pub device: Device,

    /// How many agents to generate; capped at 10.
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

pub struct UserAgentTool;

fn render(template: &Template, version: u32) -> String {
    template.pattern.replace("{v}", &version.to_string())
}

fn describe(parser: &Parser, template: &Template, agent: &str) -> Value {
    let parsed = parser.parse(agent);
    let parsed = parsed.as_ref();

    json!({
        "userAgent": agent,
        "platform": template.platform,
        "device": {
            "type": template.device.as_str(),
            "category": parsed.map(|r| r.category.to_string()),
            "vendor": template.vendor,
            "model": template.model,
        },
        "browser": {
            "name": parsed.map(|r| r.name.to_string()),
            "version": parsed.map(|r| r.version.to_string()),
            "vendor": parsed.map(|r| r.vendor.to_string()),
        },
        "os": {
            "name": parsed.map(|r| r.os.to_string()),
            "version": parsed.map(|r| r.os_version.to_string()),
        },
        "screen": {
            "width": template.screen.0,
            "height": template.screen.1,
        },
    })
}

#[async_trait]
impl Endpoint for UserAgentTool {
    const CATEGORY: &'static str = "web";
    const NAME: &'static str = "user-agent";
    const DESCRIPTION: &'static str = "Generate realistic browser and crawler user-agent strings";
    type Params = UserAgentParams;

    async fn execute(&self, params: UserAgentParams) -> Result<HandlerOutcome, EndpointError> {
        let count = params.count.clamp(1, MAX_COUNT);
        let candidates: Vec<&Template> = TEMPLATES.iter().filter(|t| t.device == params.device).collect();
        let parser = Parser::new();
        let mut rng = rand::thread_rng();

        let mut agents = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(template) = candidates.choose(&mut rng) else {
                return Ok(Failure::invalid_input(format!("No templates for device {}", params.device.as_str())).into());
            };
            let agent = render(template, rng.gen_range(template.versions.clone()));
            agents.push(describe(&parser, template, &agent));
        }

        let common: serde_json::Map<String, Value> = COMMON_AGENTS
            .iter()
            .map(|(name, agent)| (name.to_string(), json!(agent)))
            .collect();

        Ok(HandlerOutcome::success(json!({
            "count": count,
            "device_type": params.device.as_str(),
            "agents": agents,
            "common_agents": common,
            "usage": "Use in HTTP requests: headers: { 'User-Agent': agent.userAgent }",
        })))
    }
}
