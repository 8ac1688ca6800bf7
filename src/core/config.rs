//! Configuration management for the API server.
//!
//! This module provides a centralized configuration structure populated from
//! defaults, an optional `.env` file and environment variables.

use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the API server.
///
/// This struct contains all configurable aspects of the server, organized
/// by concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Runtime environment.
    pub server: ServerConfig,

    /// Public API metadata reported in envelopes and the listing.
    pub api: ApiInfoConfig,

    /// Rate limit ceilings per tier.
    pub rate_limit: RateLimitConfig,

    /// Admin token allow-list.
    pub admin: AdminConfig,

    /// Upstream ("Elite") API used by proxy endpoints.
    pub upstream: UpstreamConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP transport configuration.
    pub transport: HttpConfig,

    /// Endpoint discovery configuration.
    pub endpoints: EndpointsConfig,

    /// Response envelope options.
    pub envelope: EnvelopeConfig,
}

/// Runtime environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Environment name, e.g. "development" or "production".
    pub environment: String,
}

impl ServerConfig {
    /// Whether the server runs in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// API identification and contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfoConfig {
    pub name: String,
    pub version: String,
    pub author: String,
    /// Operational status string reported in every envelope.
    pub status: String,
    pub documentation: String,
    pub contact: ContactConfig,
}

/// Contact block published by the `/api` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    pub email: String,
    pub website: String,
    pub whatsapp_group: String,
}

/// Ceiling and window for one rate-limit tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Maximum number of requests per window.
    pub max: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl TierLimits {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window_ms: window.as_millis() as u64,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tier applied to anonymous requests, keyed by client IP.
    pub free: TierLimits,

    /// Tier applied to requests carrying a valid admin token, keyed by token.
    pub admin: TierLimits,

    /// Use the first `X-Forwarded-For` hop as the client address.
    pub trust_forwarded_for: bool,
}

/// Admin token allow-list.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    pub tokens: Vec<String>,
}

/// Custom Debug implementation to keep tokens out of logs.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("tokens", &format!("[{} REDACTED]", self.tokens.len()))
            .finish()
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL every proxy endpoint suffix is appended to.
    pub base_url: String,

    /// Timeout for a single upstream call, in milliseconds.
    pub timeout_ms: u64,

    /// `User-Agent` header sent upstream.
    pub user_agent: String,

    /// `Referer` header sent upstream.
    pub referer: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Endpoint discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Directory of declarative proxy endpoint manifests (`*.toml`).
    /// Built-in endpoints are always registered; manifests load after them.
    pub manifest_dir: Option<PathBuf>,
}

/// Response envelope options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Include the `request` echo block in envelopes.
    pub echo_request: bool,
}

const HOUR_MS: u64 = 3_600_000;

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            free: TierLimits {
                max: 100,
                window_ms: HOUR_MS,
            },
            admin: TierLimits {
                max: 10_000,
                window_ms: HOUR_MS,
            },
            trust_forwarded_for: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eliteprotech-apis.zone.id".to_string(),
            timeout_ms: 15_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            referer: "https://eliteprotech-apis.zone.id/".to_string(),
        }
    }
}

impl Default for ApiInfoConfig {
    fn default() -> Self {
        Self {
            name: "Megan API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: "Wanga".to_string(),
            status: "active".to_string(),
            documentation: "https://api.megan.co.ke/docs".to_string(),
            contact: ContactConfig {
                email: "contact@megan.co.ke".to_string(),
                website: "https://api.megan.co.ke".to_string(),
                whatsapp_group: "https://chat.whatsapp.com/FtKp4i086Xc0X91t1MTjrU".to_string(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                environment: "development".to_string(),
            },
            api: ApiInfoConfig::default(),
            rate_limit: RateLimitConfig::default(),
            admin: AdminConfig::default(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: HttpConfig::default(),
            endpoints: EndpointsConfig::default(),
            envelope: EnvelopeConfig { echo_request: true },
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Variable names match the deployment's existing environment
    /// (`PORT`, `RATE_LIMIT_FREE`, `ELITE_API_BASE`, `ADMIN_TOKENS`, ...).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(env) = std::env::var("NODE_ENV").or_else(|_| std::env::var("APP_ENV")) {
            config.server.environment = env;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(name) = std::env::var("API_NAME") {
            config.api.name = name;
        }
        if let Ok(version) = std::env::var("API_VERSION") {
            config.api.version = version;
        }
        if let Ok(email) = std::env::var("API_CONTACT_EMAIL") {
            config.api.contact.email = email;
        }
        if let Ok(website) = std::env::var("API_WEBSITE") {
            config.api.contact.website = website;
        }
        if let Ok(docs) = std::env::var("API_DOCS_URL") {
            config.api.documentation = docs;
        }

        config.transport = HttpConfig::from_env();

        let window_ms = env_parse("RATE_LIMIT_WINDOW_MS", config.rate_limit.free.window_ms);
        config.rate_limit.free = TierLimits {
            max: env_parse("RATE_LIMIT_FREE", config.rate_limit.free.max),
            window_ms,
        };
        config.rate_limit.admin.max = env_parse("RATE_LIMIT_ADMIN", config.rate_limit.admin.max);
        config.rate_limit.trust_forwarded_for = env_flag("TRUST_PROXY", false);

        if let Ok(tokens) = std::env::var("ADMIN_TOKENS") {
            config.admin.tokens = parse_token_list(&tokens);
            info!("Loaded {} admin token(s)", config.admin.tokens.len());
        } else {
            warn!("ADMIN_TOKENS not set - admin access path is disabled");
        }

        if let Ok(base) = std::env::var("ELITE_API_BASE") {
            config.upstream.base_url = base;
        }
        config.upstream.timeout_ms = env_parse("UPSTREAM_TIMEOUT_MS", config.upstream.timeout_ms);

        if let Ok(dir) = std::env::var("ENDPOINTS_DIR") {
            config.endpoints.manifest_dir = Some(PathBuf::from(dir));
        }

        let echo_default = config.server.is_development();
        config.envelope.echo_request = env_flag("ECHO_REQUEST", echo_default);

        config
    }
}

impl Config {
    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> super::error::Result<()> {
        for (tier, limits) in [("free", self.rate_limit.free), ("admin", self.rate_limit.admin)] {
            if limits.max == 0 || limits.window_ms == 0 {
                return Err(super::error::Error::config(format!(
                    "{} rate limit needs a non-zero ceiling and window",
                    tier
                )));
            }
        }
        if self.upstream.timeout_ms == 0 {
            return Err(super::error::Error::config("UPSTREAM_TIMEOUT_MS must be positive"));
        }
        Ok(())
    }
}

/// Parse a comma-separated token list, dropping blanks.
pub fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse an environment variable, keeping `default` when it is
/// missing or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Read a boolean flag; anything except "false"/"0" counts as set.
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_rate_limits_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("RATE_LIMIT_FREE", "3");
            std::env::set_var("RATE_LIMIT_WINDOW_MS", "1000");
        }
        let config = Config::from_env();
        assert_eq!(config.rate_limit.free.max, 3);
        assert_eq!(config.rate_limit.free.window(), Duration::from_secs(1));
        unsafe {
            std::env::remove_var("RATE_LIMIT_FREE");
            std::env::remove_var("RATE_LIMIT_WINDOW_MS");
        }
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("RATE_LIMIT_FREE", "lots");
        }
        let config = Config::from_env();
        assert_eq!(config.rate_limit.free.max, 100);
        unsafe {
            std::env::remove_var("RATE_LIMIT_FREE");
        }
    }

    #[test]
    fn test_admin_tokens_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("ADMIN_TOKENS", " alpha, beta ,,");
        }
        let config = Config::from_env();
        assert_eq!(config.admin.tokens, vec!["alpha", "beta"]);
        unsafe {
            std::env::remove_var("ADMIN_TOKENS");
        }
    }

    #[test]
    fn test_admin_tokens_redacted_in_debug() {
        let admin = AdminConfig {
            tokens: vec!["super_secret_token".to_string()],
        };
        let debug_str = format!("{:?}", admin);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.rate_limit.admin.max = 0;
        assert!(matches!(config.validate(), Err(crate::core::Error::Config(_))));
    }

    #[test]
    fn test_default_has_no_admin_tokens() {
        let config = Config::default();
        assert!(config.admin.tokens.is_empty());
        assert_eq!(config.upstream.timeout(), Duration::from_secs(15));
    }
}
