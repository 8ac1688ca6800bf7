//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::config::{env_flag, env_parse};

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origin(s): `*` or a comma-separated list.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Add `nosniff` / frame / referrer security headers to every response.
    #[serde(default = "default_security_headers")]
    pub security_headers: bool,

    /// Interval between sweeps of expired rate-limit windows, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_security_headers() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
            cors_origin: default_cors_origin(),
            security_headers: default_security_headers(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl HttpConfig {
    /// Create an HTTP transport config for the given address.
    pub fn new(port: u16, host: impl Into<String>) -> Self {
        Self {
            port,
            host: host.into(),
            ..Default::default()
        }
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT", defaults.port),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            security_headers: env_flag("HELMET_ENABLED", defaults.security_headers),
            sweep_interval_secs: env_parse("RATE_LIMIT_SWEEP_SECS", defaults.sweep_interval_secs),
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        format!("HTTP on {}", self.address())
    }
}
