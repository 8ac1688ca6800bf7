//! Free and admin rate-limit tiers.

use serde::Serialize;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::limiter::{FixedWindowLimiter, RateDecision};
use crate::core::config::{RateLimitConfig, TierLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateTier {
    /// Anonymous requests, keyed by client IP.
    Free,
    /// Requests through a valid admin token, keyed by token.
    Admin,
}

impl RateTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for RateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One limiter per tier.
#[derive(Debug)]
pub struct TieredRateLimiter {
    free: FixedWindowLimiter,
    admin: FixedWindowLimiter,
}

impl TieredRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            free: FixedWindowLimiter::with_clock(config.free, clock.clone()),
            admin: FixedWindowLimiter::with_clock(config.admin, clock),
        }
    }

    fn limiter(&self, tier: RateTier) -> &FixedWindowLimiter {
        match tier {
            RateTier::Free => &self.free,
            RateTier::Admin => &self.admin,
        }
    }

    /// Count one request for `key` in `tier`.
    pub fn check(&self, tier: RateTier, key: &str) -> RateDecision {
        self.limiter(tier).check(key)
    }

    pub fn limits(&self, tier: RateTier) -> TierLimits {
        self.limiter(tier).limits()
    }

    /// Drop expired windows in both tiers. Returns the number removed.
    pub fn sweep(&self) -> usize {
        self.free.sweep() + self.admin.sweep()
    }
}
