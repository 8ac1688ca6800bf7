//! Fixed-window request counter keyed by client.
//!
//! Each key owns `{count, window_start}`. A request first resets the window
//! when more than `window` has elapsed since it started, then increments the
//! count; it is rejected when the count exceeds the ceiling. Rejected
//! requests still count.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use crate::core::config::TierLimits;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Whole seconds until the window resets, at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

/// Concurrent fixed-window limiter.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limits: TierLimits,
    windows: DashMap<String, Window>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(limits: TierLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: TierLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            windows: DashMap::new(),
            clock,
        }
    }

    pub fn limits(&self) -> TierLimits {
        self.limits
    }

    /// Count one request for `key`.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let window = self.limits.window();

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.saturating_duration_since(entry.started) > window {
            *entry = Window {
                count: 0,
                started: now,
            };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started);
        RateDecision {
            allowed: entry.count <= self.limits.max,
            limit: self.limits.max,
            remaining: self.limits.max.saturating_sub(entry.count),
            reset_after: window.saturating_sub(elapsed),
        }
    }

    /// Drop expired windows. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let window = self.limits.window();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) <= window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked keys.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate_limit::ManualClock;

    fn limiter(max: u32, window_secs: u64) -> (FixedWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = FixedWindowLimiter::with_clock(
            TierLimits::new(max, Duration::from_secs(window_secs)),
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_fourth_request_rejected_then_reset() {
        let (limiter, clock) = limiter(3, 60);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
        let rejected = limiter.check("1.2.3.4");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 3);

        clock.advance(Duration::from_secs(61));
        let decision = limiter.check("1.2.3.4");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let (limiter, clock) = limiter(1, 60);
        assert!(limiter.check("k").allowed);
        clock.advance(Duration::from_secs(60));
        assert!(!limiter.check("k").allowed);
        clock.advance(Duration::from_millis(1));
        assert!(limiter.check("k").allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter(1, 60);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn test_retry_after() {
        let (limiter, clock) = limiter(1, 60);
        limiter.check("k");
        clock.advance(Duration::from_millis(10_500));
        let decision = limiter.check("k");
        assert!(!decision.allowed);
        assert_eq!(decision.reset_after, Duration::from_millis(49_500));
        assert_eq!(decision.retry_after_secs(), 50);
    }

    #[test]
    fn test_sweep_removes_expired_windows() {
        let (limiter, clock) = limiter(5, 60);
        limiter.check("old");
        clock.advance(Duration::from_secs(30));
        limiter.check("fresh");
        clock.advance(Duration::from_secs(31));

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked(), 1);
    }
}
