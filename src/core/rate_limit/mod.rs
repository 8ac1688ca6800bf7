//! Request rate limiting.
//!
//! ## Structure
//!
//! - `clock.rs` - time source, swappable in tests
//! - `limiter.rs` - per-key fixed-window counter
//! - `tier.rs` - free (per client IP) and admin (per token) tiers

mod clock;
mod limiter;
mod tier;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use limiter::{FixedWindowLimiter, RateDecision};
pub use tier::{RateTier, TieredRateLimiter};
