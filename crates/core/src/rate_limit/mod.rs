//! Per-client submission cooldown.
//!
//! Each identity may submit once per window. Records are purged by a
//! background sweep once they are older than the retention period.

mod config;
mod limiter;

pub use config::RateLimitConfig;
pub use limiter::RateLimiter;
