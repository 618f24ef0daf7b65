//! Rate limiter configuration.

use std::time::Duration;

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Minimum time between two allowed submissions from one identity.
    pub window: Duration,
    /// Age after which an identity's record may be purged.
    pub retention: Duration,
    /// How often the purge sweep runs.
    pub sweep_interval: Duration,
}

impl RateLimitConfig {
    /// Default window: 1 minute.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
    /// Default retention and sweep interval: 5 minutes.
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

    /// Config with the given window and default housekeeping.
    #[must_use]
    pub const fn with_window(window: Duration) -> Self {
        Self {
            window,
            retention: Self::DEFAULT_RETENTION,
            sweep_interval: Self::DEFAULT_RETENTION,
        }
    }

    /// Set the retention period.
    #[must_use]
    pub const fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the sweep interval.
    #[must_use]
    pub const fn sweep_every(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }
}
