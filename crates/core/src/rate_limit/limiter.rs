//! Cooldown rate limiter keyed by client identity.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::RateLimitConfig;

/// Bounds for the sweep period; longer configured intervals are clamped.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Allows one submission per identity per window.
///
/// All state sits behind a single lock shared by callers and the sweep task.
#[derive(Debug)]
pub struct RateLimiter {
    last_allowed: Mutex<HashMap<String, Instant>>,
    config: RateLimitConfig,
    shutdown: CancellationToken,
}

impl RateLimiter {
    /// Create a limiter without a background sweep.
    ///
    /// Records then only go away through [`RateLimiter::sweep`].
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            last_allowed: Mutex::new(HashMap::new()),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a limiter and spawn its periodic sweep.
    ///
    /// The sweep holds only a weak reference and stops on
    /// [`RateLimiter::shutdown`] or when the last `Arc` is dropped.
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(config: RateLimitConfig) -> Arc<Self> {
        let limiter = Arc::new(Self::new(config));
        tokio::spawn(run_sweeper(
            Arc::downgrade(&limiter),
            limiter.shutdown.clone(),
            config
                .sweep_interval
                .clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL),
        ));
        limiter
    }

    /// Record a submission attempt and report whether it may proceed.
    ///
    /// A denied attempt does not refresh the identity's timestamp.
    pub fn allow(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut last_allowed = self.last_allowed.lock();

        match last_allowed.get_mut(identity) {
            Some(last) if now.duration_since(*last) < self.config.window => false,
            Some(last) => {
                *last = now;
                true
            }
            None => {
                last_allowed.insert(identity.to_string(), now);
                true
            }
        }
    }

    /// Purge identities last allowed longer ago than the retention period.
    ///
    /// Returns how many records were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let retention = self.config.retention;
        let mut last_allowed = self.last_allowed.lock();

        let before = last_allowed.len();
        last_allowed.retain(|_, last| now.duration_since(*last) <= retention);
        before - last_allowed.len()
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_allowed.lock().len()
    }

    /// The cooldown window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Stop the background sweep.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_sweeper(limiter: Weak<RateLimiter>, shutdown: CancellationToken, every: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(limiter) = limiter.upgrade() else { break };
                let purged = limiter.sweep();
                if purged > 0 {
                    debug!(purged, remaining = limiter.tracked(), "Rate limiter sweep");
                }
            }
        }
    }

    debug!("Rate limiter sweep stopped");
}
