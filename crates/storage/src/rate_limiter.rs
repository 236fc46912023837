//! Write pacing for constrained storage areas.
//!
//! The sync area rejects writes beyond a per-minute ceiling. Instead of
//! reacting to those rejections, callers pace themselves with a
//! [`RateLimiter`]: each write is preceded by [`RateLimiter::wait`], which
//! suspends the caller until a minimum interval has passed since the
//! previous permitted write.
//!
//! All callers sharing one limiter form a single queue. The limiter never
//! fails; it only delays.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use osmosis_storage::rate_limiter::{RateLimitConfig, RateLimiter};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let limiter = RateLimiter::new(RateLimitConfig::new(Duration::from_millis(500)).unwrap());
//!
//! limiter.wait().await; // immediate
//! limiter.wait().await; // ~500ms later
//! # });
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};

use crate::ConfigError;

/// Default spacing between writes.
///
/// Two writes per second keeps sustained traffic at 120 writes per minute,
/// the sync area's ceiling, and bursts well below it.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    min_interval: Duration,
}

impl RateLimitConfig {
    /// Creates a new configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `min_interval` is zero.
    pub fn new(min_interval: Duration) -> Result<Self, ConfigError> {
        if min_interval.is_zero() {
            return Err(ConfigError::BelowMinimum {
                field: "min_interval",
                min: "1ns".into(),
                value: "0ns".into(),
            });
        }
        Ok(Self { min_interval })
    }

    /// Returns the minimum spacing between permitted calls.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { min_interval: DEFAULT_MIN_INTERVAL }
    }
}

/// Metrics tracked by the rate limiter.
#[derive(Debug, Default)]
struct RateLimitMetrics {
    permitted: AtomicU64,
    delayed: AtomicU64,
}

/// Snapshot of rate limiter metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitMetricsSnapshot {
    /// Total calls that returned from [`RateLimiter::wait`].
    pub permitted: u64,
    /// Calls that had to sleep before being permitted.
    pub delayed: u64,
}

/// Enforces a minimum interval between consecutive permitted calls.
///
/// The time of the last permitted call lives behind an async mutex that is
/// held while sleeping, so concurrent callers are released one at a time in
/// arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    last_call: Mutex<Option<Instant>>,
    metrics: RateLimitMetrics,
}

impl RateLimiter {
    /// Creates a limiter with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, last_call: Mutex::new(None), metrics: RateLimitMetrics::default() }
    }

    /// Returns the limiter configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Suspends until the next write may be issued.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.config.min_interval {
                let remaining = self.config.min_interval - elapsed;
                tracing::debug!(delay = ?remaining, "pacing write");
                self.metrics.delayed.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(remaining).await;
            }
        }

        *last_call = Some(Instant::now());
        self.metrics.permitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of the rate limiter metrics.
    #[must_use]
    pub fn metrics_snapshot(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            permitted: self.metrics.permitted.load(Ordering::Relaxed),
            delayed: self.metrics.delayed.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
