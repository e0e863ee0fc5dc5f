//! Jittered pacing of outbound requests.
//!
//! This module provides the [`RateLimiter`] struct which makes every caller
//! wait `base + uniform(0, base / 2)` before a request goes out. The random
//! part keeps the request pattern from looking machine-regular to the remote
//! service's abuse detection.
//!
//! Unlike a token bucket there is no burst capacity and no memory of earlier
//! waits: each call to [`RateLimiter::wait`] draws a fresh delay. Callers use
//! the limiter strictly serially.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use kb_export_core::fetch::RateLimiter;
//!
//! # async fn example() {
//! // Waits between 3.0 and 4.5 seconds per call.
//! let limiter = RateLimiter::new(Duration::from_secs(3));
//! limiter.wait().await;
//! # }
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// Serial request pacer with random jitter.
///
/// The randomness source is owned by the limiter so tests can seed it and get
/// reproducible delays.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum delay before every request.
    base: Duration,

    /// Jitter source. Locked only while drawing a delay, never across an await.
    rng: Mutex<StdRng>,
}

impl RateLimiter {
    /// Creates a limiter with the given base interval and an entropy-seeded
    /// jitter source.
    #[must_use]
    #[instrument(skip_all, fields(base_ms = base.as_millis()))]
    pub fn new(base: Duration) -> Self {
        debug!("creating rate limiter");
        Self::with_rng(base, StdRng::from_entropy())
    }

    /// Creates a limiter whose jitter sequence is fully determined by `seed`.
    #[must_use]
    pub fn with_seed(base: Duration, seed: u64) -> Self {
        Self::with_rng(base, StdRng::seed_from_u64(seed))
    }

    /// Creates a limiter using the supplied jitter source.
    #[must_use]
    pub fn with_rng(base: Duration, rng: StdRng) -> Self {
        Self {
            base,
            rng: Mutex::new(rng),
        }
    }

    /// Creates a limiter that never waits.
    ///
    /// Use this when `--rate-limit 0` is specified, and in tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_seed(Duration::ZERO, 0)
    }

    /// Returns whether waits are skipped entirely.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.base.is_zero()
    }

    /// Returns the configured base interval.
    #[must_use]
    pub fn base_interval(&self) -> Duration {
        self.base
    }

    /// Draws the next delay: `base` plus a uniform jitter in `[0, base / 2]`.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }
        let half_nanos = u64::try_from((self.base / 2).as_nanos()).unwrap_or(u64::MAX);
        let jitter_nanos = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..=half_nanos);
        self.base + Duration::from_nanos(jitter_nanos)
    }

    /// Blocks the calling task for one freshly drawn delay.
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis(), "rate limit wait");
        tokio::time::sleep(delay).await;
    }
}
