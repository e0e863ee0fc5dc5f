//! Attempt budget and cooldown for fetches.
//!
//! The remote service's failure modes (rate limiting, transient errors,
//! anti-bot challenges) do not map reliably onto status codes, so every
//! failure is retried the same way until the budget runs out. There is no
//! exponential backoff: pacing comes from the [`RateLimiter`](super::RateLimiter)
//! wait before each attempt, plus a fixed cooldown after an error status.

use std::time::Duration;

use super::constants::{DEFAULT_COOLDOWN, DEFAULT_MAX_ATTEMPTS};

/// Retry configuration for [`RetryingFetcher`](super::RetryingFetcher).
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `cooldown`: 2 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Extra pause after a non-200 response before the next attempt.
    cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown,
        }
    }

    /// Creates a policy with a custom attempt budget and the default cooldown.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, DEFAULT_COOLDOWN)
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the cooldown applied after an error status.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns true if `attempt` (1-indexed) is followed by another attempt.
    #[must_use]
    pub fn has_attempt_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
