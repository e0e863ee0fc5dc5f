//! HTTP GET with a bounded attempt budget.
//!
//! This module provides the [`RetryingFetcher`] which wraps a reqwest client,
//! the shared [`RateLimiter`] and a [`RetryPolicy`]. Every outbound request of
//! an export, listing or document, goes through one fetcher, so the limiter
//! paces all of them.

use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{ACCEPT_ANY, BROWSER_USER_AGENT, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::{Credential, FetchError, RateLimiter, RetryPolicy};

/// Serial, rate-limited, retrying HTTP fetcher.
///
/// # Example
///
/// ```no_run
/// use kb_export_core::fetch::{Credential, RateLimiter, RetryPolicy, RetryingFetcher};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = RetryingFetcher::new(
///     RateLimiter::new(Duration::from_secs(3)),
///     RetryPolicy::default(),
/// )?;
/// let body = fetcher
///     .fetch("https://www.yuque.com/api/catalog_nodes?book_id=1", &Credential::none())
///     .await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RetryingFetcher {
    client: Client,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

/// Outcome of one failed attempt.
#[derive(Debug, Error)]
enum AttemptFailure {
    #[error("{0}")]
    Network(reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
}

impl AttemptFailure {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error)
        }
    }

    fn into_fetch_error(self, url: &str, attempts: u32) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Network(source) => FetchError::Network {
                url,
                attempts,
                source,
            },
            Self::Timeout => FetchError::Timeout { url, attempts },
            Self::Status(status) => FetchError::HttpStatus {
                url,
                status,
                attempts,
            },
        }
    }
}

impl RetryingFetcher {
    /// Creates a fetcher with the default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built (for
    /// example when no TLS backend is available).
    pub fn new(limiter: RateLimiter, policy: RetryPolicy) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(limiter, policy, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a fetcher with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(limiter))]
    pub fn with_timeouts(
        limiter: RateLimiter,
        policy: RetryPolicy,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            limiter,
            policy,
        })
    }

    /// Returns the limiter pacing this fetcher.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `url`, returning the full body of the first 200 response.
    ///
    /// Each attempt waits on the rate limiter first. A non-200 status adds the
    /// policy's cooldown before the next attempt; transport errors go straight
    /// to the next attempt. All failures are retried alike.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] carrying the final attempt's cause once the
    /// attempt budget is spent, or [`FetchError::InvalidUrl`] without sending
    /// anything if `url` does not parse.
    #[instrument(skip(self, credential), fields(url = %url))]
    pub async fn fetch(&self, url: &str, credential: &Credential) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|source| FetchError::invalid_url(url, source))?;

        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            self.limiter.wait().await;

            let failure = match self.attempt(url, credential).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "fetch succeeded");
                    return Ok(body);
                }
                Err(failure) => failure,
            };

            warn!(attempt, max_attempts, error = %failure, "fetch attempt failed");

            if !self.policy.has_attempt_after(attempt) {
                return Err(failure.into_fetch_error(url, attempt));
            }
            if matches!(failure, AttemptFailure::Status(_)) && !self.policy.cooldown().is_zero() {
                debug!(
                    cooldown_ms = self.policy.cooldown().as_millis(),
                    "cooling down after error status"
                );
                tokio::time::sleep(self.policy.cooldown()).await;
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str, credential: &Credential) -> Result<Vec<u8>, AttemptFailure> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, ACCEPT_ANY);
        if let Some(cookie) = credential.header_value() {
            request = request.header(COOKIE, cookie.clone());
        }

        let response = request
            .send()
            .await
            .map_err(AttemptFailure::from_transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AttemptFailure::Status(status.as_u16()));
        }

        // Held fully in memory so a later write is all-or-nothing.
        let body = response
            .bytes()
            .await
            .map_err(AttemptFailure::from_transport)?;
        Ok(body.to_vec())
    }
}
