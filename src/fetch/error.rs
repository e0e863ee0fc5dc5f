//! Error types for the fetch module.

use thiserror::Error;

/// A logical fetch failed after exhausting its attempt budget.
///
/// Carries the cause observed on the final attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection refused, TLS, body read).
    #[error("network error fetching {url} after {attempts} attempt(s): {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request timed out.
    #[error("timeout fetching {url} after {attempts} attempt(s)")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The server answered with a status other than 200.
    #[error("HTTP {status} fetching {url} after {attempts} attempt(s)")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The last status code observed.
        status: u16,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The URL could not be parsed; no request was sent.
    #[error("invalid URL: {url}: {source}")]
    InvalidUrl {
        /// The malformed URL string.
        url: String,
        /// Why the URL was rejected.
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Returns the URL the fetch targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::InvalidUrl { url, .. } => url,
        }
    }

    /// Returns the last HTTP status, if the final attempt got a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns how many attempts were made before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Network { attempts, .. }
            | Self::Timeout { attempts, .. }
            | Self::HttpStatus { attempts, .. } => *attempts,
            Self::InvalidUrl { .. } => 0,
        }
    }
}
