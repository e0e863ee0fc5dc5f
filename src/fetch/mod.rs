//! Rate-limited, retrying HTTP fetch primitive.
//!
//! # Features
//!
//! - Jittered pause before every request ([`RateLimiter`])
//! - Bounded attempts with a fixed cooldown after error statuses ([`RetryPolicy`])
//! - Browser-like fixed headers plus an opaque cookie ([`Credential`])
//! - Structured error carrying the final cause ([`FetchError`])

mod client;
pub mod constants;
mod credential;
mod error;
pub mod rate_limiter;
mod retry;

pub use client::RetryingFetcher;
pub use credential::{Credential, CredentialError};
pub use error::FetchError;
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
