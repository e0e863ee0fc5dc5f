//! Constants for the fetch module (timeouts, pacing, request headers).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes, documents with attachments can be large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default base interval between requests; each wait adds up to half again.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(3);

/// Default number of attempts per logical fetch (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause after a non-200 response, on top of the rate limiter wait.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Browser User-Agent sent with every request.
///
/// The remote service serves its export endpoints to browsers; a tool-style
/// agent string gets challenged.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Accept header value sent with every request.
pub const ACCEPT_ANY: &str = "*/*";
