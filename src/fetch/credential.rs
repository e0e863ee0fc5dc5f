//! Session credential sent as the `Cookie` header.
//!
//! How the credential is obtained (browser login, access password page) is
//! outside this crate. It arrives either as a ready header string or as a
//! browser cookie export, and is otherwise opaque.

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderValue;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur while building a [`Credential`].
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The credential contains bytes not allowed in an HTTP header value.
    #[error("credential is not a valid HTTP header value (control characters are not allowed)")]
    InvalidHeader,

    /// A cookie export could not be decoded.
    #[error("cookie export is not a JSON array of {{name, value}} objects: {0}")]
    CookieExport(#[from] serde_json::Error),
}

/// Opaque cookie header value granting read access to the catalog.
///
/// An empty credential sends no `Cookie` header at all. The value is marked
/// sensitive and never appears in `Debug` output.
#[derive(Clone, Default)]
pub struct Credential {
    header: Option<HeaderValue>,
}

impl Credential {
    /// A credential that sends no cookie header.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps a cookie header string verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidHeader`] if `raw` contains control
    /// characters such as CR or LF.
    pub fn new(raw: &str) -> Result<Self, CredentialError> {
        if raw.is_empty() {
            return Ok(Self::none());
        }
        let mut header =
            HeaderValue::from_bytes(raw.as_bytes()).map_err(|_| CredentialError::InvalidHeader)?;
        header.set_sensitive(true);
        Ok(Self {
            header: Some(header),
        })
    }

    /// Joins `name=value` pairs into a cookie header.
    ///
    /// Values are trimmed, empty values are dropped, `;` inside a value is
    /// escaped as `%3B` and CR/LF are removed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidHeader`] if a cookie name contains
    /// control characters.
    pub fn from_cookie_pairs<'a, I>(pairs: I) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let joined = pairs
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                let value = value
                    .replace(';', "%3B")
                    .replace(['\n', '\r'], "");
                Some(format!("{name}={value}"))
            })
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(&joined)
    }

    /// Builds a credential from a browser cookie export.
    ///
    /// Accepts a JSON array of objects carrying at least `name` and `value`
    /// (the format written by common browser cookie-export extensions).
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::CookieExport`] for malformed JSON and
    /// [`CredentialError::InvalidHeader`] as [`Self::from_cookie_pairs`].
    #[instrument(skip_all)]
    pub fn from_cookie_export(json: &str) -> Result<Self, CredentialError> {
        let cookies: Vec<ExportedCookie> = serde_json::from_str(json)?;
        debug!(cookies = cookies.len(), "parsed cookie export");
        Self::from_cookie_pairs(
            cookies
                .iter()
                .map(|cookie| (cookie.name.as_str(), cookie.value.as_str())),
        )
    }

    /// Returns true if no cookie header will be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_none()
    }

    /// Returns the header value to send, if any.
    #[must_use]
    pub(crate) fn header_value(&self) -> Option<&HeaderValue> {
        self.header.as_ref()
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::new(raw)
    }
}

// Custom Debug impl that redacts the header value.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_empty() { "[NONE]" } else { "[REDACTED]" };
        f.debug_struct("Credential").field("header", &shown).finish()
    }
}

#[derive(Debug, Deserialize)]
struct ExportedCookie {
    name: String,
    #[serde(default)]
    value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn header_text(credential: &Credential) -> Option<String> {
        credential
            .header_value()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
    }

    #[test]
    fn test_empty_credential_sends_nothing() {
        let credential = Credential::new("").unwrap();
        assert!(credential.is_empty());
        assert!(credential.header_value().is_none());
    }

    #[test]
    fn test_credential_is_kept_verbatim() {
        let credential = Credential::new("_yuque_session=abc; lang=zh-cn").unwrap();
        assert_eq!(
            header_text(&credential).as_deref(),
            Some("_yuque_session=abc; lang=zh-cn")
        );
    }

    #[test]
    fn test_credential_rejects_line_breaks() {
        let result = Credential::new("a=b\r\nX-Injected: 1");
        assert!(matches!(result, Err(CredentialError::InvalidHeader)));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("session=super-secret").unwrap();
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"), "leaked in: {debug}");
        assert!(debug.contains("[REDACTED]"));
        assert!(format!("{:?}", Credential::none()).contains("[NONE]"));
    }

    #[test]
    fn test_credential_header_is_marked_sensitive() {
        let credential = Credential::new("a=b").unwrap();
        assert!(credential.header_value().unwrap().is_sensitive());
    }

    #[test]
    fn test_from_cookie_pairs_joins_and_escapes() {
        let credential = Credential::from_cookie_pairs([
            ("session", " abc "),
            ("empty", "   "),
            ("list", "a;b"),
            ("broken", "x\r\ny"),
        ])
        .unwrap();

        assert_eq!(
            header_text(&credential).as_deref(),
            Some("session=abc; list=a%3Bb; broken=xy")
        );
    }

    #[test]
    fn test_from_cookie_pairs_all_empty_gives_no_header() {
        let credential = Credential::from_cookie_pairs([("a", ""), ("b", " ")]).unwrap();
        assert!(credential.is_empty());
    }

    #[test]
    fn test_from_cookie_export_reads_browser_json() {
        let json = r#"[
            {"domain":".yuque.com","name":"_yuque_session","value":"s1","path":"/"},
            {"domain":".yuque.com","name":"verified_books","value":"v2"}
        ]"#;

        let credential = Credential::from_cookie_export(json).unwrap();

        assert_eq!(
            header_text(&credential).as_deref(),
            Some("_yuque_session=s1; verified_books=v2")
        );
    }

    #[test]
    fn test_from_cookie_export_rejects_non_array() {
        let result = Credential::from_cookie_export(r#"{"name":"a","value":"b"}"#);
        assert!(matches!(result, Err(CredentialError::CookieExport(_))));
    }

    #[test]
    fn test_credential_from_str() {
        let credential: Credential = "a=b".parse().unwrap();
        assert!(!credential.is_empty());
    }
}
