//! Remote endpoint URLs for catalog listings and document bodies.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Public service root used when no other base is configured.
pub const DEFAULT_SERVICE_BASE: &str = "https://www.yuque.com";

/// Listing endpoint, relative to the service root.
const CATALOG_PATH: &str = "api/catalog_nodes";

/// Query asking for raw Markdown with attachments and no rendering transforms.
const DOCUMENT_QUERY: &str = "attachment=true&latexcode=false&anchor=false&linebreak=false";

/// Errors in endpoint configuration.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The service base is not an absolute http(s) URL.
    #[error("invalid service base URL {base}: {reason}")]
    InvalidBase {
        /// The rejected value.
        base: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The namespace is not of the form `owner/slug`.
    #[error("invalid namespace {0:?}: expected two path segments like \"owner/slug\"")]
    InvalidNamespace(String),
}

/// Owner and slug identifying one knowledge base, written `owner/slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    owner: String,
    slug: String,
}

impl Namespace {
    /// Parses `owner/slug`. Surrounding slashes and whitespace are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidNamespace`] unless the value has
    /// exactly two non-empty segments.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let trimmed = raw.trim().trim_matches('/');
        let mut segments = trimmed.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(slug), None)
                if is_valid_segment(owner) && is_valid_segment(slug) =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    slug: slug.to_string(),
                })
            }
            _ => Err(EndpointError::InvalidNamespace(raw.to_string())),
        }
    }

    /// Returns the owner segment.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the knowledge base slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().any(|c| c.is_whitespace() || c == '?' || c == '#')
}

impl FromStr for Namespace {
    type Err = EndpointError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

/// URL builder for one remote service.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    /// Service root, always ending in `/`.
    base: Url,
    catalog: Url,
}

impl Default for ServiceEndpoints {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_BASE).expect("default service base is a valid URL")
    }
}

impl ServiceEndpoints {
    /// Creates endpoints rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidBase`] if `base` is not an absolute
    /// `http` or `https` URL, or carries a query or fragment.
    pub fn new(base: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: &str| EndpointError::InvalidBase {
            base: base.to_string(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not contain a query or fragment"));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        let catalog = url.join(CATALOG_PATH).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self { base: url, catalog })
    }

    /// Returns the service root (with trailing slash).
    #[must_use]
    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    /// Listing URL for a catalog: `{base}/api/catalog_nodes?book_id={id}`.
    #[must_use]
    pub fn catalog_url(&self, book_id: &str) -> String {
        let mut url = self.catalog.clone();
        url.query_pairs_mut().append_pair("book_id", book_id);
        url.into()
    }

    /// Root under which a namespace's documents live: `{base}/{owner}/{slug}`.
    #[must_use]
    pub fn namespace_url(&self, namespace: &Namespace) -> String {
        format!("{}{namespace}", self.base)
    }
}

/// Markdown export URL of one document below a namespace root.
///
/// ```
/// use kb_export_core::export::endpoints::document_url;
///
/// assert_eq!(
///     document_url("https://www.yuque.com/team/handbook", "intro-x1"),
///     "https://www.yuque.com/team/handbook/intro-x1/markdown?attachment=true&latexcode=false&anchor=false&linebreak=false"
/// );
/// ```
#[must_use]
pub fn document_url(base_url: &str, locator: &str) -> String {
    format!(
        "{}/{}/markdown?{DOCUMENT_QUERY}",
        base_url.trim_end_matches('/'),
        locator.trim_matches('/')
    )
}
