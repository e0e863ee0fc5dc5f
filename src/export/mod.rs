//! Export orchestration: listing fetch, tree building and the disk walk.
//!
//! [`export_catalog`] is the library entry point. It fetches the catalog
//! listing, decodes it, arranges it into a [`Forest`](crate::catalog::Forest)
//! and hands the forest to an [`ExportWalker`].

pub mod endpoints;
mod error;
pub mod paths;
mod walker;

use std::path::PathBuf;

use tracing::{info, instrument};

pub use endpoints::{EndpointError, Namespace, ServiceEndpoints};
pub use error::{ExportError, FailureCause, StorageError};
pub use walker::{ExportFailure, ExportOptions, ExportReport, ExportWalker};

use crate::catalog::{build_forest, parse_listing};
use crate::fetch::{Credential, RetryingFetcher};

/// Everything needed to export one knowledge base.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Numeric catalog id passed to the listing endpoint.
    pub book_id: String,
    /// Namespace documents are fetched under.
    pub namespace: Namespace,
    /// Cookie sent with every request.
    pub credential: Credential,
    /// Directory the tree is mirrored into.
    pub output_dir: PathBuf,
    /// Walk behaviour switches.
    pub options: ExportOptions,
}

impl ExportRequest {
    /// Creates a request with no credential and default options.
    #[must_use]
    pub fn new(
        book_id: impl Into<String>,
        namespace: Namespace,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            namespace,
            credential: Credential::none(),
            output_dir: output_dir.into(),
            options: ExportOptions::default(),
        }
    }

    /// Sets the credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Sets the walk options.
    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }
}

/// Exports a whole knowledge base to disk.
///
/// Listing fetch and decode problems, and an output root that cannot be
/// created, abort the export. Per-document problems do not; they are
/// collected in the returned [`ExportReport`].
///
/// # Errors
///
/// Returns [`ExportError`] when the listing cannot be fetched or decoded, or
/// the output root cannot be created.
#[instrument(skip_all, fields(book_id = %request.book_id, namespace = %request.namespace))]
pub async fn export_catalog(
    fetcher: &RetryingFetcher,
    endpoints: &ServiceEndpoints,
    request: &ExportRequest,
) -> Result<ExportReport, ExportError> {
    let listing_url = endpoints.catalog_url(&request.book_id);
    let body = fetcher
        .fetch(&listing_url, &request.credential)
        .await
        .map_err(ExportError::ListingFetch)?;

    let records = parse_listing(&body)?;
    let forest = build_forest(records);
    info!(
        nodes = forest.len(),
        roots = forest.roots().len(),
        documents = forest.document_count(),
        "catalog listing loaded"
    );

    tokio::fs::create_dir_all(&request.output_dir)
        .await
        .map_err(|e| ExportError::OutputDir(StorageError::new(&request.output_dir, e)))?;

    let base_url = endpoints.namespace_url(&request.namespace);
    let report = ExportWalker::new(fetcher)
        .with_options(request.options)
        .export(&forest, &base_url, &request.credential, &request.output_dir)
        .await;

    Ok(report)
}
