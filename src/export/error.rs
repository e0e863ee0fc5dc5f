//! Error types for the export pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::ListingParseError;
use crate::fetch::FetchError;

/// A directory or file could not be written.
#[derive(Debug, Error)]
#[error("storage error at {path}: {source}")]
pub struct StorageError {
    /// The path being created or written.
    pub path: PathBuf,
    /// The underlying IO error.
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    /// Creates a storage error for `path`.
    pub fn new(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Why one catalog entry produced no output.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The document body could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The target directory or file could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Fatal errors that abort an export before any document is fetched.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The catalog listing could not be fetched.
    #[error("failed to fetch catalog listing: {0}")]
    ListingFetch(#[source] FetchError),

    /// The catalog listing could not be decoded.
    #[error(transparent)]
    ListingParse(#[from] ListingParseError),

    /// The output root directory could not be created.
    #[error("cannot prepare output directory: {0}")]
    OutputDir(#[source] StorageError),
}
