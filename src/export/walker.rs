//! Depth-first export of a catalog forest onto disk.
//!
//! The walker visits nodes one at a time in listing order:
//!
//! 1. A container becomes a directory named after its title; its subtree is
//!    exported inside it. Other kinds stay in their parent's directory.
//! 2. A document with a locator is fetched and written to
//!    `<title>__<locator>.md`, unless that file already exists with nonzero
//!    size (resume marker).
//! 3. Children are visited whatever the node's kind.
//!
//! A document that cannot be fetched or written is recorded in the
//! [`ExportReport`] and the walk moves on. A container whose directory cannot
//! be created is recorded once and its subtree is skipped.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::endpoints::document_url;
use super::error::{FailureCause, StorageError};
use super::paths::{UNTITLED, safe_name, unique_path};
use crate::catalog::{CatalogRecord, Forest, TreeNode};
use crate::fetch::{Credential, RetryingFetcher};

/// Suffix of the temporary file a document body is written to before rename.
const PARTIAL_PREFIX: &str = ".kb-export-";
const PARTIAL_SUFFIX: &str = ".part";

/// Walk behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Re-fetch documents even when their file already exists.
    pub refresh: bool,
}

/// One catalog entry that produced no output.
#[derive(Debug)]
pub struct ExportFailure {
    /// Remote id of the entry.
    pub id: String,
    /// Remote title of the entry.
    pub title: String,
    /// Remote locator of the entry (empty for containers).
    pub locator: String,
    /// What went wrong.
    pub cause: FailureCause,
}

/// Outcome of an export walk.
///
/// Failures are kept in visit order so callers can detect partial exports
/// without reading logs.
#[derive(Debug, Default)]
pub struct ExportReport {
    saved: usize,
    skipped: usize,
    directories: usize,
    failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// Documents fetched and written during this walk.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Documents left alone because a nonzero-size file already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Container directories ensured to exist.
    #[must_use]
    pub fn directories(&self) -> usize {
        self.directories
    }

    /// Entries that produced no output, in visit order.
    #[must_use]
    pub fn failures(&self) -> &[ExportFailure] {
        &self.failures
    }

    /// Number of failed entries.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Documents whose file is present after the walk (saved or skipped).
    #[must_use]
    pub fn exported(&self) -> usize {
        self.saved + self.skipped
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, record: &CatalogRecord, cause: impl Into<FailureCause>) {
        let cause = cause.into();
        warn!(
            id = %record.id,
            title = %record.title,
            locator = %record.locator,
            error = %cause,
            "export failed for catalog entry"
        );
        self.failures.push(ExportFailure {
            id: record.id.clone(),
            title: record.title.clone(),
            locator: record.locator.clone(),
            cause,
        });
    }
}

/// Sequential exporter of a [`Forest`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use kb_export_core::catalog::{CatalogRecord, build_forest};
/// use kb_export_core::export::ExportWalker;
/// use kb_export_core::fetch::{Credential, RateLimiter, RetryPolicy, RetryingFetcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let forest = build_forest(vec![
///     CatalogRecord::container("A", "Guides", ""),
///     CatalogRecord::document("B", "Intro", "intro-x1", "A"),
/// ]);
/// let fetcher = RetryingFetcher::new(RateLimiter::disabled(), RetryPolicy::default())?;
/// let report = ExportWalker::new(&fetcher)
///     .export(&forest, "https://www.yuque.com/team/handbook", &Credential::none(), Path::new("/out"))
///     .await;
/// println!("saved {}, failed {}", report.saved(), report.failed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExportWalker<'a> {
    fetcher: &'a RetryingFetcher,
    options: ExportOptions,
}

impl<'a> ExportWalker<'a> {
    /// Creates a walker fetching through `fetcher`.
    #[must_use]
    pub fn new(fetcher: &'a RetryingFetcher) -> Self {
        Self {
            fetcher,
            options: ExportOptions::default(),
        }
    }

    /// Replaces the walk options.
    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Exports every node of `forest` below `output_dir`.
    ///
    /// `base_url` is the namespace root documents are fetched from. Never
    /// fails as a whole; per-entry problems end up in the returned report.
    #[instrument(skip_all, fields(base_url = %base_url, output_dir = %output_dir.display()))]
    pub async fn export(
        &self,
        forest: &Forest,
        base_url: &str,
        credential: &Credential,
        output_dir: &Path,
    ) -> ExportReport {
        let mut report = ExportReport::default();

        let mut pending: Vec<(&TreeNode, PathBuf)> = forest
            .roots()
            .iter()
            .rev()
            .map(|root| (root, output_dir.to_path_buf()))
            .collect();

        while let Some((node, dir)) = pending.pop() {
            let record = node.record();

            let current_dir = if record.is_container() {
                match ensure_container_dir(&dir, record).await {
                    Ok(created) => {
                        report.directories += 1;
                        created
                    }
                    Err(error) => {
                        report.record_failure(record, error);
                        continue;
                    }
                }
            } else {
                dir
            };

            if record.is_document() {
                self.export_document(record, base_url, credential, &current_dir, &mut report)
                    .await;
            }

            pending.extend(
                node.children()
                    .iter()
                    .rev()
                    .map(|child| (child, current_dir.clone())),
            );
        }

        info!(
            saved = report.saved,
            skipped = report.skipped,
            failed = report.failed(),
            directories = report.directories,
            "export walk finished"
        );
        report
    }

    async fn export_document(
        &self,
        record: &CatalogRecord,
        base_url: &str,
        credential: &Credential,
        dir: &Path,
        report: &mut ExportReport,
    ) {
        if record.locator.is_empty() {
            debug!(id = %record.id, title = %record.title, "document has no locator, nothing to fetch");
            return;
        }

        let target = unique_path(dir, &record.title, &record.locator, &record.id);
        debug!(title = %record.title, locator = %record.locator, path = %target.display(), "visiting document");

        if !self.options.refresh && is_already_exported(&target).await {
            debug!(path = %target.display(), "already exported, skipping");
            report.skipped += 1;
            return;
        }

        let url = document_url(base_url, &record.locator);
        let body = match self.fetcher.fetch(&url, credential).await {
            Ok(body) => body,
            Err(error) => {
                report.record_failure(record, error);
                return;
            }
        };

        match write_atomically(&target, &body).await {
            Ok(()) => {
                info!(path = %target.display(), bytes = body.len(), "saved document");
                report.saved += 1;
            }
            Err(error) => report.record_failure(record, error),
        }
    }
}

async fn ensure_container_dir(
    parent: &Path,
    record: &CatalogRecord,
) -> Result<PathBuf, StorageError> {
    let dir = parent.join(safe_name(&record.title, UNTITLED));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| StorageError::new(&dir, e))?;
    Ok(dir)
}

/// A file with nonzero size is the only marker of a finished export.
async fn is_already_exported(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Writes `body` to a short-named temporary file in the target's directory,
/// then renames it onto `target`, so `target` either holds the full body or is
/// left untouched. The temporary name does not grow with the target name.
async fn write_atomically(target: &Path, body: &[u8]) -> Result<(), StorageError> {
    let owned_target = target.to_path_buf();
    let owned_body = body.to_vec();
    tokio::task::spawn_blocking(move || persist_body(&owned_target, &owned_body))
        .await
        .map_err(|join| StorageError::new(target, std::io::Error::other(join)))?
}

fn persist_body(target: &Path, body: &[u8]) -> Result<(), StorageError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| StorageError::new(dir, e))?;

    // The staged file is removed on drop if anything below fails.
    staged
        .write_all(body)
        .map_err(|e| StorageError::new(staged.path(), e))?;
    staged
        .persist(target)
        .map_err(|e| StorageError::new(target, e.error))?;
    Ok(())
}
