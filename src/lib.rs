//! Knowledge-Base Export Core Library
//!
//! This library mirrors a hosted knowledge base onto the local filesystem:
//! every document becomes a Markdown file, and the catalog's container
//! hierarchy becomes a directory tree.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Listing records and the forest they form
//! - [`fetch`] - Rate-limited, retrying HTTP fetch with an opaque cookie
//! - [`export`] - Path sanitizing, endpoint URLs and the export walk
//!
//! The pipeline is sequential: one request in flight at a time, each
//! preceded by a jittered pause.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod export;
pub mod fetch;

// Re-export commonly used types
pub use catalog::{CatalogRecord, Forest, NodeKind, TreeNode, build_forest, parse_listing};
pub use export::{
    ExportError, ExportOptions, ExportReport, ExportRequest, ExportWalker, Namespace,
    ServiceEndpoints, export_catalog,
};
pub use fetch::{Credential, FetchError, RateLimiter, RetryPolicy, RetryingFetcher};
