//! Catalog listing records and their decoding.
//!
//! The remote service describes a knowledge base as a flat list of entries,
//! each pointing at its parent by id. This module owns the record type and
//! the JSON decoding of the listing body; [`build_forest`] turns the flat
//! list back into a tree.
//!
//! # Example
//!
//! ```
//! use kb_export_core::catalog::{NodeKind, build_forest, parse_listing};
//!
//! let body = br#"{"data":[
//!     {"type":"TITLE","title":"Guides","uuid":"A","url":"","parent_uuid":""},
//!     {"type":"DOC","title":"Intro","uuid":"B","url":"intro-x1","parent_uuid":"A"}
//! ]}"#;
//!
//! let records = parse_listing(body).unwrap();
//! assert_eq!(records[0].kind, NodeKind::Container);
//!
//! let forest = build_forest(records);
//! assert_eq!(forest.roots().len(), 1);
//! assert_eq!(forest.roots()[0].children()[0].record().locator, "intro-x1");
//! ```

mod tree;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

pub use tree::{Forest, TreeNode, build_forest};

/// Wire value the listing uses for container entries.
const CONTAINER_WIRE: &str = "TITLE";

/// Wire value the listing uses for document entries.
const DOCUMENT_WIRE: &str = "DOC";

/// Kind of a catalog entry.
///
/// Kinds this crate does not know are preserved in [`NodeKind::Other`] so a
/// new entry type on the remote side never breaks listing decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NodeKind {
    /// Non-leaf entry, exported as a directory.
    Container,
    /// Leaf entry with fetchable content, exported as a Markdown file.
    Document,
    /// Any other entry type. Traversed, but produces no output of its own.
    Other(String),
}

impl NodeKind {
    /// Maps the listing's `type` field onto a kind.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            CONTAINER_WIRE => Self::Container,
            DOCUMENT_WIRE => Self::Document,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the listing's spelling of this kind.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Container => CONTAINER_WIRE,
            Self::Document => DOCUMENT_WIRE,
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for NodeKind {
    fn from(raw: String) -> Self {
        Self::from_wire(&raw)
    }
}

/// One entry of the remote catalog listing.
///
/// `id` is unique within a listing; `title` is not. An empty `parent_id`
/// attaches the entry at the forest root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRecord {
    /// Entry kind (`type` on the wire).
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display title. May be empty or contain characters illegal in paths.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Stable remote identifier (`uuid` on the wire).
    #[serde(rename = "uuid")]
    pub id: String,
    /// Remote slug of a document (`url` on the wire). Empty for containers.
    #[serde(rename = "url", default, deserialize_with = "null_as_empty")]
    pub locator: String,
    /// Id of the parent entry (`parent_uuid` on the wire), or empty.
    #[serde(rename = "parent_uuid", default, deserialize_with = "null_as_empty")]
    pub parent_id: String,
}

impl CatalogRecord {
    /// Creates a record from its parts.
    pub fn new(
        kind: NodeKind,
        title: impl Into<String>,
        id: impl Into<String>,
        locator: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            id: id.into(),
            locator: locator.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Creates a container record.
    pub fn container(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self::new(NodeKind::Container, title, id, "", parent_id)
    }

    /// Creates a document record.
    pub fn document(
        id: impl Into<String>,
        title: impl Into<String>,
        locator: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self::new(NodeKind::Document, title, id, locator, parent_id)
    }

    /// Returns true for container entries.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// Returns true for document entries.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }
}

/// The listing body could not be decoded.
///
/// This is fatal for an export: without the listing no tree can be built.
#[derive(Debug, Error)]
#[error("catalog listing is not valid JSON of the expected shape: {source}")]
pub struct ListingParseError {
    #[source]
    source: serde_json::Error,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: Vec<CatalogRecord>,
}

/// Decodes a catalog listing body of shape `{ "data": [ ... ] }`.
///
/// # Errors
///
/// Returns [`ListingParseError`] if the body is not JSON, lacks the `data`
/// array, or an entry lacks its `type` or `uuid`.
pub fn parse_listing(body: &[u8]) -> Result<Vec<CatalogRecord>, ListingParseError> {
    let response: ListingResponse =
        serde_json::from_slice(body).map_err(|source| ListingParseError { source })?;
    debug!(records = response.data.len(), "decoded catalog listing");
    Ok(response.data)
}

// The listing sends `null` for absent strings on some entries.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_maps_wire_fields() {
        let body = br#"{"data":[
            {"type":"TITLE","title":"Guides","uuid":"A","url":"","parent_uuid":""},
            {"type":"DOC","title":"Intro","uuid":"B","url":"intro-x1","parent_uuid":"A"}
        ]}"#;

        let records = parse_listing(body).unwrap();

        assert_eq!(
            records,
            vec![
                CatalogRecord::container("A", "Guides", ""),
                CatalogRecord::document("B", "Intro", "intro-x1", "A"),
            ]
        );
    }

    #[test]
    fn test_parse_listing_null_and_missing_strings_become_empty() {
        let body = br#"{"data":[
            {"type":"DOC","title":null,"uuid":"B","url":null,"parent_uuid":null},
            {"type":"TITLE","uuid":"C"}
        ]}"#;

        let records = parse_listing(body).unwrap();

        assert_eq!(records[0].title, "");
        assert_eq!(records[0].locator, "");
        assert_eq!(records[0].parent_id, "");
        assert_eq!(records[1].title, "");
        assert!(records[1].is_container());
    }

    #[test]
    fn test_parse_listing_preserves_unknown_kind() {
        let body = br#"{"data":[{"type":"LINK","title":"x","uuid":"L","url":"https://a","parent_uuid":""}]}"#;

        let records = parse_listing(body).unwrap();

        assert_eq!(records[0].kind, NodeKind::Other("LINK".to_string()));
        assert_eq!(records[0].kind.as_wire(), "LINK");
        assert!(!records[0].is_document());
        assert!(!records[0].is_container());
    }

    #[test]
    fn test_parse_listing_ignores_extra_fields() {
        let body = br#"{"data":[{"type":"DOC","title":"t","uuid":"u","url":"s","parent_uuid":"","level":2}],"meta":{}}"#;
        assert_eq!(parse_listing(body).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_listing_empty_data() {
        assert!(parse_listing(br#"{"data":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_listing_rejects_non_json() {
        let error = parse_listing(b"<html>login required</html>").unwrap_err();
        assert!(error.to_string().contains("catalog listing"));
    }

    #[test]
    fn test_parse_listing_rejects_missing_data() {
        assert!(parse_listing(br#"{"items":[]}"#).is_err());
    }

    #[test]
    fn test_parse_listing_rejects_entry_without_uuid() {
        assert!(parse_listing(br#"{"data":[{"type":"DOC","title":"t"}]}"#).is_err());
    }

    #[test]
    fn test_node_kind_wire_round_trip() {
        assert_eq!(NodeKind::from_wire("TITLE"), NodeKind::Container);
        assert_eq!(NodeKind::from_wire("DOC"), NodeKind::Document);
        assert_eq!(NodeKind::Container.as_wire(), "TITLE");
        assert_eq!(NodeKind::Document.as_wire(), "DOC");
    }
}
