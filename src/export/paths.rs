//! Safe, collision-resistant names for exported directories and files.
//!
//! Remote titles are free text. Before they become path segments, characters
//! that are illegal or risky on common filesystems are replaced with `_`,
//! surrounding whitespace is trimmed, and a segment made only of dots is
//! neutralised so it can never mean "this" or "parent" directory.

use std::path::{Path, PathBuf};

/// Replacement for every rejected character.
pub const PLACEHOLDER: char = '_';

/// Name used when a title sanitizes to nothing.
pub const UNTITLED: &str = "UNTITLED";

/// Extension of exported documents.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Separator between the title and the disambiguating suffix of a file name.
const SUFFIX_SEPARATOR: &str = "__";

/// Replaces every character illegal in a path segment with [`PLACEHOLDER`].
///
/// Rejected: `< > : " / \ | ? *` and ASCII control characters. Everything
/// else, including non-ASCII text, passes through unchanged. No trimming.
///
/// ```
/// use kb_export_core::export::paths::sanitize;
///
/// assert_eq!(sanitize("a/b: c?"), "a_b_ c_");
/// assert_eq!(sanitize("读书笔记"), "读书笔记");
/// ```
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_rejected(c) { PLACEHOLDER } else { c })
        .collect()
}

/// Returns the sanitized, trimmed `title`, or `fallback` if nothing remains.
///
/// ```
/// use kb_export_core::export::paths::safe_name;
///
/// assert_eq!(safe_name("  Guides  ", "UNTITLED"), "Guides");
/// assert_eq!(safe_name("   ", "UNTITLED"), "UNTITLED");
/// assert_eq!(safe_name("..", "UNTITLED"), "__");
/// ```
#[must_use]
pub fn safe_name(title: &str, fallback: &str) -> String {
    let cleaned = clean_segment(title);
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Returns the output path of a document inside `dir`.
///
/// The file is named `<title>__<suffix>.md`, where the suffix is the cleaned
/// `locator`, or the cleaned `id` when the locator is empty. Two documents
/// with the same title but different locators (or ids) never share a path,
/// and the name is the same on every run.
///
/// ```
/// use std::path::Path;
/// use kb_export_core::export::paths::unique_path;
///
/// let path = unique_path(Path::new("/out/Guides"), "Intro", "intro-x1", "B");
/// assert_eq!(path, Path::new("/out/Guides/Intro__intro-x1.md"));
/// ```
#[must_use]
pub fn unique_path(dir: &Path, title: &str, locator: &str, id: &str) -> PathBuf {
    let name = safe_name(title, UNTITLED);

    let mut suffix = clean_segment(locator);
    if suffix.is_empty() {
        suffix = clean_segment(id);
    }

    let file_name = if suffix.is_empty() {
        format!("{name}.{MARKDOWN_EXTENSION}")
    } else {
        format!("{name}{SUFFIX_SEPARATOR}{suffix}.{MARKDOWN_EXTENSION}")
    };
    dir.join(file_name)
}

fn is_rejected(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_ascii_control()
}

fn clean_segment(raw: &str) -> String {
    let sanitized = sanitize(raw);
    let trimmed = sanitized.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c == '.') {
        return PLACEHOLDER.to_string().repeat(trimmed.len());
    }
    trimmed.to_string()
}
