//! Core data types shared across the search engine and its hosts.

use serde::{Deserialize, Serialize};

/// One document admitted into a search index build.
///
/// Owned by the index snapshot; `id` is the build-local monotonic
/// identifier stored in the index and used to resolve hits back to this
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Build-local identifier, assigned in visit order starting at 0.
    pub id: u64,
    /// First level-1 heading of the document, or its outline label.
    pub title: String,
    /// Hierarchical position label: ancestor labels joined with `/`.
    pub path: String,
    /// Raw markdown body, unescaped. Match offsets index into this string.
    pub body: String,
    /// Canonical URL, stable across builds; hosts use it to re-open the
    /// document and the engine uses it to deduplicate outline references.
    pub url: String,
}

/// A ranked search hit, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document title.
    pub title: String,
    /// Hierarchical position of the document in the outline.
    pub path: String,
    /// Canonical URL for linking back to the document.
    pub url: String,
    /// HTML-escaped snippet with highlight markers already injected.
    pub content: String,
    /// Relevance score from the index, descending across a result list.
    pub score: f32,
}

/// One occurrence of a matched term in a document body.
///
/// Offsets are byte positions into the original body string and are never
/// shifted by rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPosition {
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Length of the matched substring in bytes; always > 0.
    pub len: usize,
}

impl MatchPosition {
    /// Byte offset one past the last matched byte.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}
