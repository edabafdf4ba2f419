//! # mdoc-core
//!
//! Core functionality for mdoc - a documentation browser that turns a tree
//! of markdown files into a navigable outline and a searchable full-text
//! index with highlighted, context-bounded snippets.
//!
//! ## Architecture
//!
//! The crate is organized around a few key components:
//!
//! - **Parsing**: a tree-sitter based structural markdown parser that
//!   reports headings, lists and inline content to listener traits
//! - **Outline**: reconstruction of a project's document tree from the
//!   nested list markup of its index document
//! - **Sources**: narrow traits for loading documents and obtaining the
//!   outline, with filesystem and in-memory implementations
//! - **Engine**: an in-memory tantivy index over every document the
//!   outline reaches, rebuilt wholesale on invalidation
//! - **Snippets**: k-way merging of per-term match positions and
//!   rendering of highlighted context windows
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdoc_core::{DocProject, FsLoader, SearchEngine};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> mdoc_core::Result<()> {
//! let loader = Arc::new(FsLoader);
//! let project = Arc::new(DocProject::from_dir(loader.clone(), Path::new("docs"))?);
//!
//! let engine = SearchEngine::new(project, loader);
//! for hit in engine.search("install").await? {
//!     println!("{} ({}): {}", hit.title, hit.path, hit.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Index lifecycle
//!
//! The index is an immutable value. [`SearchEngine::invalidate`] marks it
//! stale; the next query rebuilds it from scratch and swaps the snapshot.
//! Queries arriving while a build is running all await that same build -
//! there is never more than one in flight.

/// Configuration loaded from `mdoc.toml`
pub mod config;
/// Search index engine
pub mod engine;
/// Error types and result aliases
pub mod error;
/// Project outline extraction
pub mod outline;
/// Tree-sitter based structural markdown parser
pub mod parser;
/// Match merging and snippet rendering
pub mod snippet;
/// Document loaders and outline providers
pub mod source;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use config::{Config, SearchConfig, SnippetConfig};
pub use engine::{SearchEngine, SearchOptions};
pub use error::{Error, Result};
pub use outline::{Outline, OutlineNode, extract_outline};
pub use parser::{MarkdownParser, ParseSink, SourceRange};
pub use snippet::{SnippetOptions, merge_matches, render_snippet};
pub use source::{
    DocProject, DocumentLoader, FsLoader, MemoryLoader, OutlineProvider, ProjectOutline,
};
pub use types::{IndexedDocument, MatchPosition, SearchResult};
