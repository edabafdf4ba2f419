//! Configuration for documentation projects.
//!
//! Settings live in an optional `mdoc.toml` next to the project's index
//! document. Every field has a default, so a missing or partial file is
//! fine:
//!
//! ```toml
//! [search]
//! max_results = 25
//! title_boost = 10.0
//! index_doc = "index.md"
//!
//! [snippet]
//! context_lines = 4
//! max_line_len = 80
//! ```

use crate::snippet::SnippetOptions;
use crate::{Result, engine::SearchOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration, deserialized from `mdoc.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search engine settings.
    pub search: SearchConfig,
    /// Snippet rendering settings.
    pub snippet: SnippetConfig,
}

/// Settings for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of results returned per query.
    pub max_results: usize,
    /// Relevance multiplier for title matches relative to body matches.
    pub title_boost: f32,
    /// Name of the index document the outline is extracted from.
    pub index_doc: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 25,
            title_boost: 10.0,
            index_doc: "index.md".to_string(),
        }
    }
}

/// Settings for snippet rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Number of lines a context window may span.
    pub context_lines: usize,
    /// Maximum scanned length of a single line, in bytes.
    pub max_line_len: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        let defaults = SnippetOptions::default();
        Self {
            context_lines: defaults.context_lines,
            max_line_len: defaults.max_line_len,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load `mdoc.toml` from a project directory, falling back to
    /// defaults when the file does not exist.
    pub fn load_for_project(dir: &Path) -> Result<Self> {
        let path = dir.join("mdoc.toml");
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Engine options derived from this configuration.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.search.max_results,
            title_boost: self.search.title_boost,
            snippet: SnippetOptions {
                context_lines: self.snippet.context_lines,
                max_line_len: self.snippet.max_line_len,
                ..SnippetOptions::default()
            },
        }
    }
}
