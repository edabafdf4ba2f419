//! Document sources and outline providers.
//!
//! A documentation project is addressed through two narrow traits:
//! [`DocumentLoader`] retrieves raw document bytes by canonical URL, and
//! [`OutlineProvider`] produces the project outline the index build walks.
//! Load failures are reported as "absent" - a missing document is never
//! fatal to anything but itself.

use crate::outline::{OutlineNode, extract_outline};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;
use url::Url;

/// Retrieves document content by canonical URL.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `url`, or `None` if it is absent or
    /// unreadable. Implementations log failures; callers only skip.
    async fn load(&self, url: &Url) -> Option<Vec<u8>>;
}

/// Filesystem-backed loader for `file://` URLs.
///
/// The production loader: documentation projects live in local
/// checkouts, and keeping retrieval behind [`DocumentLoader`] leaves room
/// for hosts that fetch from elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

#[async_trait]
impl DocumentLoader for FsLoader {
    async fn load(&self, url: &Url) -> Option<Vec<u8>> {
        if url.scheme() != "file" {
            warn!(%url, "unsupported scheme, treating document as absent");
            return None;
        }
        let path = url.to_file_path().ok()?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), "failed to read document: {e}");
                None
            },
        }
    }
}

/// Mutable in-memory loader keyed by canonical URL string.
///
/// Used by tests and embedding hosts that hold documents in memory;
/// contents can change between index builds.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    docs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document at `url`.
    pub fn insert(&self, url: &Url, content: impl Into<Vec<u8>>) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(url.as_str().to_string(), content.into());
        }
    }

    /// Remove the document at `url`, if present.
    pub fn remove(&self, url: &Url) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.remove(url.as_str());
        }
    }
}

#[async_trait]
impl DocumentLoader for MemoryLoader {
    async fn load(&self, url: &Url) -> Option<Vec<u8>> {
        self.docs.lock().ok()?.get(url.as_str()).cloned()
    }
}

/// An extracted project outline together with its resolution base.
#[derive(Debug, Clone)]
pub struct ProjectOutline {
    /// Project title from the index document (or the project fallback).
    pub title: String,
    /// Canonical URL of the index document; relative references in the
    /// outline resolve against it.
    pub root: Url,
    /// The outline forest.
    pub nodes: Vec<OutlineNode>,
}

/// Produces the current outline of a documentation project.
///
/// Hosts re-trigger extraction (and invalidate the search index) when the
/// underlying index document changes; failure here is fatal to a single
/// index build attempt and retried on the next one.
#[async_trait]
pub trait OutlineProvider: Send + Sync {
    /// Extract the project outline.
    async fn outline(&self) -> Result<ProjectOutline>;
}

/// A documentation project rooted at a base URL.
///
/// The project structure is declared in an index document (`index.md` by
/// default) next to the documents it links.
pub struct DocProject {
    loader: Arc<dyn DocumentLoader>,
    base: Url,
    index_doc: String,
    fallback_title: String,
}

impl DocProject {
    /// Create a project rooted at `base` (a directory URL).
    pub fn new(loader: Arc<dyn DocumentLoader>, base: Url) -> Self {
        let fallback_title = default_title(&base);
        Self {
            loader,
            base,
            index_doc: "index.md".to_string(),
            fallback_title,
        }
    }

    /// Create a project for a local directory.
    pub fn from_dir(loader: Arc<dyn DocumentLoader>, dir: &Path) -> Result<Self> {
        let dir = dir.canonicalize()?;
        let base = Url::from_directory_path(&dir)
            .map_err(|()| Error::InvalidUrl(format!("not a directory path: {}", dir.display())))?;
        Ok(Self::new(loader, base))
    }

    /// Use a different index document name.
    #[must_use]
    pub fn with_index_doc(mut self, name: impl Into<String>) -> Self {
        self.index_doc = name.into();
        self
    }

    /// Use a different fallback title for projects whose index document
    /// has no level-1 heading.
    #[must_use]
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    /// The project's base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl OutlineProvider for DocProject {
    async fn outline(&self) -> Result<ProjectOutline> {
        let root = self.base.join(&self.index_doc)?;
        let bytes = self
            .loader
            .load(&root)
            .await
            .ok_or_else(|| Error::NotFound(format!("index document {root}")))?;
        let text = String::from_utf8_lossy(&bytes);
        let outline = extract_outline(&text, &self.fallback_title);
        Ok(ProjectOutline {
            title: outline.title,
            root,
            nodes: outline.nodes,
        })
    }
}

/// Last non-empty path segment of the base URL, as a display fallback.
fn default_title(base: &Url) -> String {
    base.path_segments()
        .and_then(|segments| {
            segments
                .rev()
                .find(|segment| !segment.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Documentation".to_string())
}
