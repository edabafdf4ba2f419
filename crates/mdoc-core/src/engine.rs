//! Search index engine.
//!
//! [`SearchEngine`] walks a project outline, loads every distinct
//! referenced document, and builds an in-memory tantivy index over two
//! fields: the document title (boosted) and the raw body (with positional
//! recording). The index is an immutable value: [`SearchEngine::invalidate`]
//! only marks it stale, and the next query rebuilds it wholesale and swaps
//! the snapshot behind an `Arc`. At most one build is ever in flight -
//! queries arriving mid-build await the same shared future.

use crate::outline::OutlineNode;
use crate::parser::{MarkdownParser, ParseSink, SourceRange};
use crate::snippet::{self, SnippetOptions};
use crate::source::{DocumentLoader, OutlineProvider};
use crate::types::{IndexedDocument, MatchPosition, SearchResult};
use crate::{Error, Result};
use futures::FutureExt;
use futures::future::Shared;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, STORED, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, doc};
use tracing::{debug, info, warn};
use url::Url;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results returned per query.
    pub max_results: usize,
    /// Relevance multiplier for title-field matches.
    pub title_boost: f32,
    /// Snippet rendering parameters.
    pub snippet: SnippetOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 25,
            title_boost: 10.0,
            snippet: SnippetOptions::default(),
        }
    }
}

type BuildResult = std::result::Result<Arc<IndexSnapshot>, Arc<Error>>;
type SharedBuild = Shared<Pin<Box<dyn Future<Output = BuildResult> + Send>>>;

struct BuildHandle {
    generation: u64,
    future: SharedBuild,
}

#[derive(Default)]
struct EngineState {
    snapshot: Option<(u64, Arc<IndexSnapshot>)>,
    stale: bool,
    building: Option<BuildHandle>,
    next_generation: u64,
}

/// Full-text search over a documentation project.
pub struct SearchEngine {
    provider: Arc<dyn OutlineProvider>,
    loader: Arc<dyn DocumentLoader>,
    options: SearchOptions,
    state: Mutex<EngineState>,
}

impl SearchEngine {
    /// Create an engine over `provider`'s outline, loading documents
    /// through `loader`. No index is built until the first query.
    pub fn new(provider: Arc<dyn OutlineProvider>, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            provider,
            loader,
            options: SearchOptions::default(),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Replace the engine options.
    #[must_use]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Mark the current index stale. Idempotent and cheap: the rebuild is
    /// deferred to the next query. A build already in flight is not
    /// cancelled; it serves its waiters and the staleness applies after.
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.stale = true;
        }
    }

    /// Run `query` against the current index, rebuilding it first if it
    /// is stale or was never built.
    ///
    /// An empty (or whitespace) query returns no results without touching
    /// or building the index. A query the parser rejects yields
    /// [`Error::Query`], distinct from an empty result list.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.snapshot().await?;
        self.run_query(&snapshot, query)
    }

    /// Number of distinct documents in the index, building it if needed.
    pub async fn document_count(&self) -> Result<usize> {
        Ok(self.snapshot().await?.documents.len())
    }

    /// Get the current snapshot, or join/start a build.
    ///
    /// The lock is only held to inspect and update the state; waiting
    /// happens on the shared future so every concurrent caller awaits the
    /// same build. Generations guard against a slow waiter of an old
    /// build clobbering a newer snapshot.
    async fn snapshot(&self) -> Result<Arc<IndexSnapshot>> {
        let (generation, future) = {
            let mut state = self.lock_state()?;
            if !state.stale {
                if let Some((_, snapshot)) = &state.snapshot {
                    return Ok(Arc::clone(snapshot));
                }
            }
            if let Some(handle) = &state.building {
                (handle.generation, handle.future.clone())
            } else {
                let generation = state.next_generation;
                state.next_generation += 1;
                state.stale = false;
                let provider = Arc::clone(&self.provider);
                let loader = Arc::clone(&self.loader);
                let boxed: Pin<Box<dyn Future<Output = BuildResult> + Send>> =
                    Box::pin(async move {
                        build_snapshot(provider, loader)
                            .await
                            .map(Arc::new)
                            .map_err(Arc::new)
                    });
                let future = boxed.shared();
                state.building = Some(BuildHandle {
                    generation,
                    future: future.clone(),
                });
                (generation, future)
            }
        };

        let result = future.await;

        let mut state = self.lock_state()?;
        if state
            .building
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
        {
            state.building = None;
        }
        match result {
            Ok(snapshot) => {
                let newer = state
                    .snapshot
                    .as_ref()
                    .is_none_or(|(installed, _)| *installed < generation);
                if newer {
                    state.snapshot = Some((generation, Arc::clone(&snapshot)));
                }
                Ok(snapshot)
            },
            Err(e) => {
                // the attempt consumed the staleness flag at start; restore
                // it so the next query retries instead of serving old data
                let newer_exists = state
                    .snapshot
                    .as_ref()
                    .is_some_and(|(installed, _)| *installed > generation);
                if !newer_exists {
                    state.stale = true;
                }
                Err(Error::Index(format!("index build failed: {e}")))
            },
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| Error::Index("engine state poisoned".into()))
    }

    fn run_query(&self, snapshot: &IndexSnapshot, query_str: &str) -> Result<Vec<SearchResult>> {
        let started = Instant::now();
        let searcher = snapshot.reader.searcher();

        let mut query_parser = QueryParser::for_index(
            &snapshot.index,
            vec![snapshot.title_field, snapshot.body_field],
        );
        query_parser.set_field_boost(snapshot.title_field, self.options.title_boost);
        let query = query_parser
            .parse_query(query_str)
            .map_err(|e| Error::Query(e.to_string()))?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(self.options.max_results.max(1)))
            .map_err(|e| Error::Index(format!("search failed: {e}")))?;

        let terms = snippet::query_terms(query_str);
        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::Index(format!("failed to retrieve document: {e}")))?;
            let record = stored
                .get_first(snapshot.id_field)
                .and_then(|value| value.as_u64())
                .and_then(|id| usize::try_from(id).ok())
                .and_then(|id| snapshot.documents.get(id))
                .ok_or_else(|| Error::Index("document id missing from index".into()))?;

            let lists: Vec<Vec<MatchPosition>> = terms
                .iter()
                .map(|term| snippet::term_positions(&record.body, term))
                .filter(|list| !list.is_empty())
                .collect();
            let merged = snippet::merge_matches(&lists);
            let content = snippet::render_snippet(&record.body, &merged, &self.options.snippet);

            results.push(SearchResult {
                title: record.title.clone(),
                path: record.path.clone(),
                url: record.url.clone(),
                content,
                score,
            });
        }

        debug!(
            query = query_str,
            hits = results.len(),
            elapsed = ?started.elapsed(),
            "search complete"
        );
        Ok(results)
    }
}

/// One fully built, immutable index generation.
struct IndexSnapshot {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    title_field: Field,
    body_field: Field,
    documents: Vec<IndexedDocument>,
}

struct PendingDoc {
    url: Url,
    label: String,
    path: String,
}

async fn build_snapshot(
    provider: Arc<dyn OutlineProvider>,
    loader: Arc<dyn DocumentLoader>,
) -> Result<IndexSnapshot> {
    let started = Instant::now();
    let outline = provider.outline().await?;

    let mut schema_builder = Schema::builder();
    let id_field = schema_builder.add_u64_field("id", STORED);
    let title_field = schema_builder.add_text_field("title", TEXT);
    let body_field = schema_builder.add_text_field("body", TEXT);
    let schema = schema_builder.build();

    let index = Index::create_in_ram(schema);
    let mut writer = index
        .writer(50_000_000)
        .map_err(|e| Error::Index(format!("failed to create writer: {e}")))?;

    // root document first, then the outline in pre-order
    let mut pending = vec![PendingDoc {
        url: outline.root.clone(),
        label: outline.title.clone(),
        path: outline.title.clone(),
    }];
    let mut ancestors = Vec::new();
    collect_documents(&outline.nodes, &outline.root, &mut ancestors, &mut pending);

    let mut parser = MarkdownParser::new()?;
    let mut visited: HashSet<String> = HashSet::new();
    let mut documents: Vec<IndexedDocument> = Vec::new();

    for entry in pending {
        if !visited.insert(entry.url.as_str().to_string()) {
            continue;
        }
        let Some(bytes) = loader.load(&entry.url).await else {
            warn!(url = %entry.url, "document absent, skipped from index");
            continue;
        };
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let title = first_heading(&mut parser, &body).unwrap_or(entry.label);
        let id = documents.len() as u64;

        writer
            .add_document(doc!(
                id_field => id,
                title_field => title.as_str(),
                body_field => body.as_str()
            ))
            .map_err(|e| Error::Index(format!("failed to add document: {e}")))?;
        documents.push(IndexedDocument {
            id,
            title,
            path: entry.path,
            body,
            url: entry.url.to_string(),
        });
    }

    writer
        .commit()
        .map_err(|e| Error::Index(format!("failed to commit: {e}")))?;
    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::OnCommitWithDelay)
        .try_into()
        .map_err(|e| Error::Index(format!("failed to create reader: {e}")))?;

    info!(
        documents = documents.len(),
        elapsed = ?started.elapsed(),
        "search index built"
    );

    Ok(IndexSnapshot {
        index,
        reader,
        id_field,
        title_field,
        body_field,
        documents,
    })
}

/// Pre-order walk emitting one pending entry per document reference.
/// Duplicate canonical URLs are filtered later, at visit time.
fn collect_documents(
    nodes: &[OutlineNode],
    base: &Url,
    ancestors: &mut Vec<String>,
    out: &mut Vec<PendingDoc>,
) {
    for node in nodes {
        ancestors.push(node.label.clone());
        if let Some(href) = &node.doc_uri {
            match resolve(base, href) {
                Ok(url) => out.push(PendingDoc {
                    url,
                    label: node.label.clone(),
                    path: ancestors.join("/"),
                }),
                Err(e) => warn!(href = %href, "skipping unresolvable reference: {e}"),
            }
        }
        collect_documents(&node.children, base, ancestors, out);
        ancestors.pop();
    }
}

/// Canonicalize a document reference: resolve against the index
/// document's URL and strip any fragment, so `doc.md` and
/// `doc.md#section` are the same document.
fn resolve(base: &Url, href: &str) -> Result<Url> {
    let mut url = base.join(href)?;
    url.set_fragment(None);
    Ok(url)
}

/// Title of an indexed document: accumulated text of its first level-1
/// heading, if it has one.
fn first_heading(parser: &mut MarkdownParser, body: &str) -> Option<String> {
    #[derive(Default)]
    struct TitleSink {
        title: Option<String>,
        capturing: bool,
        buf: String,
    }
    impl ParseSink for TitleSink {
        fn enter_heading(&mut self, level: usize, _source: Option<SourceRange>) {
            if level == 1 && self.title.is_none() {
                self.capturing = true;
                self.buf.clear();
            }
        }
        fn leave_heading(&mut self, level: usize, _source: Option<SourceRange>) {
            if level == 1 && self.capturing {
                self.capturing = false;
                self.title = Some(self.buf.trim().to_string());
            }
        }
        fn text(&mut self, text: &str, _source: Option<SourceRange>) {
            if self.capturing {
                self.buf.push_str(text);
            }
        }
        fn link(&mut self, text: &str, _href: &str, _source: Option<SourceRange>) {
            if self.capturing {
                self.buf.push_str(text);
            }
        }
        fn code(&mut self, code: &str, _source: Option<SourceRange>) {
            if self.capturing {
                self.buf.push_str(code);
            }
        }
    }

    let mut sink = TitleSink::default();
    parser.parse(body, &mut sink);
    sink.title.filter(|title| !title.is_empty())
}
