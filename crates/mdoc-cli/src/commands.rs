//! Command implementations.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use mdoc_core::{Config, DocProject, FsLoader, OutlineNode, OutlineProvider, SearchEngine};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

const ANSI_HIGHLIGHT: (&str, &str) = ("\u{1b}[1;33m", "\u{1b}[0m");

fn open_project(dir: &Path, config: &Config, loader: Arc<FsLoader>) -> Result<Arc<DocProject>> {
    let project = DocProject::from_dir(loader, dir)
        .with_context(|| format!("cannot open project at '{}'", dir.display()))?
        .with_index_doc(config.search.index_doc.clone());
    Ok(Arc::new(project))
}

/// Print the outline of the project at `dir`.
pub async fn outline(dir: &Path, format: OutputFormat) -> Result<()> {
    let config = Config::load_for_project(dir)?;
    let project = open_project(dir, &config, Arc::new(FsLoader))?;
    let outline = project.outline().await?;

    match format {
        OutputFormat::Json => {
            let value = json!({ "title": outline.title, "nodes": outline.nodes });
            println!("{}", serde_json::to_string_pretty(&value)?);
        },
        OutputFormat::Text => {
            println!("{}", outline.title);
            print_nodes(&outline.nodes, 1);
        },
    }
    Ok(())
}

fn print_nodes(nodes: &[OutlineNode], depth: usize) {
    for node in nodes {
        let target = node
            .doc_uri
            .as_ref()
            .map(|uri| format!(" ({uri})"))
            .unwrap_or_default();
        println!("{:indent$}- {}{}", "", node.label, target, indent = depth * 2);
        print_nodes(&node.children, depth + 1);
    }
}

/// Search the project at `dir` and print ranked snippets.
pub async fn search(
    dir: &Path,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let config = Config::load_for_project(dir)?;
    let mut options = config.search_options();
    if let Some(limit) = limit {
        options.max_results = limit;
    }
    if format == OutputFormat::Text {
        options.snippet.highlight = (ANSI_HIGHLIGHT.0.to_string(), ANSI_HIGHLIGHT.1.to_string());
    }

    let loader = Arc::new(FsLoader);
    let project = open_project(dir, &config, Arc::clone(&loader))?;
    let engine = SearchEngine::new(project, loader).with_options(options);
    let results = engine.search(query).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            if results.is_empty() {
                println!("no results for '{query}'");
                return Ok(());
            }
            for hit in &results {
                println!("{} ({})", hit.title, hit.path);
                println!("  {}", hit.url);
                for line in hit.content.lines() {
                    println!("  {line}");
                }
                println!();
            }
        },
    }
    Ok(())
}
