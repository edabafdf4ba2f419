//! Project outline extraction.
//!
//! The outline of a documentation project is declared in its index
//! document as nested markdown lists: each list item becomes a node, an
//! item's first link supplies the document it points at, and nested lists
//! become child forests. [`extract_outline`] drives the structural parser
//! over the index document and reconstructs that tree.

use crate::parser::{MarkdownParser, ParseSink, SourceRange};
use serde::{Deserialize, Serialize};

/// One node of the project outline.
///
/// A node without a `doc_uri` is a pure grouping label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Display label, accumulated from the owning list item's inline text.
    pub label: String,
    /// Target document reference (the first link's href), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_uri: Option<String>,
    /// Child nodes from lists nested under the owning item.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<OutlineNode>,
}

/// An extracted outline: project title plus the root forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Title from the index document's first level-1 heading, or the
    /// caller-supplied fallback.
    pub title: String,
    /// Top-level outline nodes. Empty when the index document has no
    /// lists, which is valid.
    pub nodes: Vec<OutlineNode>,
}

/// Extract the outline of `text`, an index document.
///
/// Deterministic: the same bytes always produce the same tree. The
/// previous outline of a project is expected to be discarded wholesale
/// and replaced with the result.
pub fn extract_outline(text: &str, fallback_title: &str) -> Outline {
    let mut builder = OutlineBuilder::default();
    match MarkdownParser::new() {
        Ok(mut parser) => parser.parse(text, &mut builder),
        Err(e) => tracing::warn!("outline parser unavailable: {e}"),
    }
    builder.finish(fallback_title)
}

/// Tree-building state, threaded explicitly through the parse.
///
/// `forests[0]` is the root forest; each deeper entry collects the
/// children of the last node appended to the forest below it. The last
/// node of the top forest is the "current" node that an incoming nested
/// list attaches to.
#[derive(Default)]
struct OutlineBuilder {
    forests: Vec<Vec<OutlineNode>>,
    has_current: bool,
    item_open: bool,
    title: Option<String>,
    capturing_title: bool,
    title_buf: String,
}

impl OutlineBuilder {
    fn finish(mut self, fallback_title: &str) -> Outline {
        while self.forests.len() > 1 {
            self.attach_top();
        }
        Outline {
            title: self
                .title
                .unwrap_or_else(|| fallback_title.to_string()),
            nodes: self.forests.pop().unwrap_or_default(),
        }
    }

    /// Pop the active forest and attach it as children of the node that
    /// opened it.
    fn attach_top(&mut self) {
        let children = self.forests.pop().unwrap_or_default();
        if let Some(parent) = self.forests.last_mut().and_then(|f| f.last_mut()) {
            parent.children = children;
        }
    }

    /// The node of the most recently opened list item.
    fn current_node(&mut self) -> Option<&mut OutlineNode> {
        self.forests.last_mut().and_then(|f| f.last_mut())
    }

    fn accumulate(&mut self, text: &str) {
        if self.capturing_title {
            self.title_buf.push_str(text);
        } else if self.item_open {
            if let Some(node) = self.current_node() {
                node.label.push_str(text);
            }
        }
    }
}

impl ParseSink for OutlineBuilder {
    fn enter_heading(&mut self, level: usize, _source: Option<SourceRange>) {
        if level == 1 && self.title.is_none() {
            self.capturing_title = true;
            self.title_buf.clear();
        }
    }

    fn leave_heading(&mut self, level: usize, _source: Option<SourceRange>) {
        if level == 1 && self.capturing_title {
            self.capturing_title = false;
            self.title = Some(self.title_buf.trim().to_string());
        }
    }

    fn enter_list(&mut self, _depth: usize, _source: Option<SourceRange>) {
        if self.forests.is_empty() {
            self.forests.push(Vec::new());
        }
        if self.has_current {
            // nested list: collect into the current node's child forest
            self.forests.push(Vec::new());
        } else {
            // top-level (or stray) list: collect into the root forest
            while self.forests.len() > 1 {
                self.attach_top();
            }
        }
        self.has_current = false;
    }

    fn leave_list(&mut self, _depth: usize, _source: Option<SourceRange>) {
        if self.forests.len() > 1 {
            self.attach_top();
        }
        // a list item's scope ends with its list
        self.has_current = false;
    }

    fn enter_list_item(&mut self, _source: Option<SourceRange>) {
        if self.forests.is_empty() {
            self.forests.push(Vec::new());
        }
        if let Some(forest) = self.forests.last_mut() {
            forest.push(OutlineNode {
                label: String::new(),
                doc_uri: None,
                children: Vec::new(),
            });
        }
        self.has_current = true;
        self.item_open = true;
    }

    fn leave_list_item(&mut self, _source: Option<SourceRange>) {
        // stop accumulating; late text is never attributed to this item
        if self.item_open {
            if let Some(node) = self.current_node() {
                let trimmed = node.label.trim();
                if trimmed.len() != node.label.len() {
                    node.label = trimmed.to_string();
                }
            }
        }
        self.item_open = false;
    }

    fn text(&mut self, text: &str, _source: Option<SourceRange>) {
        self.accumulate(text);
    }

    fn link(&mut self, text: &str, href: &str, _source: Option<SourceRange>) {
        if self.capturing_title {
            self.title_buf.push_str(text);
            return;
        }
        if self.item_open {
            let href = href.to_string();
            if let Some(node) = self.current_node() {
                if node.doc_uri.is_none() {
                    node.doc_uri = Some(href);
                }
                node.label.push_str(text);
            }
        }
    }

    fn code(&mut self, code: &str, _source: Option<SourceRange>) {
        self.accumulate(code);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(label: &str, doc_uri: Option<&str>, children: Vec<OutlineNode>) -> OutlineNode {
        OutlineNode {
            label: label.to_string(),
            doc_uri: doc_uri.map(String::from),
            children,
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "# Docs\n- [Intro](intro.md)\n- Guides\n  - [Setup](setup.md)\n";
        let first = extract_outline(text, "fallback");
        let second = extract_outline(text, "fallback");
        assert_eq!(first, second);
    }

    #[test]
    fn link_item_becomes_document_node() {
        let outline = extract_outline("- [Foo](bar.md)\n", "docs");
        assert_eq!(outline.nodes, vec![node("Foo", Some("bar.md"), vec![])]);
    }

    #[test]
    fn readme_scenario() {
        let text = "# Docs\n- [Intro](intro.md)\n- Guides\n  - [Setup](setup.md)\n";
        let outline = extract_outline(text, "fallback");
        assert_eq!(outline.title, "Docs");
        assert_eq!(
            outline.nodes,
            vec![
                node("Intro", Some("intro.md"), vec![]),
                node(
                    "Guides",
                    None,
                    vec![node("Setup", Some("setup.md"), vec![])]
                ),
            ]
        );
    }

    #[test]
    fn title_falls_back_without_h1() {
        let outline = extract_outline("## Only a subtitle\n- [A](a.md)\n", "Project");
        assert_eq!(outline.title, "Project");
    }

    #[test]
    fn first_h1_wins() {
        let outline = extract_outline("# First\n\n# Second\n", "x");
        assert_eq!(outline.title, "First");
    }

    #[test]
    fn no_lists_is_a_valid_empty_forest() {
        let outline = extract_outline("# Title\n\njust prose\n", "x");
        assert_eq!(outline.title, "Title");
        assert!(outline.nodes.is_empty());
    }

    #[test]
    fn label_mixes_text_and_link_in_document_order() {
        let outline = extract_outline("- see [Guide](guide.md) first\n", "x");
        assert_eq!(
            outline.nodes,
            vec![node("see Guide first", Some("guide.md"), vec![])]
        );
    }

    #[test]
    fn first_link_supplies_the_uri() {
        let outline = extract_outline("- [A](a.md) or [B](b.md)\n", "x");
        assert_eq!(outline.nodes.len(), 1);
        assert_eq!(outline.nodes[0].doc_uri.as_deref(), Some("a.md"));
        assert_eq!(outline.nodes[0].label, "A or B");
    }

    #[test]
    fn deep_nesting_matches_list_depth() {
        let text = "- a\n  - b\n    - c\n";
        let outline = extract_outline(text, "x");
        assert_eq!(
            outline.nodes,
            vec![node(
                "a",
                None,
                vec![node("b", None, vec![node("c", None, vec![])])]
            )]
        );
    }

    #[test]
    fn sibling_items_after_nested_list() {
        let text = "- a\n  - b\n- c\n";
        let outline = extract_outline(text, "x");
        assert_eq!(
            outline.nodes,
            vec![
                node("a", None, vec![node("b", None, vec![])]),
                node("c", None, vec![]),
            ]
        );
    }

    #[test]
    fn item_with_only_a_nested_list_is_an_unlabeled_group() {
        let outline = extract_outline("-\n  - [A](a.md)\n", "x");
        assert_eq!(
            outline.nodes,
            vec![node("", None, vec![node("A", Some("a.md"), vec![])])]
        );
    }

    #[test]
    fn code_span_contributes_to_label() {
        let outline = extract_outline("- the `config` file\n", "x");
        assert_eq!(outline.nodes[0].label, "the config file");
    }

    #[test]
    fn heading_link_contributes_visible_text_to_title() {
        let outline = extract_outline("# See [Home](home.md)\n", "x");
        assert_eq!(outline.title, "See Home");
    }
}
