//! Tree-sitter based structural markdown parser.
//!
//! [`MarkdownParser::parse`] walks a document in a single forward pass and
//! reports structure (headings, lists, list items) and inline content
//! (text runs, links, code spans) to a caller-supplied [`ParseSink`].
//! Consumers override only the callbacks they care about; every other
//! event is silently skipped by the default no-op methods.

use crate::{Error, Result};
use tree_sitter::{Node, Parser};

/// Best-effort source location of an event, in zero-based line coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    /// First line of the originating syntax node.
    pub start_line: usize,
    /// Last line of the originating syntax node.
    pub end_line: usize,
}

impl SourceRange {
    fn of(node: Node<'_>) -> Option<Self> {
        Some(Self {
            start_line: node.start_position().row,
            end_line: node.end_position().row,
        })
    }
}

/// Receiver for the parser's event stream.
///
/// All methods default to no-ops. Inline content (text, link text, code
/// spans) arrives as a flat run between the enclosing enter/leave pair;
/// a consumer accumulating region text must stop at the leave event.
#[allow(unused_variables)]
pub trait ParseSink {
    /// A heading opened. `level` is the numeric depth, 1 = top-level.
    fn enter_heading(&mut self, level: usize, source: Option<SourceRange>) {}
    /// The heading at `level` closed.
    fn leave_heading(&mut self, level: usize, source: Option<SourceRange>) {}
    /// A list opened. `depth` starts at 1 and counts nesting.
    fn enter_list(&mut self, depth: usize, source: Option<SourceRange>) {}
    /// The list at `depth` closed.
    fn leave_list(&mut self, depth: usize, source: Option<SourceRange>) {}
    /// A list item opened.
    fn enter_list_item(&mut self, source: Option<SourceRange>) {}
    /// The current list item closed.
    fn leave_list_item(&mut self, source: Option<SourceRange>) {}
    /// A run of plain text.
    fn text(&mut self, text: &str, source: Option<SourceRange>) {}
    /// A link; `text` is the visible label, `href` the destination.
    fn link(&mut self, text: &str, href: &str, source: Option<SourceRange>) {}
    /// A code span or code block, delimiters stripped.
    fn code(&mut self, code: &str, source: Option<SourceRange>) {}
}

/// Structural markdown parser.
///
/// Holds one tree-sitter parser for the block grammar and one for the
/// inline grammar; `inline` regions found in the block tree are re-parsed
/// so links and code spans are real syntax nodes.
pub struct MarkdownParser {
    block: Parser,
    inline: Parser,
}

impl MarkdownParser {
    /// Create a parser. Fails only if a grammar cannot be loaded.
    pub fn new() -> Result<Self> {
        let mut block = Parser::new();
        block
            .set_language(&tree_sitter_md::LANGUAGE.into())
            .map_err(|e| Error::Parse(format!("failed to set block language: {e}")))?;

        let mut inline = Parser::new();
        inline
            .set_language(&tree_sitter_md::INLINE_LANGUAGE.into())
            .map_err(|e| Error::Parse(format!("failed to set inline language: {e}")))?;

        Ok(Self { block, inline })
    }

    /// Parse `text`, delivering events to `sink`.
    ///
    /// Never fails: malformed markdown degrades to a best-effort event
    /// stream, and an unparseable document simply produces no events.
    pub fn parse(&mut self, text: &str, sink: &mut dyn ParseSink) {
        let Some(tree) = self.block.parse(text, None) else {
            return;
        };
        let mut depth = 0usize;
        self.walk_block(tree.root_node(), text, &mut depth, sink);
    }

    fn walk_block(&mut self, node: Node<'_>, text: &str, depth: &mut usize, sink: &mut dyn ParseSink) {
        match node.kind() {
            "atx_heading" | "setext_heading" => {
                let level = heading_level(node);
                let range = SourceRange::of(node);
                sink.enter_heading(level, range);
                self.walk_children(node, text, depth, sink);
                sink.leave_heading(level, range);
            },
            "list" => {
                *depth += 1;
                let range = SourceRange::of(node);
                sink.enter_list(*depth, range);
                self.walk_children(node, text, depth, sink);
                sink.leave_list(*depth, range);
                // clamp at zero so unmatched closes are absorbed
                *depth = depth.saturating_sub(1);
            },
            "list_item" => {
                let range = SourceRange::of(node);
                sink.enter_list_item(range);
                self.walk_children(node, text, depth, sink);
                sink.leave_list_item(range);
            },
            "inline" => {
                self.emit_inline(node, text, sink);
            },
            "fenced_code_block" | "indented_code_block" => {
                let range = SourceRange::of(node);
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "code_fence_content" {
                        sink.code(&text[child.byte_range()], range);
                        return;
                    }
                }
                if node.kind() == "indented_code_block" {
                    sink.code(&text[node.byte_range()], range);
                }
            },
            _ => {
                self.walk_children(node, text, depth, sink);
            },
        }
    }

    fn walk_children(
        &mut self,
        node: Node<'_>,
        text: &str,
        depth: &mut usize,
        sink: &mut dyn ParseSink,
    ) {
        let mut cursor = node.walk();
        // collect first: walking and re-parsing inline regions both need
        // the cursor, and Node is Copy
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            self.walk_block(child, text, depth, sink);
        }
    }

    /// Re-parse an `inline` region with the inline grammar and emit
    /// text/link/code events. Falls back to one raw text event when the
    /// inline parse yields nothing.
    fn emit_inline(&mut self, node: Node<'_>, text: &str, sink: &mut dyn ParseSink) {
        let region = text[node.byte_range()].trim_end_matches(['\r', '\n']);
        let range = SourceRange::of(node);
        let Some(tree) = self.inline.parse(region, None) else {
            emit_text(region, range, sink);
            return;
        };
        walk_inline(tree.root_node(), region, range, sink);
    }
}

/// Emit events for one inline-grammar node. Plain text is the gap between
/// recognized constructs; unrecognized constructs fall into the gaps and
/// so degrade to raw text.
fn walk_inline(node: Node<'_>, region: &str, range: Option<SourceRange>, sink: &mut dyn ParseSink) {
    let mut pos = node.start_byte();
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "inline_link" => {
                emit_text(&region[pos..child.start_byte()], range, sink);
                emit_link(child, region, range, sink);
                pos = child.end_byte();
            },
            "code_span" => {
                emit_text(&region[pos..child.start_byte()], range, sink);
                let span = &region[child.byte_range()];
                sink.code(span.trim_matches('`'), range);
                pos = child.end_byte();
            },
            "emphasis" | "strong_emphasis" => {
                emit_text(&region[pos..child.start_byte()], range, sink);
                walk_inline(child, region, range, sink);
                pos = child.end_byte();
            },
            "emphasis_delimiter" => {
                emit_text(&region[pos..child.start_byte()], range, sink);
                pos = child.end_byte();
            },
            _ => {
                // leave bytes in place; they join the next text gap
            },
        }
    }
    emit_text(&region[pos..node.end_byte()], range, sink);
}

fn emit_link(node: Node<'_>, region: &str, range: Option<SourceRange>, sink: &mut dyn ParseSink) {
    let mut label = "";
    let mut href = "";
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "link_text" => label = &region[child.byte_range()],
            "link_destination" => href = &region[child.byte_range()],
            _ => {},
        }
    }
    sink.link(label, href, range);
}

fn emit_text(text: &str, range: Option<SourceRange>, sink: &mut dyn ParseSink) {
    if !text.is_empty() {
        sink.text(text, range);
    }
}

fn heading_level(node: Node<'_>) -> usize {
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "atx_h1_marker" | "setext_h1_underline" => return 1,
            "atx_h2_marker" | "setext_h2_underline" => return 2,
            "atx_h3_marker" => return 3,
            "atx_h4_marker" => return 4,
            "atx_h5_marker" => return 5,
            "atx_h6_marker" => return 6,
            _ => {},
        }
    }
    1
}
