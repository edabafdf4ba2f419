//! Match merging and context-bounded snippet rendering.
//!
//! A search hit carries one ascending position list per matched term.
//! [`merge_matches`] folds those lists into a single ascending stream with
//! a k-way merge, and [`render_snippet`] cuts a minimal multi-line window
//! around the earliest match and injects highlight markers into
//! HTML-escaped text. Offsets always index the original body string;
//! rendering never mutates or shifts the source.

use crate::types::MatchPosition;

/// Snippet rendering parameters.
#[derive(Debug, Clone)]
pub struct SnippetOptions {
    /// Number of lines the context window may span.
    pub context_lines: usize,
    /// Maximum scanned length of a single line, in bytes.
    pub max_line_len: usize,
    /// Marker placed where the window was clamped mid-line.
    pub ellipsis: char,
    /// Opening and closing highlight markers wrapped around matches.
    pub highlight: (String, String),
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            context_lines: 4,
            max_line_len: 80,
            ellipsis: '\u{2026}',
            highlight: ("<mark>".to_string(), "</mark>".to_string()),
        }
    }
}

/// Merge per-term position lists into one ascending stream.
///
/// Classic k-way merge: one cursor per list, repeatedly emit the smallest
/// front and advance only that cursor. Runs in O(k * total) without
/// re-sorting the combined stream, so it scales to many terms. Input lists
/// must each be ascending, which the token scan guarantees.
#[must_use]
pub fn merge_matches(lists: &[Vec<MatchPosition>]) -> Vec<MatchPosition> {
    let total = lists.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut cursors = vec![0usize; lists.len()];

    loop {
        let mut best: Option<usize> = None;
        for (i, list) in lists.iter().enumerate() {
            if cursors[i] >= list.len() {
                continue;
            }
            let candidate = list[cursors[i]].start;
            match best {
                Some(b) if lists[b][cursors[b]].start <= candidate => {},
                _ => best = Some(i),
            }
        }
        let Some(i) = best else { break };
        merged.push(lists[i][cursors[i]]);
        cursors[i] += 1;
    }
    merged
}

/// Whole-token occurrences of `term` in `body`, ascending.
///
/// `term` must already be lowercase. Tokens are maximal alphanumeric runs,
/// mirroring the index tokenizer, so `cat` does not match inside
/// `catalog`.
#[must_use]
pub fn term_positions(body: &str, term: &str) -> Vec<MatchPosition> {
    let mut positions = Vec::new();
    for (start, token) in tokens(body) {
        if token.to_lowercase() == term {
            positions.push(MatchPosition {
                start,
                len: token.len(),
            });
        }
    }
    positions
}

/// Lowercased distinct terms of a query string, in first-seen order.
#[must_use]
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for (_, token) in tokens(query) {
        let term = token.to_lowercase();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Render the context window around the first match of an ascending,
/// non-overlapping match stream, highlighting every match inside it.
///
/// Plain text is HTML-escaped; the highlight markers are inserted
/// verbatim. Matches wholly outside the window are skipped; a match
/// straddling a window edge is clipped to the edge. An empty stream
/// renders the head of the document without highlights.
#[must_use]
pub fn render_snippet(body: &str, matches: &[MatchPosition], opts: &SnippetOptions) -> String {
    let anchor = matches.first().map_or(0, |m| m.start);
    let window = context_window(body, anchor, opts);
    let (open, close) = (&opts.highlight.0, &opts.highlight.1);

    let mut out = String::with_capacity(window.end - window.start + 16);
    if window.leading {
        out.push(opts.ellipsis);
    }
    let mut cursor = window.start;
    for m in matches {
        if m.end() <= window.start || m.start >= window.end {
            continue;
        }
        let start = m.start.max(window.start);
        let end = m.end().min(window.end);
        if start < cursor {
            // the merged stream is disjoint; ignore anything that is not
            continue;
        }
        push_escaped(&mut out, &body[cursor..start]);
        out.push_str(open);
        push_escaped(&mut out, &body[start..end]);
        out.push_str(close);
        cursor = end;
    }
    push_escaped(&mut out, &body[cursor..window.end]);
    if window.trailing {
        out.push(opts.ellipsis);
    }
    out
}

struct ContextWindow {
    start: usize,
    end: usize,
    leading: bool,
    trailing: bool,
}

/// Select the minimal window containing `anchor`: back to the preceding
/// line boundary (clamped to `max_line_len` behind the anchor), forward
/// `context_lines` line boundaries, total clamped to
/// `context_lines * max_line_len`. Clamps land on char boundaries.
fn context_window(body: &str, anchor: usize, opts: &SnippetOptions) -> ContextWindow {
    let bytes = body.as_bytes();

    let line_start = memchr::memrchr(b'\n', &bytes[..anchor]).map_or(0, |i| i + 1);
    let (mut start, leading) = if anchor - line_start > opts.max_line_len {
        (anchor - opts.max_line_len, true)
    } else {
        (line_start, false)
    };
    while !body.is_char_boundary(start) {
        start += 1;
    }

    let mut end = body.len();
    let mut lines = 0;
    for offset in memchr::memchr_iter(b'\n', &bytes[start..]) {
        lines += 1;
        if lines == opts.context_lines {
            end = start + offset;
            break;
        }
    }

    let mut trailing = false;
    let max_total = opts.context_lines * opts.max_line_len;
    if end - start > max_total {
        end = start + max_total;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        trailing = true;
    }

    ContextWindow {
        start,
        end,
        leading,
        trailing,
    }
}

fn push_escaped(out: &mut String, text: &str) {
    if !text.is_empty() {
        out.push_str(&html_escape::encode_text(text));
    }
}

/// Maximal alphanumeric runs of `text` with their byte offsets.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while let Some(&(_, c)) = chars.peek() {
            if c.is_alphanumeric() {
                break;
            }
            chars.next();
        }
        let &(start, _) = chars.peek()?;
        let mut end = text.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_alphanumeric() {
                chars.next();
            } else {
                end = i;
                break;
            }
        }
        Some((start, &text[start..end]))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pos(start: usize, len: usize) -> MatchPosition {
        MatchPosition { start, len }
    }

    fn plain(open: &str, close: &str) -> SnippetOptions {
        SnippetOptions {
            highlight: (open.to_string(), close.to_string()),
            ..SnippetOptions::default()
        }
    }

    #[test]
    fn merge_interleaves_by_offset() {
        let a = vec![pos(50, 1), pos(200, 1)];
        let b = vec![pos(10, 2), pos(120, 2)];
        let merged = merge_matches(&[a, b]);
        assert_eq!(merged, vec![pos(10, 2), pos(50, 1), pos(120, 2), pos(200, 1)]);
    }

    #[test]
    fn merge_handles_empty_and_single_lists() {
        assert!(merge_matches(&[]).is_empty());
        assert!(merge_matches(&[vec![], vec![]]).is_empty());
        let only = vec![pos(3, 4), pos(9, 4)];
        assert_eq!(merge_matches(&[vec![], only.clone()]), only);
    }

    #[test]
    fn term_positions_match_whole_tokens_only() {
        let body = "cat catalog cat";
        assert_eq!(term_positions(body, "cat"), vec![pos(0, 3), pos(12, 3)]);
    }

    #[test]
    fn term_positions_are_case_insensitive() {
        assert_eq!(term_positions("Cat CAT cat", "cat").len(), 3);
    }

    #[test]
    fn query_terms_lowercase_and_dedup() {
        assert_eq!(query_terms("Apple banana APPLE"), vec!["apple", "banana"]);
        assert!(query_terms("  \t ").is_empty());
    }

    #[test]
    fn highlights_single_match() {
        let body = "alpha beta gamma";
        let matches = term_positions(body, "beta");
        let out = render_snippet(body, &matches, &plain("<mark>", "</mark>"));
        assert_eq!(out, "alpha <mark>beta</mark> gamma");
    }

    #[test]
    fn escapes_html_outside_and_inside_markers() {
        let body = "a <b> beta </b>";
        let matches = term_positions(body, "beta");
        let out = render_snippet(body, &matches, &plain("<mark>", "</mark>"));
        assert_eq!(out, "a &lt;b&gt; <mark>beta</mark> &lt;/b&gt;");
    }

    #[test]
    fn window_is_line_bounded() {
        let body = "first line\nsecond beta line\nthird\nfourth\nfifth\nsixth";
        let matches = term_positions(body, "beta");
        let out = render_snippet(body, &matches, &plain("[", "]"));
        // anchor line starts the window; four lines of context
        assert_eq!(out, "second [beta] line\nthird\nfourth\nfifth");
    }

    #[test]
    fn long_line_clamps_with_leading_ellipsis() {
        let prefix = "x".repeat(200);
        let body = format!("{prefix} beta tail");
        let matches = term_positions(&body, "beta");
        let opts = plain("[", "]");
        let out = render_snippet(&body, &matches, &opts);
        assert!(out.starts_with('\u{2026}'));
        assert!(out.contains("[beta]"));
        // 80 bytes behind the anchor at most
        assert!(out.len() <= 1 + '\u{2026}'.len_utf8() + 4 * 80 + 4);
    }

    #[test]
    fn oversized_window_clamps_with_trailing_ellipsis() {
        let body = "y".repeat(1000);
        let matches = vec![pos(0, 1)];
        let opts = plain("[", "]");
        let out = render_snippet(&body, &matches, &opts);
        assert!(out.ends_with('\u{2026}'));
        // window itself is capped at context_lines * max_line_len
        let visible: String = out
            .replace('[', "")
            .replace(']', "")
            .replace('\u{2026}', "");
        assert_eq!(visible.len(), 4 * 80);
    }

    #[test]
    fn match_straddling_window_end_is_clipped() {
        let body = "abcdefMATCHxyz";
        let matches = vec![pos(6, 5)];
        let opts = SnippetOptions {
            context_lines: 1,
            max_line_len: 8,
            highlight: ("[".to_string(), "]".to_string()),
            ..SnippetOptions::default()
        };
        let out = render_snippet(body, &matches, &opts);
        assert_eq!(out, "abcdef[MA]\u{2026}");
    }

    #[test]
    fn empty_match_stream_renders_document_head() {
        let body = "line one\nline two\nline three\nline four\nline five";
        let out = render_snippet(body, &[], &plain("[", "]"));
        assert_eq!(out, "line one\nline two\nline three\nline four");
    }

    #[test]
    fn later_matches_inside_window_are_highlighted() {
        let body = "one two one";
        let lists = [term_positions(body, "one"), term_positions(body, "two")];
        let merged = merge_matches(&lists);
        let out = render_snippet(body, &merged, &plain("[", "]"));
        assert_eq!(out, "[one] [two] [one]");
    }

    proptest! {
        /// The window is bounded and rendering preserves all visible text:
        /// stripping the markers yields exactly the window's slice.
        #[test]
        fn rendering_preserves_visible_text(
            words in proptest::collection::vec("[a-z]{1,8}", 1..40),
            term_idx in 0usize..40,
        ) {
            let body = words.join(" ");
            let term = words[term_idx % words.len()].clone();
            let lists = [term_positions(&body, &term)];
            let merged = merge_matches(&lists);
            prop_assert!(!merged.is_empty());

            let opts = plain("\u{1}", "\u{2}");
            let out = render_snippet(&body, &merged, &opts);
            let visible: String = out
                .chars()
                .filter(|c| *c != '\u{1}' && *c != '\u{2}' && *c != '\u{2026}')
                .collect();
            // ascii alnum+space body: escaping is the identity
            prop_assert!(body.contains(&visible));

            let max = opts.context_lines * opts.max_line_len;
            prop_assert!(visible.len() <= max);
            // at most max_line_len bytes (plus the ellipsis) precede the
            // anchor match, so the anchor is always inside the window
            let first_open = out.find('\u{1}').unwrap();
            let ellipsis_len = '\u{2026}'.len_utf8();
            prop_assert!(first_open <= opts.max_line_len + ellipsis_len);
        }

        /// Merging any two ascending lists yields an ascending stream
        /// containing every input position.
        #[test]
        fn merge_is_ascending_and_complete(
            mut a in proptest::collection::vec(0usize..10_000, 0..50),
            mut b in proptest::collection::vec(0usize..10_000, 0..50),
        ) {
            a.sort_unstable();
            a.dedup();
            b.sort_unstable();
            b.dedup();
            let la: Vec<_> = a.iter().map(|&s| pos(s, 1)).collect();
            let lb: Vec<_> = b.iter().map(|&s| pos(s, 1)).collect();
            let merged = merge_matches(&[la.clone(), lb.clone()]);
            prop_assert_eq!(merged.len(), la.len() + lb.len());
            for pair in merged.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
            }
        }
    }
}
