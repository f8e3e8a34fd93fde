//! Whitespace reflow of character content.
//!
//! Text, comment and CDATA content share one algorithm: the content is cut
//! into alternating whitespace and word runs, and every whitespace run is
//! rewritten to a single space, a line break, or nothing, while the
//! remaining line width is tracked so that long content wraps between
//! words.

use std::ops::Range;

use crate::tree::{NodeId, NodeKind};

use super::category::WhitespaceCategory;
use super::constraints::FormattingConstraints;
use super::scan::{column_width, has_line_break, runs};
use super::FormatterDocument;

/// How one span of content is reflowed.
#[derive(Debug, Clone, Copy)]
pub(super) struct Reflow {
    /// Indentation of inserted and kept line breaks.
    pub level: usize,
    /// Indentation of a kept line break that ends the span.
    pub closing_level: usize,
    /// Collapse line breaks too, not only spaces.
    pub join: bool,
    /// Remove the whitespace at both ends of the span.
    pub tight: bool,
    /// A trailing character that must stay separated from the closing
    /// delimiter (`-` before `-->`, `]` before `]]>`).
    pub guard: Option<char>,
}

impl FormatterDocument<'_> {
    /// Rewrites the whitespace runs of `span`, starting with `width`
    /// columns left on the line. Returns the columns left after the span.
    pub(super) fn reflow(&mut self, span: Range<usize>, mut width: i32, style: Reflow) -> i32 {
        let text = self.text;
        let tab = self.options.tab_size;
        let runs = runs(text, span.start, span.end);
        let last = runs.len().saturating_sub(1);

        for (i, run) in runs.iter().enumerate() {
            let chunk = &text[run.start..run.end];
            if !run.whitespace {
                width -= column_width(chunk, tab);
                continue;
            }
            let leading = i == 0;
            let trailing = i == last;

            if style.tight && (leading || trailing) {
                let guarded = trailing
                    && !leading
                    && style
                        .guard
                        .is_some_and(|guard| text[..run.start].ends_with(guard));
                self.edits.replace(run.start, run.end, if guarded { " " } else { "" });
                width -= i32::from(guarded);
                continue;
            }
            if !style.join && has_line_break(chunk) {
                let level = if trailing { style.closing_level } else { style.level };
                self.reindent(run.start, run.end, level);
                width = self.available_width_at(run.end);
                continue;
            }
            let next_width = runs
                .get(i + 1)
                .map_or(0, |next| column_width(&text[next.start..next.end], tab));
            if !trailing && self.wraps() && width - 1 - next_width < 0 {
                let line = self.new_line(style.level);
                self.edits.replace(run.start, run.end, &line);
                width = self.available_width_at(run.end);
            } else {
                self.edits.replace(run.start, run.end, " ");
                width -= 1;
            }
        }
        width
    }

    /// Normalizes the whitespace of a text node.
    ///
    /// Only text under [`NormalizeSpace`] or [`MixedContent`] is reflowed,
    /// and whitespace-only text never is. Text left as written only loses
    /// the blanks before its line breaks, and only with
    /// `trim_trailing_whitespace`.
    ///
    /// [`NormalizeSpace`]: WhitespaceCategory::NormalizeSpace
    /// [`MixedContent`]: WhitespaceCategory::MixedContent
    pub(super) fn format_text(&mut self, id: NodeId, constraints: &FormattingConstraints) {
        let doc = self.doc;
        if self.options.preserve_empty_content {
            return;
        }
        let node = doc.node(id);
        if matches!(
            constraints.category,
            WhitespaceCategory::IgnoreSpace | WhitespaceCategory::PreserveSpace
        ) || doc.is_whitespace_text(id)
        {
            if self.options.trim_trailing_whitespace {
                self.trim_line_ends(node.start..node.end);
            }
            return;
        }
        let level = constraints.indent_level;
        let closes_parent = doc.next_sibling(id).is_none()
            && doc.parent(id).is_some_and(|parent| {
                let parent = doc.node(parent);
                parent.closed && matches!(parent.kind, NodeKind::Element { .. })
            });
        let style = Reflow {
            level,
            closing_level: if closes_parent { level.saturating_sub(1) } else { level },
            join: self.options.join_content_lines,
            tight: false,
            guard: None,
        };
        self.reflow(node.start..node.end, constraints.available_line_width, style);
    }

    /// Removes the spaces and tabs before every line break in `span`.
    fn trim_line_ends(&mut self, span: Range<usize>) {
        let bytes = self.text.as_bytes();
        for at in span.clone() {
            if !matches!(bytes[at], b'\n' | b'\r') {
                continue;
            }
            let mut from = at;
            while from > span.start && matches!(bytes[from - 1], b' ' | b'\t') {
                from -= 1;
            }
            self.edits.replace(from, at, "");
        }
    }
}
