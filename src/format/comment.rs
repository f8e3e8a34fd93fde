//! Comments and CDATA sections.

use crate::tree::{NodeId, NodeKind};

use super::category::WhitespaceCategory;
use super::constraints::FormattingConstraints;
use super::scan::has_line_break;
use super::text::Reflow;
use super::FormatterDocument;

const COMMENT_OPEN: usize = "<!--".len();
const COMMENT_CLOSE: usize = "-->".len();
const CDATA_OPEN: usize = "<![CDATA[".len();
const CDATA_CLOSE: usize = "]]>".len();

impl FormatterDocument<'_> {
    pub(super) fn format_comment(&mut self, id: NodeId, constraints: &FormattingConstraints) {
        let doc = self.doc;
        let node = doc.node(id);
        if !node.closed
            || !self.options.format_comments
            || constraints.category == WhitespaceCategory::PreserveSpace
        {
            return;
        }
        let level = constraints.indent_level;
        let follows_text = doc
            .prev_sibling(id)
            .is_some_and(|prev| matches!(doc.node(prev).kind, NodeKind::Text) && !doc.is_whitespace_text(prev));
        if !follows_text {
            let from = self.whitespace_start(0, node.start);
            if from == 0 {
                if constraints.category == WhitespaceCategory::IgnoreSpace {
                    self.edits.supersede(0, node.start, "");
                }
            } else if has_line_break(&self.text[from..node.start]) {
                self.reindent(from, node.start, level);
            }
        }

        if self.options.join_comment_lines {
            let content = node.start + COMMENT_OPEN..node.end - COMMENT_CLOSE;
            let width = self.available_width_at(content.start);
            self.reflow(content, width, tight(level, '-'));
        }
    }

    pub(super) fn format_cdata(&mut self, id: NodeId, constraints: &FormattingConstraints) {
        let doc = self.doc;
        let node = doc.node(id);
        if !node.closed
            || !self.options.join_cdata_lines
            || constraints.category == WhitespaceCategory::PreserveSpace
        {
            return;
        }
        let content = node.start + CDATA_OPEN..node.end - CDATA_CLOSE;
        let width = self.available_width_at(content.start);
        self.reflow(content, width, tight(constraints.indent_level, ']'));
    }
}

fn tight(level: usize, guard: char) -> Reflow {
    Reflow {
        level,
        closing_level: level,
        join: true,
        tight: true,
        guard: Some(guard),
    }
}
