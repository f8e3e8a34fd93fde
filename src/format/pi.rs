//! Processing instructions.

use crate::tree::{Attribute, NodeId, NodeKind};

use super::category::WhitespaceCategory;
use super::constraints::FormattingConstraints;
use super::FormatterDocument;

impl FormatterDocument<'_> {
    /// Formats a processing instruction: its indentation, its
    /// pseudo-attributes kept on one line, and the space before `?>`.
    pub(super) fn format_processing_instruction(&mut self, id: NodeId, constraints: &FormattingConstraints) {
        let doc = self.doc;
        let node = doc.node(id);
        let NodeKind::ProcessingInstruction { target, attributes } = &node.kind else {
            return;
        };
        if constraints.category == WhitespaceCategory::PreserveSpace {
            return;
        }
        let level = constraints.indent_level;

        if constraints.category == WhitespaceCategory::IgnoreSpace {
            self.format_leading_whitespace(node.start, level);
        } else if let Some(parent) = doc.parent(id).filter(|&parent| doc.is_element(parent)) {
            let first = doc
                .children(parent)
                .find(|&child| !doc.is_whitespace_text(child));
            if first == Some(id) {
                let from = self.whitespace_start(0, node.start);
                let line = self.new_line(level);
                self.edits.supersede(from, node.start, &line);
            }
        }

        let target_end = node.start + 2 + target.len();
        self.format_attributes(attributes, target_end, level, None);
        if node.closed {
            let left_limit = attributes.last().map_or(target_end, Attribute::end);
            let close = node.end - 2;
            let from = self.whitespace_start(left_limit, close);
            self.edits.replace(from, close, "");
        }
    }
}
