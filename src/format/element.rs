//! Element layout: start tag, empty-element shape, children, end tag.

use crate::error::FormatError;
use crate::tree::{Attribute, NodeId, NodeKind};

use super::category::{classify, WhitespaceCategory};
use super::constraints::FormattingConstraints;
use super::options::EmptyElements;
use super::scan::has_line_break;
use super::FormatterDocument;

impl FormatterDocument<'_> {
    /// Formats an element living in the scope `constraints`.
    ///
    /// The start tag follows the enclosing category, the content and end
    /// tag follow the element's own.
    pub(super) fn format_element(
        &mut self,
        id: NodeId,
        constraints: &FormattingConstraints,
    ) -> Result<(), FormatError> {
        let doc = self.doc;
        let node = doc.node(id);
        let NodeKind::Element {
            name,
            attributes,
            start_tag_close,
            end_tag_open,
            end_tag_close,
            self_closed,
        } = &node.kind
        else {
            return Ok(());
        };
        let level = constraints.indent_level;
        let preserved = constraints.category == WhitespaceCategory::PreserveSpace;
        let category = classify(doc, self.options, self.participants, id, constraints);
        let name_end = node.start + 1 + name.len();

        if constraints.category == WhitespaceCategory::IgnoreSpace {
            self.format_leading_whitespace(node.start, level);
        }
        if !preserved {
            self.format_attributes(attributes, name_end, level, Some(id));
        }
        let Some(close) = *start_tag_close else {
            return Ok(());
        };
        let after_attributes = attributes.last().map_or(name_end, Attribute::end);

        if !preserved {
            match self.empty_element_policy(id, category) {
                EmptyElements::Expand if *self_closed => {
                    self.edits.replace(after_attributes, node.end, &format!("></{name}>"));
                    return Ok(());
                }
                EmptyElements::Collapse if !*self_closed => {
                    let (from, mut tag_end) =
                        self.closing_bracket_whitespace(after_attributes, close, attributes.len(), true, level);
                    tag_end.push_str("/>");
                    self.edits.replace(from, node.end, &tag_end);
                    return Ok(());
                }
                _ => {}
            }
            self.format_closing_bracket(after_attributes, close, attributes.len(), *self_closed, level);
        }
        if *self_closed {
            return Ok(());
        }

        let child_level = if node.closed { level + 1 } else { level };
        let mut children = FormattingConstraints::new(child_level, self.available_width_at(close + 1), category);
        self.format_children(id, &mut children)?;

        let Some(end_open) = *end_tag_open else {
            return Ok(());
        };
        if category == WhitespaceCategory::IgnoreSpace
            && node.closed
            && doc.children(id).any(|child| !doc.is_whitespace_text(child))
        {
            let from = self.whitespace_start(close + 1, end_open);
            self.reindent(from, end_open, level);
        }
        if let Some(end_close) = *end_tag_close {
            let from = self.whitespace_start(end_open + 2 + name.len(), end_close);
            self.edits.replace(from, end_close, "");
        }
        Ok(())
    }

    /// Resolves the empty-element policy for one element.
    fn empty_element_policy(&self, id: NodeId, category: WhitespaceCategory) -> EmptyElements {
        let doc = self.doc;
        let policy = self.options.empty_elements;
        if policy == EmptyElements::Ignore {
            return policy;
        }
        if !doc.node(id).closed || !doc.children(id).all(|child| doc.is_whitespace_text(child)) {
            return EmptyElements::Ignore;
        }
        let has_children = doc.first_child(id).is_some();
        if has_children
            && (self.options.preserve_empty_content || category == WhitespaceCategory::PreserveSpace)
        {
            return EmptyElements::Ignore;
        }
        if policy == EmptyElements::Collapse {
            // the end tag must lie inside the formatted range
            let NodeKind::Element { end_tag_open, .. } = &doc.node(id).kind else {
                return EmptyElements::Ignore;
            };
            if !end_tag_open.is_some_and(|open| open + 1 < self.range.end)
                || self
                    .participants
                    .iter()
                    .any(|p| !p.should_collapse_empty_element(doc, id))
            {
                return EmptyElements::Ignore;
            }
        }
        policy
    }

    /// Normalizes the whitespace before the start tag's `>` or `/>`.
    fn format_closing_bracket(
        &mut self,
        after_attributes: usize,
        close: usize,
        attribute_count: usize,
        self_closed: bool,
        level: usize,
    ) {
        let (from, replacement) =
            self.closing_bracket_whitespace(after_attributes, close, attribute_count, self_closed, level);
        self.edits.replace(from, close, &replacement);
    }

    /// Start of the whitespace before the start tag's closing bracket and
    /// what it should read for a tag closing with `/>` when `self_closed`.
    fn closing_bracket_whitespace(
        &self,
        after_attributes: usize,
        close: usize,
        attribute_count: usize,
        self_closed: bool,
        level: usize,
    ) -> (usize, String) {
        let options = self.options;
        let from = self.whitespace_start(after_attributes, close);
        let replacement = if self.preserves_attribute_line_breaks()
            && attribute_count > 0
            && has_line_break(&self.text[from..close])
        {
            self.new_line(level)
        } else if options.closing_bracket_new_line && options.split_attributes && attribute_count > 1 {
            self.new_line(level + options.split_attributes_indent_size)
        } else if self_closed && options.space_before_empty_close_tag {
            " ".to_string()
        } else {
            String::new()
        };
        (from, replacement)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::format::{
        format_text, CancelToken, EmptyElements, FormatterParticipant, FormattingOptions, XmlFormatter,
    };
    use crate::tree::{Document, NodeId};
    use pretty_assertions::assert_eq;

    fn fmt(text: &str, opts: &FormattingOptions) -> String {
        format_text(text, opts).unwrap()
    }

    #[test]
    fn test_nested_indentation() {
        let opts = FormattingOptions::default();
        assert_eq!(
            fmt("<a><b><c/></b><d></d></a>", &opts),
            "<a>\n  <b>\n    <c/>\n  </b>\n  <d></d>\n</a>"
        );
    }

    #[test]
    fn test_collapse_empty_element() {
        let opts = FormattingOptions::default()
            .empty_elements(EmptyElements::Collapse)
            .space_before_empty_close_tag(true);
        assert_eq!(fmt("<foo></foo>", &opts), "<foo />");
        assert_eq!(fmt("<foo a='1'>  \n </foo>", &opts), "<foo a='1' />");
        assert_eq!(fmt("<foo>x</foo>", &opts), "<foo>x</foo>");
    }

    #[test]
    fn test_collapse_follows_closing_bracket_layout() {
        let opts = FormattingOptions::default()
            .empty_elements(EmptyElements::Collapse)
            .split_attributes(true)
            .closing_bracket_new_line(true);
        let once = fmt("<a x='1' y='2'></a>", &opts);
        assert_eq!(once, "<a\n    x='1'\n    y='2'\n    />");
        assert_eq!(fmt(&once, &opts), once);

        let spaced = opts.space_before_empty_close_tag(true);
        assert_eq!(fmt("<a x='1'>\n</a>", &spaced), "<a x='1' />");
    }

    #[test]
    fn test_collapse_respects_preserve_empty_content() {
        let opts = FormattingOptions::default()
            .empty_elements(EmptyElements::Collapse)
            .preserve_empty_content(true);
        assert_eq!(fmt("<foo> </foo>", &opts), "<foo> </foo>");
        assert_eq!(fmt("<foo></foo>", &opts), "<foo/>");
    }

    #[test]
    fn test_expand_empty_element() {
        let opts = FormattingOptions::default().empty_elements(EmptyElements::Expand);
        assert_eq!(fmt("<a><b x='1' /></a>", &opts), "<a>\n  <b x='1'></b>\n</a>");
    }

    #[test]
    fn test_space_before_empty_close_tag() {
        let opts = FormattingOptions::default().space_before_empty_close_tag(true);
        assert_eq!(fmt("<a/>", &opts), "<a />");
        assert_eq!(fmt("<a   />", &FormattingOptions::default()), "<a/>");
    }

    #[test]
    fn test_end_tag_whitespace_removed() {
        let opts = FormattingOptions::default();
        assert_eq!(fmt("<a>text</a   >", &opts), "<a>text</a>");
    }

    #[test]
    fn test_preserve_space_content_untouched() {
        let opts = FormattingOptions::default();
        let text = "<a><pre>\n   <b  x='1'/>  text\n</pre></a>";
        assert_eq!(fmt(text, &opts), "<a>\n  <pre>\n   <b  x='1'/>  text\n</pre>\n</a>");
    }

    #[test]
    fn test_xml_space_preserve() {
        let opts = FormattingOptions::default();
        let text = "<a xml:space='preserve'><b>  <c/></b></a>";
        assert_eq!(fmt(text, &opts), text);
    }

    #[test]
    fn test_mixed_content_keeps_inline_elements() {
        let opts = FormattingOptions::default();
        let text = "<p>Some <b>bold</b>   text</p>";
        assert_eq!(fmt(text, &opts), "<p>Some <b>bold</b> text</p>");
    }

    #[test]
    fn test_unclosed_element_does_not_indent_children() {
        let opts = FormattingOptions::default();
        assert_eq!(fmt("<a><b><c/></a>", &opts), "<a>\n  <b>\n  <c/>\n</a>");
    }

    struct KeepEndTags;

    impl FormatterParticipant for KeepEndTags {
        fn should_collapse_empty_element(&self, doc: &Document, element: NodeId) -> bool {
            doc.node_name(element) != Some("script")
        }
    }

    #[test]
    fn test_participant_vetoes_collapse() {
        let opts = FormattingOptions::default().empty_elements(EmptyElements::Collapse);
        let formatter = XmlFormatter::new(opts).with_participant(Box::new(KeepEndTags));
        let doc = Document::parse_str("<a><script></script><b></b></a>");
        let edits = formatter.format(&doc, None, &CancelToken::new()).unwrap();
        let output = crate::format::apply_edits(doc.text(), &edits).unwrap();
        assert_eq!(output, "<a>\n  <script></script>\n  <b/>\n</a>");
    }
}
