//! Document type declarations and DTD markup declarations.
//!
//! A DOCTYPE in an XML document keeps its parameters on one line and lays
//! its internal subset out one level deeper, one declaration per line. A
//! standalone DTD is the same subset at level zero.

use std::ops::Range;

use crate::error::FormatError;
use crate::tree::{NodeId, NodeKind};

use super::category::WhitespaceCategory;
use super::constraints::FormattingConstraints;
use super::FormatterDocument;

const DOCTYPE_KEYWORD: usize = "<!DOCTYPE".len();

impl FormatterDocument<'_> {
    pub(super) fn format_doctype(
        &mut self,
        id: NodeId,
        constraints: &FormattingConstraints,
    ) -> Result<(), FormatError> {
        let doc = self.doc;
        let node = doc.node(id);
        let NodeKind::DocumentType {
            parameters,
            subset_open,
            subset_close,
        } = &node.kind
        else {
            return Ok(());
        };
        let level = constraints.indent_level;
        if constraints.category == WhitespaceCategory::IgnoreSpace {
            self.format_leading_whitespace(node.start, level);
        }
        // tokens after the internal subset are recovered junk
        let subset_start = subset_open.unwrap_or(node.end);
        let split = parameters.partition_point(|parameter| parameter.start < subset_start);
        let (before_subset, after_subset) = parameters.split_at(split);
        let after_parameters = self.format_parameters(before_subset, node.start + DOCTYPE_KEYWORD, &[], level);

        let Some(open) = *subset_open else {
            if node.closed {
                let close = node.end - 1;
                let from = self.whitespace_start(after_parameters, close);
                self.edits.replace(from, close, "");
            }
            return Ok(());
        };
        let from = self.whitespace_start(after_parameters, open);
        self.edits.replace(from, open, " ");

        let mut subset = FormattingConstraints::new(
            level + 1,
            self.available_width_at(open + 1),
            WhitespaceCategory::IgnoreSpace,
        );
        self.format_children(id, &mut subset)?;

        let Some(close) = *subset_close else {
            return Ok(());
        };
        let from = self.whitespace_start(open + 1, close);
        if doc.children(id).any(|child| !doc.is_whitespace_text(child)) {
            let line = self.new_line(level);
            self.edits.supersede(from, close, &line);
        } else {
            self.edits.supersede(from, close, "");
        }
        let after_junk = self.format_parameters(after_subset, close + 1, &[], level);
        if node.closed {
            let end = node.end - 1;
            let from = self.whitespace_start(after_junk, end);
            self.edits.replace(from, end, "");
        }
        Ok(())
    }

    /// Formats an `<!ELEMENT`, `<!ATTLIST`, `<!ENTITY` or `<!NOTATION`
    /// declaration on its own line.
    pub(super) fn format_declaration(&mut self, id: NodeId, constraints: &FormattingConstraints) {
        let doc = self.doc;
        let node = doc.node(id);
        let NodeKind::DtdDeclaration {
            keyword_end,
            parameters,
            attribute_groups,
            ..
        } = &node.kind
        else {
            return;
        };
        if constraints.category == WhitespaceCategory::PreserveSpace {
            return;
        }
        let level = constraints.indent_level;

        let from = self.whitespace_start(0, node.start);
        if from == 0 {
            self.edits.supersede(0, node.start, "");
        } else {
            let line = self.new_line(level);
            self.edits.supersede(from, node.start, &line);
        }

        // every attribute definition after the first starts a new line
        let line_starts: Vec<usize> = attribute_groups.iter().skip(1).map(|group| group.start).collect();
        let after_parameters = self.format_parameters(parameters, *keyword_end, &line_starts, level + 1);
        if node.closed {
            let close = node.end - 1;
            let from = self.whitespace_start(after_parameters, close);
            self.edits.replace(from, close, "");
        }
    }

    /// Separates `parameters` by one space, or by a line break before the
    /// parameters whose index is in `line_starts`. Returns the end of the
    /// last parameter.
    fn format_parameters(
        &mut self,
        parameters: &[Range<usize>],
        keyword_end: usize,
        line_starts: &[usize],
        line_level: usize,
    ) -> usize {
        let text = self.text;
        let mut previous_end = keyword_end;
        for (i, parameter) in parameters.iter().enumerate() {
            let from = self.whitespace_start(previous_end, parameter.start);
            if line_starts.contains(&i) {
                let line = self.new_line(line_level);
                self.edits.replace(from, parameter.start, &line);
            } else {
                self.edits.replace(from, parameter.start, " ");
            }
            let raw = &text[parameter.clone()];
            if raw.starts_with(['"', '\'']) {
                self.enforce_quote_style(parameter.start, raw);
            }
            previous_end = parameter.end;
        }
        previous_end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::format::{format_dtd_text, format_text, EnforceQuoteStyle, FormattingOptions, QuoteStyle};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_doctype_parameters_single_spaced() {
        let opts = FormattingOptions::default();
        assert_eq!(
            format_text("<!DOCTYPE   note   SYSTEM   'note.dtd'  >\n<note/>", &opts).unwrap(),
            "<!DOCTYPE note SYSTEM 'note.dtd'>\n<note/>"
        );
    }

    #[test]
    fn test_internal_subset_layout() {
        let opts = FormattingOptions::default();
        let text = "<!DOCTYPE note [<!ELEMENT note (to,from)>   \
                    <!ATTLIST note a CDATA #IMPLIED b CDATA #REQUIRED>]><note/>";
        assert_eq!(
            format_text(text, &opts).unwrap(),
            "<!DOCTYPE note [\n  <!ELEMENT note (to,from)>\n  <!ATTLIST note a CDATA #IMPLIED\n    b CDATA #REQUIRED>\n]>\n<note/>"
        );
    }

    #[test]
    fn test_empty_subset_closed_up() {
        let opts = FormattingOptions::default();
        assert_eq!(format_text("<!DOCTYPE a [  ]  ><a/>", &opts).unwrap(), "<!DOCTYPE a []>\n<a/>");
    }

    #[test]
    fn test_tokens_after_subset_are_stable() {
        let opts = FormattingOptions::default();
        let once = format_text("<!DOCTYPE r []   x  >", &opts).unwrap();
        assert_eq!(once, "<!DOCTYPE r [] x>");
        assert_eq!(format_text(&once, &opts).unwrap(), once);

        let once = format_text("<!DOCTYPE r []]>", &opts).unwrap();
        assert_eq!(once, "<!DOCTYPE r [] ]>");
        assert_eq!(format_text(&once, &opts).unwrap(), once);
    }

    #[test]
    fn test_standalone_dtd() {
        let opts = FormattingOptions::default();
        assert_eq!(
            format_dtd_text("<!ELEMENT  a  ANY >\n\n\n<!ENTITY   e   \"v\">", &opts).unwrap(),
            "<!ELEMENT a ANY>\n<!ENTITY e \"v\">"
        );
    }

    #[test]
    fn test_dtd_quotes_enforced() {
        let opts = FormattingOptions::default()
            .enforce_quote_style(EnforceQuoteStyle::Preferred)
            .quote_style(QuoteStyle::SingleQuotes);
        assert_eq!(
            format_dtd_text("<!ENTITY e \"v\">\n<!ENTITY f \"it's\">", &opts).unwrap(),
            "<!ENTITY e 'v'>\n<!ENTITY f \"it's\">"
        );
    }

    #[test]
    fn test_unterminated_declaration_spacing() {
        let opts = FormattingOptions::default();
        assert_eq!(format_dtd_text("<!ELEMENT   a ANY", &opts).unwrap(), "<!ELEMENT a ANY");
    }
}
