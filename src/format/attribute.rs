//! Attribute layout and quote enforcement.

use tracing::warn;

use crate::tree::{Attribute, AttributeValue, NodeId};

use super::category::AttributeValueContext;
use super::options::EnforceQuoteStyle;
use super::scan::has_line_break;
use super::FormatterDocument;

impl FormatterDocument<'_> {
    /// Formats the attributes of `element`, a tag whose name ends at
    /// `name_end`.
    ///
    /// `element` is `None` for processing instructions, whose
    /// pseudo-attributes always stay on one line and are never handed to
    /// participants.
    pub(super) fn format_attributes(
        &mut self,
        attributes: &[Attribute],
        name_end: usize,
        level: usize,
        element: Option<NodeId>,
    ) {
        let single = attributes.len() == 1;
        let mut previous_end = name_end;
        for attribute in attributes {
            self.format_attribute(attribute, previous_end, single, element, level);
            previous_end = attribute.end();
        }
    }

    fn format_attribute(
        &mut self,
        attribute: &Attribute,
        previous_end: usize,
        single: bool,
        element: Option<NodeId>,
        level: usize,
    ) {
        let options = self.options;
        let from = self.whitespace_start(previous_end, attribute.name_start);
        let separator = if element.is_none() {
            " ".to_string()
        } else if self.preserves_attribute_line_breaks()
            && has_line_break(&self.text[from..attribute.name_start])
        {
            self.new_line(level + 1)
        } else if options.split_attributes && !single {
            self.new_line(level + options.split_attributes_indent_size)
        } else {
            " ".to_string()
        };
        self.edits.replace(from, attribute.name_start, &separator);

        if let Some(delimiter) = attribute.delimiter {
            self.edits.replace(attribute.name_end, delimiter, "");
            if let Some(value) = &attribute.value {
                self.edits.replace(delimiter + 1, value.start, "");
            }
        }
        let Some(value) = &attribute.value else {
            return;
        };
        let quote = self.preferred_quote(&value.raw);
        let close = value.start + value.raw.len();
        if let Some(quote) = &quote {
            self.edits.replace(value.start, value.start + 1, quote);
        }
        if let Some(element) = element {
            self.format_attribute_value(element, attribute, value);
        }
        if let Some(quote) = &quote {
            self.edits.replace(close - 1, close, quote);
        }
    }

    /// Asks the participants to lay out a quoted attribute value.
    fn format_attribute_value(&mut self, element: NodeId, attribute: &Attribute, value: &AttributeValue) {
        let participants = self.participants;
        let bytes = value.raw.as_bytes();
        if participants.is_empty()
            || bytes.len() < 2
            || !matches!(bytes[0], b'"' | b'\'')
            || bytes[0] != bytes[bytes.len() - 1]
        {
            return;
        }
        let content = value.start + 1..value.start + bytes.len() - 1;
        let context = AttributeValueContext {
            options: self.options,
            line_delimiter: self.line_delimiter,
            column: usize::try_from(self.column_at(content.start)).unwrap_or(0),
        };
        let doc = self.doc;
        let Some(edits) = participants
            .iter()
            .find_map(|participant| participant.format_attribute_value(doc, element, attribute, &context))
        else {
            return;
        };
        let inside = edits
            .iter()
            .all(|edit| content.start <= edit.start && edit.start <= edit.end && edit.end <= content.end);
        let sorted = edits.windows(2).all(|pair| pair[0].end <= pair[1].start);
        if !inside || !sorted {
            warn!(attribute = %attribute.name, "ignoring misplaced attribute value edits");
            return;
        }
        for edit in edits {
            self.edits.replace(edit.start, edit.end, &edit.new_text);
        }
    }

    /// Existing line breaks between attributes are kept only when
    /// attributes are not being split.
    pub(super) fn preserves_attribute_line_breaks(&self) -> bool {
        self.options.preserve_attribute_line_breaks && !self.options.split_attributes
    }

    /// Swaps the delimiters of the quoted value `raw` starting at `start`
    /// for the preferred quote, one character at a time.
    pub(super) fn enforce_quote_style(&mut self, start: usize, raw: &str) {
        if let Some(quote) = self.preferred_quote(raw) {
            self.edits.replace(start, start + 1, &quote);
            self.edits.replace(start + raw.len() - 1, start + raw.len(), &quote);
        }
    }

    /// The quote that should delimit the quoted value `raw`, if it is to be
    /// swapped. Values containing the preferred quote are left alone.
    fn preferred_quote(&self, raw: &str) -> Option<String> {
        if self.options.enforce_quote_style != EnforceQuoteStyle::Preferred {
            return None;
        }
        let preferred = self.options.quote_style.quote();
        let other = self.options.quote_style.other();
        let bytes = raw.as_bytes();
        let terminated = bytes.len() >= 2 && bytes[0] == bytes[bytes.len() - 1];
        if !terminated || bytes[0] != other || bytes[1..bytes.len() - 1].contains(&preferred) {
            return None;
        }
        Some(char::from(preferred).to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::format::{
        apply_edits, format_text, AttributeValueContext, CancelToken, EnforceQuoteStyle, FormatterParticipant,
        FormattingOptions, QuoteStyle, TextEdit, XmlFormatter,
    };
    use crate::tree::{Attribute, Document, NodeId};
    use pretty_assertions::assert_eq;

    fn fmt(text: &str, opts: &FormattingOptions) -> String {
        format_text(text, opts).unwrap()
    }

    #[test]
    fn test_spacing_around_delimiter() {
        let opts = FormattingOptions::default();
        assert_eq!(fmt("<foo attr = \"v\" >", &opts), "<foo attr=\"v\">");
        assert_eq!(fmt("<foo   a='1'    b />", &opts), "<foo a='1' b/>");
    }

    #[test]
    fn test_preserved_attribute_line_breaks() {
        let opts = FormattingOptions::default();
        assert_eq!(
            fmt("<a>\n<b x='1'\n         y='2'/></a>", &opts),
            "<a>\n  <b x='1'\n    y='2'/>\n</a>"
        );
    }

    #[test]
    fn test_split_attributes() {
        let opts = FormattingOptions::default().split_attributes(true);
        assert_eq!(
            fmt("<a x='1' y='2'/>", &opts),
            "<a\n    x='1'\n    y='2'/>"
        );
        // a lone attribute is never split
        assert_eq!(fmt("<a\nx='1'/>", &opts), "<a x='1'/>");
    }

    #[test]
    fn test_split_attributes_closing_bracket_new_line() {
        let opts = FormattingOptions::default()
            .split_attributes(true)
            .closing_bracket_new_line(true);
        assert_eq!(
            fmt("<a x='1' y='2'></a>", &opts),
            "<a\n    x='1'\n    y='2'\n    ></a>"
        );
    }

    #[test]
    fn test_enforce_preferred_quotes() {
        let opts = FormattingOptions::default().enforce_quote_style(EnforceQuoteStyle::Preferred);
        assert_eq!(fmt("<a x='1' y=\"2\"/>", &opts), "<a x=\"1\" y=\"2\"/>");
        let single = opts.quote_style(QuoteStyle::SingleQuotes);
        assert_eq!(fmt("<a x=\"1\"/>", &single), "<a x='1'/>");
    }

    #[test]
    fn test_value_containing_preferred_quote_keeps_delimiters() {
        let opts = FormattingOptions::default()
            .enforce_quote_style(EnforceQuoteStyle::Preferred)
            .quote_style(QuoteStyle::SingleQuotes);
        assert_eq!(fmt("<a b=\"it's\"/>", &opts), "<a b=\"it's\"/>");
    }

    #[test]
    fn test_unterminated_value_is_not_requoted() {
        let opts = FormattingOptions::default().enforce_quote_style(EnforceQuoteStyle::Preferred);
        let text = "<a name='value></a>";
        let formatted = fmt(text, &opts);
        assert!(formatted.starts_with("<a name='value"));
    }

    /// Collapses the blanks inside `class` values.
    struct ClassList;

    impl FormatterParticipant for ClassList {
        fn format_attribute_value(
            &self,
            doc: &Document,
            _element: NodeId,
            attribute: &Attribute,
            _context: &AttributeValueContext<'_>,
        ) -> Option<Vec<TextEdit>> {
            if attribute.name != "class" {
                return None;
            }
            let value = attribute.value.as_ref()?;
            let text = doc.text();
            let mut edits = Vec::new();
            let mut at = value.start + 1;
            while at < value.end - 1 {
                if text.as_bytes()[at] == b' ' {
                    let run_end = at + text[at..value.end - 1].bytes().take_while(|&b| b == b' ').count();
                    edits.push(TextEdit::new(at, run_end, " "));
                    at = run_end;
                } else {
                    at += 1;
                }
            }
            Some(edits)
        }
    }

    /// Returns an edit reaching past the closing quote.
    struct Misplaced;

    impl FormatterParticipant for Misplaced {
        fn format_attribute_value(
            &self,
            _doc: &Document,
            _element: NodeId,
            attribute: &Attribute,
            _context: &AttributeValueContext<'_>,
        ) -> Option<Vec<TextEdit>> {
            let value = attribute.value.as_ref()?;
            Some(vec![TextEdit::new(value.start + 1, value.end, "")])
        }
    }

    fn fmt_with(text: &str, participant: Box<dyn FormatterParticipant>, opts: FormattingOptions) -> String {
        let doc = Document::parse_str(text);
        let formatter = XmlFormatter::new(opts).with_participant(participant);
        let edits = formatter.format(&doc, None, &CancelToken::new()).unwrap();
        apply_edits(text, &edits).unwrap()
    }

    #[test]
    fn test_participant_formats_attribute_value() {
        let opts = FormattingOptions::default()
            .enforce_quote_style(EnforceQuoteStyle::Preferred)
            .quote_style(QuoteStyle::SingleQuotes);
        assert_eq!(
            fmt_with("<a class=\"x   y  z\" id=\"i  j\"/>", Box::new(ClassList), opts),
            "<a class='x y z' id='i  j'/>"
        );
    }

    #[test]
    fn test_misplaced_value_edits_are_ignored() {
        let opts = FormattingOptions::default();
        assert_eq!(fmt_with("<a  b='1'/>", Box::new(Misplaced), opts), "<a b='1'/>");
    }
}
