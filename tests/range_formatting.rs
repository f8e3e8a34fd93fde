//! Formatting part of a document, and cancelling a run.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xmlfmt::format::{
    apply_edits, CancelToken, EmptyElements, FormatterParticipant, FormattingConstraints,
    FormattingOptions, TextEdit, WhitespaceCategory, XmlFormatter,
};
use xmlfmt::text::{Position, Range};
use xmlfmt::{Document, NodeId};

fn format_range(text: &str, range: std::ops::Range<usize>) -> (Vec<TextEdit>, String) {
    let doc = Document::parse_str(text);
    let edits = XmlFormatter::default()
        .format(&doc, Some(range), &CancelToken::new())
        .unwrap();
    let output = apply_edits(text, &edits).unwrap();
    (edits, output)
}

#[test]
fn test_range_covering_one_element() {
    let text = "<a>\n<b   x='1'/>\n<c   y='2'/>\n</a>";
    let (_, output) = format_range(text, 4..16);
    assert_eq!(output, "<a>\n  <b x='1'/>\n<c   y='2'/>\n</a>");
}

#[test]
fn test_range_spanning_siblings() {
    let text = "<a>\n<b/>\n<c/>\n<d/>\n</a>";
    let (_, output) = format_range(text, 4..12);
    assert_eq!(output, "<a>\n  <b/>\n  <c/>\n<d/>\n</a>");
}

#[test]
fn test_range_inside_attribute_value() {
    let text = "<a>\n  <b attr='some   value'   other = 'x'/>\n</a>";
    let (edits, output) = format_range(text, 19..22);
    assert!(edits.is_empty());
    assert_eq!(output, text);
}

#[test]
fn test_range_edits_intersect_range() {
    let text = "<r>\n<a   x='1'/>\n<b   y='2'/>\n<c   z='3'/>\n</r>";
    let start = text.find("<b").unwrap();
    let end = start + "<b   y='2'/>".len();
    let (edits, output) = format_range(text, start..end);
    for edit in &edits {
        assert!(edit.start <= end && edit.end >= start);
    }
    assert_eq!(output, "<r>\n<a   x='1'/>\n  <b y='2'/>\n<c   z='3'/>\n</r>");
}

#[test]
fn test_nested_range_uses_ancestor_indentation() {
    let text = "<a>\n  <b>\n    <c>\n<d   k='v'/>\n    </c>\n  </b>\n</a>";
    let start = text.find("<d").unwrap();
    let (_, output) = format_range(text, start..start + 2);
    assert_eq!(output, "<a>\n  <b>\n    <c>\n      <d k='v'/>\n    </c>\n  </b>\n</a>");
}

#[test]
fn test_range_in_text_reflows_text_only() {
    let text = "<a>\n  <p>one    two</p>\n  <q   x='1'/>\n</a>";
    let start = text.find("one").unwrap();
    let (_, output) = format_range(text, start..start + 5);
    assert_eq!(output, "<a>\n  <p>one two</p>\n  <q   x='1'/>\n</a>");
}

#[test]
fn test_collapse_needs_end_tag_in_range() {
    let text = "<a>\n  <b x='1'>\n\n  </b>\n</a>";
    let doc = Document::parse_str(text);
    let formatter = XmlFormatter::new(FormattingOptions::default().empty_elements(EmptyElements::Collapse));

    let start_tag = text.find("<b").unwrap()..text.find("\n\n").unwrap();
    let edits = formatter.format(&doc, Some(start_tag), &CancelToken::new()).unwrap();
    assert_eq!(apply_edits(text, &edits).unwrap(), text);

    let edits = formatter.format(&doc, None, &CancelToken::new()).unwrap();
    assert_eq!(apply_edits(text, &edits).unwrap(), "<a>\n  <b x='1'/>\n</a>");
}

#[test]
fn test_format_positions() {
    let text = "<a>\n<b   x='1'/>\n<c   y='2'/>\n</a>";
    let doc = Document::parse_str(text);
    let range = Range::new(Position::new(1, 0), Position::new(1, 12));
    let edits = XmlFormatter::default()
        .format_positions(&doc, range, &CancelToken::new())
        .unwrap();
    assert_eq!(
        apply_edits(text, &edits).unwrap(),
        "<a>\n  <b x='1'/>\n<c   y='2'/>\n</a>"
    );
}

#[test]
fn test_format_positions_out_of_document() {
    let doc = Document::parse_str("<a><b/></a>");
    let range = Range::new(Position::new(0, 0), Position::new(7, 3));
    let edits = XmlFormatter::default()
        .format_positions(&doc, range, &CancelToken::new())
        .unwrap();
    assert!(edits.is_empty());
}

#[test]
fn test_reversed_range_yields_no_edits() {
    let doc = Document::parse_str("<a><b/></a>");
    let edits = XmlFormatter::default()
        .format(&doc, Some(std::ops::Range { start: 6, end: 2 }), &CancelToken::new())
        .unwrap();
    assert!(edits.is_empty());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn test_cancel_before_run() {
    let doc = Document::parse_str("<a><b/></a>");
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(cancel.is_cancelled());
    let result = XmlFormatter::default().format(&doc, None, &cancel);
    assert_eq!(result, Err(xmlfmt::error::FormatError::Cancelled));
}

/// Cancels the run the first time it is asked about an element.
struct CancelOnFirstElement(CancelToken);

impl FormatterParticipant for CancelOnFirstElement {
    fn suggest_category(
        &self,
        _doc: &Document,
        _element: NodeId,
        _parent: &FormattingConstraints,
    ) -> Option<WhitespaceCategory> {
        self.0.cancel();
        None
    }
}

#[test]
fn test_cancel_during_run() {
    let doc = Document::parse_str("<a><b/><c/></a>");
    let cancel = CancelToken::new();
    let formatter = XmlFormatter::default().with_participant(Box::new(CancelOnFirstElement(cancel.clone())));
    let result = formatter.format(&doc, None, &cancel);
    assert_eq!(result, Err(xmlfmt::error::FormatError::Cancelled));
}
