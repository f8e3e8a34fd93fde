//! Formatting scenarios, one group per node kind.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xmlfmt::format::{
    format_dtd_text, format_text, EmptyElements, EnforceQuoteStyle, FormattingOptions, QuoteStyle,
};

fn fmt(input: &str) -> String {
    format_text(input, &FormattingOptions::default()).unwrap()
}

fn fmt_with(input: &str, options: &FormattingOptions) -> String {
    format_text(input, options).unwrap()
}

// --- Elements ---

#[test]
fn test_element_only_indentation() {
    assert_eq!(fmt("<a><b/></a>"), "<a>\n  <b/>\n</a>");
}

#[test]
fn test_deep_nesting_with_tab_size_four() {
    let options = FormattingOptions::default().tab_size(4);
    assert_eq!(
        fmt_with("<a><b><c><d/></c></b></a>", &options),
        "<a>\n    <b>\n        <c>\n            <d/>\n        </c>\n    </b>\n</a>"
    );
}

#[test]
fn test_badly_indented_document() {
    let input = "<project>\n        <name>demo</name>\n<deps>\n   <dep/>\n      <dep/>\n</deps>\n   </project>";
    assert_eq!(
        fmt(input),
        "<project>\n  <name>demo</name>\n  <deps>\n    <dep/>\n    <dep/>\n  </deps>\n</project>"
    );
}

#[test]
fn test_blank_lines_between_elements_are_clamped() {
    let options = FormattingOptions::default().preserved_newlines(1);
    assert_eq!(
        fmt_with("<a>\n  <b/>\n\n\n\n  <c/>\n</a>", &options),
        "<a>\n  <b/>\n\n  <c/>\n</a>"
    );
}

#[test]
fn test_empty_element_collapse() {
    let options = FormattingOptions::default()
        .empty_elements(EmptyElements::Collapse)
        .space_before_empty_close_tag(true);
    assert_eq!(fmt_with("<foo></foo>", &options), "<foo />");
}

#[test]
fn test_empty_element_expand() {
    let options = FormattingOptions::default().empty_elements(EmptyElements::Expand);
    assert_eq!(fmt_with("<foo a='1'/>", &options), "<foo a='1'></foo>");
}

#[test]
fn test_element_with_children_is_never_collapsed() {
    let options = FormattingOptions::default().empty_elements(EmptyElements::Collapse);
    assert_eq!(fmt_with("<a><!-- c --></a>", &options), "<a><!-- c --></a>");
}

#[test]
fn test_preserve_space_pattern() {
    let options = FormattingOptions::default().preserve_space(vec!["xsl:*".to_string()]);
    let input = "<root><xsl:text>  a  </xsl:text></root>";
    assert_eq!(fmt_with(input, &options), "<root>\n  <xsl:text>  a  </xsl:text>\n</root>");
}

// --- Attributes ---

#[test]
fn test_attribute_spacing_normalized() {
    assert_eq!(fmt("<foo attr = \"v\" >"), "<foo attr=\"v\">");
}

#[test]
fn test_attribute_without_value() {
    assert_eq!(fmt("<input   disabled   checked  />"), "<input disabled checked/>");
}

#[test]
fn test_split_attributes_with_indent_size() {
    let options = FormattingOptions::default()
        .split_attributes(true)
        .split_attributes_indent_size(1);
    assert_eq!(
        fmt_with("<r><a x='1' y='2' z='3'/></r>", &options),
        "<r>\n  <a\n    x='1'\n    y='2'\n    z='3'/>\n</r>"
    );
}

#[test]
fn test_quote_isolation() {
    let options = FormattingOptions::default()
        .enforce_quote_style(EnforceQuoteStyle::Preferred)
        .quote_style(QuoteStyle::SingleQuotes);
    assert_eq!(fmt_with("<a b=\"it's\"/>", &options), "<a b=\"it's\"/>");
    assert_eq!(fmt_with("<a b=\"its\"/>", &options), "<a b='its'/>");
}

// --- Text ---

#[test]
fn test_text_reflow_breaks_between_words() {
    let options = FormattingOptions::default().max_line_width(30);
    let input = "<note>The quick brown fox jumps over the lazy dog again and again</note>";
    let output = fmt_with(input, &options);
    assert_eq!(
        output,
        "<note>The quick brown fox\n  jumps over the lazy dog\n  again and again</note>"
    );
    // every word survives intact
    let words = |s: &str| {
        s.split(|c: char| c.is_whitespace() || c == '<' || c == '>')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    assert_eq!(words(&output), words(input));
}

#[test]
fn test_mixed_content_spacing() {
    assert_eq!(
        fmt("<p>Hello   <b>big</b>   world</p>"),
        "<p>Hello <b>big</b> world</p>"
    );
}

#[test]
fn test_join_content_lines() {
    let options = FormattingOptions::default().join_content_lines(true);
    assert_eq!(
        fmt_with("<p>\n  line one\n  line two\n</p>", &options),
        "<p> line one line two </p>"
    );
}

// --- Comments, CDATA, processing instructions ---

#[test]
fn test_comment_between_elements() {
    assert_eq!(
        fmt("<a>\n<b/>\n    <!-- about c -->\n<c/></a>"),
        "<a>\n  <b/>\n  <!-- about c -->\n  <c/>\n</a>"
    );
}

#[test]
fn test_cdata_joined() {
    let options = FormattingOptions::default().join_cdata_lines(true);
    assert_eq!(
        fmt_with("<s><![CDATA[\n  if (a < b)\n  {  }\n]]></s>", &options),
        "<s><![CDATA[if (a < b) { }]]></s>"
    );
}

#[test]
fn test_prolog() {
    let input = "<?xml version = \"1.0\"   encoding=\"UTF-8\" ?><?xml-stylesheet href='s.css'   ?><root/>";
    assert_eq!(
        fmt(input),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?xml-stylesheet href='s.css'?>\n<root/>"
    );
}

// --- DTD ---

#[test]
fn test_doctype_with_internal_subset() {
    let input = "<?xml version='1.0'?>\n<!DOCTYPE  catalog  [\n<!ELEMENT catalog (book*)>\n\n<!-- books -->\n<!ELEMENT book   (#PCDATA)>\n]>\n<catalog/>";
    assert_eq!(
        fmt(input),
        "<?xml version='1.0'?>\n<!DOCTYPE catalog [\n  <!ELEMENT catalog (book*)>\n\n  <!-- books -->\n  <!ELEMENT book (#PCDATA)>\n]>\n<catalog/>"
    );
}

#[test]
fn test_public_doctype() {
    let input = "<!DOCTYPE html   PUBLIC  \"-//W3C//DTD XHTML 1.0 Strict//EN\"\n   \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\"  >\n<html/>";
    assert_eq!(
        fmt(input),
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n<html/>"
    );
}

#[test]
fn test_standalone_dtd_attlist() {
    let input = "<!ATTLIST   img\n src CDATA #REQUIRED   alt CDATA #IMPLIED\n  align (left|right) \"left\">";
    assert_eq!(
        format_dtd_text(input, &FormattingOptions::default()).unwrap(),
        "<!ATTLIST img src CDATA #REQUIRED\n  alt CDATA #IMPLIED\n  align (left|right) \"left\">"
    );
}

// --- Final newlines ---

#[test]
fn test_final_newline_inserted_once() {
    let options = FormattingOptions::default().insert_final_newline(true);
    assert_eq!(fmt_with("<a/>\n\n\n", &options), "<a/>\n");
    assert_eq!(fmt_with("<a/>", &options), "<a/>\n");
}
