#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use xmlfmt::format::{apply_edits, CancelToken, FormattingOptions, XmlFormatter};
use xmlfmt::Document;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small unformatted document with approximately 10 elements.
fn make_small_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><root>");
    for i in 0..10 {
        let _ = write!(xml, "<item   id = \"{i}\">Value   {i}</item>");
    }
    xml.push_str("</root>");
    xml
}

/// Generates a medium document with approximately 100 elements, mixed
/// content and comments.
fn make_medium_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "<book id='bk{i}'><!-- entry {i} --><title>Title {i}</title>\
             <author>Author {i}</author>\
             <p>Some <b>bold</b> text   about book {i}.</p>\
             <price>{}.99</price></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

/// Generates a large document with approximately 1000 elements.
fn make_large_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "      <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status><empty></empty></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a document whose text content must be wrapped.
fn make_long_text_xml() -> String {
    let mut xml = String::from("<doc>");
    for i in 0..200 {
        let _ = write!(xml, "<para>");
        for j in 0..60 {
            let _ = write!(xml, "word{i}x{j} ");
        }
        xml.push_str("</para>");
    }
    xml.push_str("</doc>");
    xml
}

/// Generates a DTD with many declarations.
fn make_dtd() -> String {
    let mut dtd = String::new();
    for i in 0..200 {
        let _ = write!(
            dtd,
            "<!ELEMENT  e{i}  (#PCDATA)>   <!ATTLIST e{i} a CDATA #IMPLIED b (x|y) 'x' c CDATA #FIXED \"1\">"
        );
    }
    dtd
}

fn edits(doc: &Document, options: &FormattingOptions) -> usize {
    let formatter = XmlFormatter::new(options.clone());
    formatter.format(doc, None, &CancelToken::new()).unwrap().len()
}

// ---------------------------------------------------------------------------
// Formatting benchmarks
// ---------------------------------------------------------------------------

fn bench_format_small(c: &mut Criterion) {
    let doc = Document::parse_str(&make_small_xml());
    let options = FormattingOptions::default();
    c.bench_function("format_small", |b| {
        b.iter(|| edits(black_box(&doc), &options));
    });
}

fn bench_format_medium(c: &mut Criterion) {
    let doc = Document::parse_str(&make_medium_xml());
    let options = FormattingOptions::default();
    c.bench_function("format_medium", |b| {
        b.iter(|| edits(black_box(&doc), &options));
    });
}

fn bench_format_large(c: &mut Criterion) {
    let doc = Document::parse_str(&make_large_xml());
    let options = FormattingOptions::default();
    c.bench_function("format_large", |b| {
        b.iter(|| edits(black_box(&doc), &options));
    });
}

fn bench_format_wrapping(c: &mut Criterion) {
    let doc = Document::parse_str(&make_long_text_xml());
    let options = FormattingOptions::default().join_content_lines(true);
    c.bench_function("format_wrapping", |b| {
        b.iter(|| edits(black_box(&doc), &options));
    });
}

fn bench_format_dtd(c: &mut Criterion) {
    let doc = Document::parse_dtd_str(&make_dtd());
    let options = FormattingOptions::default();
    c.bench_function("format_dtd", |b| {
        b.iter(|| edits(black_box(&doc), &options));
    });
}

// ---------------------------------------------------------------------------
// End-to-end benchmark
// ---------------------------------------------------------------------------

fn bench_parse_format_apply(c: &mut Criterion) {
    let xml = make_large_xml();
    let formatter = XmlFormatter::default();
    c.bench_function("parse_format_apply_large", |b| {
        b.iter(|| {
            let doc = Document::parse_str(black_box(&xml));
            let edits = formatter.format(&doc, None, &CancelToken::new()).unwrap();
            apply_edits(doc.text(), &edits).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_format_small,
    bench_format_medium,
    bench_format_large,
    bench_format_wrapping,
    bench_format_dtd,
    bench_parse_format_apply,
);
criterion_main!(benches);
