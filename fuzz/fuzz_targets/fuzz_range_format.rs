#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlfmt::format::{apply_edits, CancelToken, XmlFormatter};
use xmlfmt::Document;

fuzz_target!(|input: (u16, u16, &str)| {
    let (a, b, s) = input;
    let doc = Document::parse_str(s);
    let start = usize::from(a.min(b));
    let end = usize::from(a.max(b));
    // Out-of-bounds ranges are rejected without edits
    if let Ok(edits) = XmlFormatter::default().format(&doc, Some(start..end), &CancelToken::new()) {
        assert!(apply_edits(doc.text(), &edits).is_ok());
    }
});
