#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlfmt::format::{apply_edits, CancelToken, XmlFormatter};
use xmlfmt::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Formatting arbitrary input never panics, and its edits always apply
        let doc = Document::parse_str(s);
        if let Ok(edits) = XmlFormatter::default().format(&doc, None, &CancelToken::new()) {
            assert!(apply_edits(doc.text(), &edits).is_ok());
        }
    }
});
