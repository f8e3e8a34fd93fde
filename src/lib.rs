//! # xmlfmt
//!
//! A structural XML formatter. Documents are parsed by a tolerant parser
//! into a lossless tree, and the formatter computes the minimal list of
//! non-overlapping text edits that normalize indentation, attribute
//! layout, quoting, and empty elements, without ever touching significant
//! whitespace.
//!
//! ## Quick Start
//!
//! ```
//! use xmlfmt::format::{format_text, FormattingOptions};
//!
//! let formatted = format_text("<root><child   a = 'x'/></root>", &FormattingOptions::default()).unwrap();
//! assert_eq!(formatted, "<root>\n  <child a='x'/>\n</root>");
//! ```
//!
//! To format only part of a document, or to get the edits rather than the
//! formatted text, use [`XmlFormatter`]:
//!
//! ```
//! use xmlfmt::format::{CancelToken, XmlFormatter};
//! use xmlfmt::Document;
//!
//! let doc = Document::parse_str("<root><child/></root>");
//! let edits = XmlFormatter::default().format(&doc, None, &CancelToken::new()).unwrap();
//! assert_eq!(edits.len(), 2);
//! ```

pub mod encoding;
pub mod error;
pub mod format;
pub mod parser;
pub mod text;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use format::{format_dtd_text, format_text, FormattingOptions, TextEdit, XmlFormatter};
pub use tree::{Attribute, Document, NodeId};
