//! Tolerant XML and DTD parser.
//!
//! A hand-rolled single-pass parser that builds a lossless [`Document`]
//! tree for the formatter. It never fails: unterminated constructs become
//! nodes with `closed == false`, stray end tags become text, and every
//! recovery is reported in [`Document::diagnostics`].
//!
//! Element nesting is tracked with an explicit stack, so arbitrarily deep
//! input cannot overflow the call stack.

pub(crate) mod input;
mod xml;

use crate::tree::Document;

/// Parse options controlling parser behavior.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xmlfmt::parser::ParseOptions;
///
/// let opts = ParseOptions::default().dtd(true);
/// assert!(opts.dtd);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// If true, the input is a standalone DTD file (a sequence of markup
    /// declarations) rather than an XML document.
    pub dtd: bool,
}

impl ParseOptions {
    /// Selects standalone DTD mode.
    #[must_use]
    pub fn dtd(mut self, yes: bool) -> Self {
        self.dtd = yes;
        self
    }
}

/// Parses an XML string with default options.
#[must_use]
pub fn parse_str(input: &str) -> Document {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses a string with the given options.
#[must_use]
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Document {
    xml::XmlParser::new(input, options).parse()
}
