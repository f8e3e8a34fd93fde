//! Structural formatting.
//!
//! [`XmlFormatter`] walks a parsed [`Document`] and computes the minimal
//! list of [`TextEdit`]s that bring its whitespace, indentation, quoting,
//! and empty-element shape in line with [`FormattingOptions`]. Only
//! whitespace is ever inserted or removed, apart from quote characters and
//! the `<a/>` / `<a></a>` canonicalization.
//!
//! The walk threads [`FormattingConstraints`] down the tree: each node is
//! formatted with the constraints of the scope it lives in, and each
//! element forks a new scope for its children. Line widths are measured
//! against the text as it reads after the edits recorded so far, so a
//! second run over the output produces no edits.
//!
//! # Examples
//!
//! ```
//! use xmlfmt::format::{format_text, FormattingOptions};
//!
//! let formatted = format_text("<a><b   x = \"1\"/></a>", &FormattingOptions::default()).unwrap();
//! assert_eq!(formatted, "<a>\n  <b x=\"1\"/>\n</a>");
//! ```

mod attribute;
mod category;
mod comment;
mod constraints;
mod doctype;
mod edit;
mod element;
mod options;
mod pi;
mod scan;
mod schema_location;
mod text;

pub use category::{AttributeValueContext, FormatterParticipant, WhitespaceCategory};
pub use constraints::FormattingConstraints;
pub use edit::{apply_edits, TextEdit};
pub use options::{EmptyElements, EnforceQuoteStyle, FormattingOptions, QuoteStyle, SchemaLocationSplit};
pub use schema_location::{SchemaLocationParticipant, XSI_NAMESPACE};

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::FormatError;
use crate::tree::{Document, NodeId, NodeKind};

use category::classify;
use edit::EditBuilder;
use scan::{column_width, count_line_breaks, is_whitespace, last_line_width};

// -------------------------------------------------------------------------
// Cancellation
// -------------------------------------------------------------------------

/// A cooperative cancellation flag shared between a format run and the
/// code that may want to abort it.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every run observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

// -------------------------------------------------------------------------
// Public API
// -------------------------------------------------------------------------

/// The formatter: settings plus registered participants.
pub struct XmlFormatter {
    options: FormattingOptions,
    participants: Vec<Box<dyn FormatterParticipant>>,
}

impl fmt::Debug for XmlFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlFormatter")
            .field("options", &self.options)
            .field("participants", &self.participants.len())
            .finish()
    }
}

impl Default for XmlFormatter {
    fn default() -> Self {
        Self::new(FormattingOptions::default())
    }
}

impl XmlFormatter {
    /// Creates a formatter with the given settings and the built-in
    /// [`SchemaLocationParticipant`].
    #[must_use]
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            participants: vec![Box::new(SchemaLocationParticipant)],
        }
    }

    /// Registers a participant after the ones already registered.
    #[must_use]
    pub fn with_participant(mut self, participant: Box<dyn FormatterParticipant>) -> Self {
        self.participants.push(participant);
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Computes the edits that format `doc`, or only the part of it
    /// intersecting the byte `range`.
    ///
    /// The edits are sorted by start offset and never overlap. An invalid
    /// range is logged and yields no edits.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Cancelled` if `cancel` is triggered during the
    /// run.
    pub fn format(
        &self,
        doc: &Document,
        range: Option<Range<usize>>,
        cancel: &CancelToken,
    ) -> Result<Vec<TextEdit>, FormatError> {
        let text = doc.text();
        let range = range.unwrap_or(0..text.len());
        if range.start > range.end
            || range.end > text.len()
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            warn!(
                start = range.start,
                end = range.end,
                len = text.len(),
                "ignoring invalid format range"
            );
            return Ok(Vec::new());
        }

        debug!(start = range.start, end = range.end, dtd = doc.is_dtd(), "formatting");
        let mut formatter = FormatterDocument::new(doc, &self.options, &self.participants, range.clone(), cancel);
        formatter.format_range()?;
        let edits = formatter.edits.finish(range);
        debug!(edits = edits.len(), "formatting finished");
        Ok(edits)
    }

    /// Like [`format`](Self::format), with the range given as positions.
    ///
    /// A range that cannot be converted to offsets is logged and yields no
    /// edits.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Cancelled` if `cancel` is triggered during the
    /// run.
    pub fn format_positions(
        &self,
        doc: &Document,
        range: crate::text::Range,
        cancel: &CancelToken,
    ) -> Result<Vec<TextEdit>, FormatError> {
        match doc.text_document().offset_range(range) {
            Ok(offsets) => self.format(doc, Some(offsets), cancel),
            Err(err) => {
                warn!(%err, "cannot convert format range");
                Ok(Vec::new())
            }
        }
    }
}

/// Parses and formats an XML document, returning the formatted text.
///
/// # Errors
///
/// Returns `FormatError::Edit` if the computed edits cannot be applied,
/// which indicates a formatter defect.
pub fn format_text(text: &str, options: &FormattingOptions) -> Result<String, FormatError> {
    format_document(&Document::parse_str(text), options)
}

/// Parses and formats a standalone DTD, returning the formatted text.
///
/// # Errors
///
/// Returns `FormatError::Edit` if the computed edits cannot be applied,
/// which indicates a formatter defect.
pub fn format_dtd_text(text: &str, options: &FormattingOptions) -> Result<String, FormatError> {
    format_document(&Document::parse_dtd_str(text), options)
}

fn format_document(doc: &Document, options: &FormattingOptions) -> Result<String, FormatError> {
    let formatter = XmlFormatter::new(options.clone());
    let edits = formatter.format(doc, None, &CancelToken::new())?;
    Ok(apply_edits(doc.text(), &edits)?)
}

// -------------------------------------------------------------------------
// The tree walk
// -------------------------------------------------------------------------

/// State of one format run. Node formatters live in the sibling modules
/// as further `impl` blocks.
pub(crate) struct FormatterDocument<'a> {
    doc: &'a Document,
    text: &'a str,
    options: &'a FormattingOptions,
    participants: &'a [Box<dyn FormatterParticipant>],
    range: Range<usize>,
    cancel: &'a CancelToken,
    edits: EditBuilder<'a>,
    line_delimiter: &'static str,
}

impl<'a> FormatterDocument<'a> {
    fn new(
        doc: &'a Document,
        options: &'a FormattingOptions,
        participants: &'a [Box<dyn FormatterParticipant>],
        range: Range<usize>,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            doc,
            text: doc.text(),
            options,
            participants,
            range,
            cancel,
            edits: EditBuilder::new(doc.text()),
            line_delimiter: doc.text_document().line_delimiter(),
        }
    }

    fn format_range(&mut self) -> Result<(), FormatError> {
        let doc = self.doc;
        let range = self.range.clone();
        let root = self.range_root(&range);
        if root == doc.root() {
            let mut scope = FormattingConstraints::new(0, self.max_width(), WhitespaceCategory::IgnoreSpace);
            self.format_node(root, &mut scope)?;
        } else {
            let start = doc.node(root).start;
            let line_start = match doc.text_document().line_offset_at(start) {
                Ok(offset) => offset,
                Err(err) => {
                    error!(offset = start, %err, "cannot locate the line of the format root");
                    return Ok(());
                }
            };
            let mut scope = self.root_scope(root);
            scope.available_line_width =
                self.max_width() - column_width(&self.text[line_start..start], self.options.tab_size);

            let mut current = Some(root);
            while let Some(id) = current {
                self.check_cancelled()?;
                if doc.node(id).start > range.end {
                    break;
                }
                self.format_node(id, &mut scope)?;
                current = doc.next_sibling(id);
            }
        }
        self.format_final_newlines();
        Ok(())
    }

    /// Finds the smallest node covering both ends of `range`.
    fn range_root(&self, range: &Range<usize>) -> NodeId {
        let doc = self.doc;
        if range.start == 0 && range.end >= self.text.len() {
            return doc.root();
        }
        let start_node = doc.find_node_at(range.start);
        let end_node = doc.find_node_before(range.end);
        if doc.node(end_node).start == range.start {
            return end_node;
        }
        let (mut a, mut b) = (Some(start_node), Some(end_node));
        while let (Some(x), Some(y)) = (a, b) {
            if doc.covers(x, y) {
                return x;
            }
            if doc.covers(y, x) {
                return y;
            }
            a = doc.parent(x);
            b = doc.parent(y);
        }
        doc.root()
    }

    /// Rebuilds the constraints of the scope `root` lives in by classifying
    /// its ancestors from the top down.
    fn root_scope(&self, root: NodeId) -> FormattingConstraints {
        let doc = self.doc;
        let mut scope = FormattingConstraints::new(0, self.max_width(), WhitespaceCategory::IgnoreSpace);
        let ancestors: Vec<NodeId> = doc.ancestors(root).skip(1).collect();
        for &id in ancestors.iter().rev() {
            match doc.node(id).kind {
                NodeKind::Element { .. } => {
                    scope.category = classify(doc, self.options, self.participants, id, &scope);
                    if doc.node(id).closed {
                        scope.indent_level += 1;
                    }
                }
                NodeKind::DocumentType { .. } => {
                    scope.category = WhitespaceCategory::IgnoreSpace;
                    scope.indent_level += 1;
                }
                _ => {}
            }
        }
        scope
    }

    fn check_cancelled(&self) -> Result<(), FormatError> {
        if self.cancel.is_cancelled() {
            debug!("formatting cancelled");
            return Err(FormatError::Cancelled);
        }
        Ok(())
    }

    /// Formats one node inside the scope `constraints` and advances the
    /// scope's line width past it.
    fn format_node(&mut self, id: NodeId, constraints: &mut FormattingConstraints) -> Result<(), FormatError> {
        let doc = self.doc;
        match &doc.node(id).kind {
            NodeKind::Document => {
                let mut scope = FormattingConstraints::new(0, self.max_width(), WhitespaceCategory::IgnoreSpace);
                self.format_children(id, &mut scope)?;
            }
            NodeKind::Element { .. } => self.format_element(id, constraints)?,
            NodeKind::Text => self.format_text(id, constraints),
            NodeKind::CData => self.format_cdata(id, constraints),
            NodeKind::Comment => self.format_comment(id, constraints),
            NodeKind::ProcessingInstruction { .. } => self.format_processing_instruction(id, constraints),
            NodeKind::DocumentType { .. } => self.format_doctype(id, constraints)?,
            NodeKind::DtdDeclaration { .. } => self.format_declaration(id, constraints),
        }
        constraints.available_line_width = self.available_width_at(doc.node(id).end);
        Ok(())
    }

    fn format_children(&mut self, parent: NodeId, constraints: &mut FormattingConstraints) -> Result<(), FormatError> {
        let doc = self.doc;
        for child in doc.children(parent) {
            self.check_cancelled()?;
            self.format_node(child, constraints)?;
        }
        Ok(())
    }

    /// Trims line breaks (and, if configured, trailing blanks) at the end of
    /// the document and inserts the final line break.
    ///
    /// Works on the trailing whitespace as it reads after the recorded
    /// edits, and replaces those edits when it changes it.
    fn format_final_newlines(&mut self) {
        let text = self.text;
        let len = text.len();
        if len == 0 {
            return;
        }
        let options = self.options;
        let (from, tail) = self.edited_tail();

        let mut wanted = tail.clone();
        if options.trim_trailing_whitespace {
            let kept = wanted.trim_end_matches([' ', '\t']).len();
            wanted.truncate(kept);
        }
        if options.trim_final_newlines {
            let body = wanted.trim_end_matches(['\n', '\r']).len();
            if body < wanted.len() {
                let keep = match &wanted[body..] {
                    _ if !options.insert_final_newline => 0,
                    breaks if breaks.starts_with("\r\n") => 2,
                    _ => 1,
                };
                wanted.truncate(body + keep);
            }
        }
        if options.insert_final_newline {
            let ends_with_break = if wanted.is_empty() {
                from == 0 || text[..from].ends_with(['\n', '\r'])
            } else {
                wanted.ends_with(['\n', '\r'])
            };
            if !ends_with_break {
                wanted.push_str(self.line_delimiter);
            }
        }
        if wanted != tail {
            self.edits.supersede(from, len, &wanted);
        }
    }

    /// Start of the whitespace ending the document, widened to the recorded
    /// edits reaching into it, and that stretch as edited so far.
    fn edited_tail(&self) -> (usize, String) {
        let text = self.text;
        let mut from = self.whitespace_start(0, text.len());
        let edits = self.edits.edits();
        let touching = &edits[edits.partition_point(|edit| edit.end <= from)..];
        if let Some(edit) = touching.first() {
            from = from.min(edit.start);
        }
        let mut tail = String::new();
        let mut pos = from;
        for edit in touching {
            tail.push_str(&text[pos..edit.start]);
            tail.push_str(&edit.new_text);
            pos = edit.end;
        }
        tail.push_str(&text[pos..]);
        (from, tail)
    }

    // --- Measurement ---

    fn wraps(&self) -> bool {
        self.options.max_line_width > 0
    }

    fn max_width(&self) -> i32 {
        i32::try_from(self.options.max_line_width).unwrap_or(i32::MAX)
    }

    /// Column of `offset` in the text as edited so far.
    fn column_at(&self, offset: usize) -> i32 {
        let tab = self.options.tab_size;
        let mut width = 0;
        let mut pos = offset;
        for edit in self.edits.edits().iter().rev() {
            if edit.end > pos {
                continue;
            }
            let original = &self.text[edit.end..pos];
            if let Some(tail) = last_line_width(original, tab) {
                return width + tail;
            }
            width += column_width(original, tab);
            if let Some(tail) = last_line_width(&edit.new_text, tab) {
                return width + tail;
            }
            width += column_width(&edit.new_text, tab);
            pos = edit.start;
        }
        let original = &self.text[..pos];
        width + last_line_width(original, tab).unwrap_or_else(|| column_width(original, tab))
    }

    /// Columns left on the line at `offset` in the text as edited so far.
    fn available_width_at(&self, offset: usize) -> i32 {
        self.max_width() - self.column_at(offset)
    }

    // --- Whitespace helpers ---

    fn indentation(&self, level: usize) -> String {
        self.options.indentation(level)
    }

    /// A line break followed by the indentation for `level`.
    fn new_line(&self, level: usize) -> String {
        let mut s = String::from(self.line_delimiter);
        s.push_str(&self.indentation(level));
        s
    }

    /// Start of the whitespace run ending at `to`, not going below `left_limit`.
    fn whitespace_start(&self, left_limit: usize, to: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut start = to;
        while start > left_limit && is_whitespace(bytes[start - 1]) {
            start -= 1;
        }
        start
    }

    /// Replaces `from..to` with line breaks and indentation, keeping up to
    /// `preserved_newlines` blank lines. Edits already recorded inside the
    /// run are dropped.
    fn reindent(&mut self, from: usize, to: usize, level: usize) {
        let breaks = count_line_breaks(&self.text[from..to]).clamp(1, self.options.preserved_newlines + 1);
        let mut replacement = self.line_delimiter.repeat(breaks);
        replacement.push_str(&self.indentation(level));
        self.edits.supersede(from, to, &replacement);
    }

    /// Puts a node that starts at `start` on its own indented line, or at
    /// the very start of the document when only whitespace precedes it.
    fn format_leading_whitespace(&mut self, start: usize, level: usize) {
        let from = self.whitespace_start(0, start);
        if from == 0 {
            self.edits.supersede(0, start, "");
        } else {
            self.reindent(from, start, level);
        }
    }
}
