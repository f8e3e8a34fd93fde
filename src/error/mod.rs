//! Error types and diagnostics.
//!
//! Formatting itself never fails on malformed markup: the parser records
//! recovered problems as [`ParseDiagnostic`]s and the formatter degrades to
//! emitting fewer edits. The error enums here cover the remaining failure
//! channels: offset/position conversion, whole-document edit application,
//! and cooperative cancellation.

use std::fmt;

use thiserror::Error;

/// How serious a recovered parse problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Markup that is kept as written, e.g. a stray end tag.
    Warning,
    /// Malformed markup the parser had to recover from.
    Error,
}

impl ErrorSeverity {
    /// Returns the lowercase label used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a diagnostic was raised, as a human reads it: 1-based line and
/// column, plus the byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: u32,
    /// Counted in characters.
    pub column: u32,
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A problem the parser recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{severity}: {message} at {location}")]
pub struct ParseDiagnostic {
    pub severity: ErrorSeverity,
    pub message: String,
    pub location: SourceLocation,
}

/// Failure converting between byte offsets and line/character positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The offset lies past the end of the text.
    #[error("offset {offset} is out of bounds (text length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    /// The offset splits a multi-byte character.
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
    /// The line number lies past the last line.
    #[error("line {line} is out of bounds (line count {line_count})")]
    LineOutOfBounds { line: u32, line_count: usize },
}

/// Failure applying a list of edits to a text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Two edits cover intersecting ranges. Always an internal defect.
    #[error("edit starting at {start} overlaps previous edit ending at {previous_end}")]
    Overlapping { start: usize, previous_end: usize },
    /// An edit range does not fit the text it is applied to.
    #[error("edit range {start}..{end} is invalid for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// Failure decoding input bytes or encoding output text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The XML declaration names an encoding `encoding_rs` does not know.
    #[error("unsupported encoding: {0}")]
    Unsupported(String),
    /// The bytes are not valid in the detected encoding.
    #[error("malformed byte sequence for encoding {0}")]
    Malformed(&'static str),
    /// The text contains characters the target encoding cannot represent.
    #[error("text cannot be represented in encoding {0}")]
    Unmappable(&'static str),
}

/// The error type returned by a format run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The run was cancelled through its [`CancelToken`](crate::format::CancelToken).
    #[error("formatting was cancelled")]
    Cancelled,
    /// The computed edits could not be applied.
    #[error(transparent)]
    Edit(#[from] EditError),
}
