//! Source text with line bookkeeping.
//!
//! [`TextDocument`] owns the text being formatted and converts between byte
//! offsets and zero-based `(line, character)` positions. Characters are
//! counted in Unicode scalar values from the start of the line. `\n`,
//! `\r\n`, and a lone `\r` all terminate a line.

use serde::{Deserialize, Serialize};

use crate::error::PositionError;

/// A zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// The text of a document plus a line-start index.
#[derive(Debug, Clone)]
pub struct TextDocument {
    text: String,
    /// Byte offset of the first character of every line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl TextDocument {
    /// Wraps `text`, indexing its line starts.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self { text, line_starts }
    }

    /// Returns the full text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the number of lines (at least 1).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the byte offset of the start of the line containing `offset`.
    ///
    /// # Errors
    ///
    /// Returns `PositionError` if `offset` is past the end of the text or
    /// not on a character boundary.
    pub fn line_offset_at(&self, offset: usize) -> Result<usize, PositionError> {
        self.check_offset(offset)?;
        let line = self.line_index(offset);
        Ok(self.line_starts[line])
    }

    /// Converts a byte offset to a position.
    ///
    /// # Errors
    ///
    /// Returns `PositionError` if `offset` is past the end of the text or
    /// not on a character boundary.
    #[allow(clippy::cast_possible_truncation)]
    pub fn position_at(&self, offset: usize) -> Result<Position, PositionError> {
        self.check_offset(offset)?;
        let line = self.line_index(offset);
        let character = self.text[self.line_starts[line]..offset].chars().count();
        Ok(Position::new(line as u32, character as u32))
    }

    /// Converts a position to a byte offset.
    ///
    /// A character past the end of its line clamps to the end of that line
    /// (before the line break), matching how editors report cursor positions.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::LineOutOfBounds` if the line does not exist.
    pub fn offset_at(&self, position: Position) -> Result<usize, PositionError> {
        let line = position.line as usize;
        let Some(&line_start) = self.line_starts.get(line) else {
            return Err(PositionError::LineOutOfBounds {
                line: position.line,
                line_count: self.line_starts.len(),
            });
        };
        let line_end = self.content_end_of_line(line);
        let offset = self.text[line_start..line_end]
            .char_indices()
            .nth(position.character as usize)
            .map_or(line_end, |(i, _)| line_start + i);
        Ok(offset)
    }

    /// Converts a position range to a byte offset range.
    ///
    /// # Errors
    ///
    /// Returns `PositionError` if either end cannot be converted.
    pub fn offset_range(&self, range: Range) -> Result<std::ops::Range<usize>, PositionError> {
        Ok(self.offset_at(range.start)?..self.offset_at(range.end)?)
    }

    /// Converts a byte offset range to a position range.
    ///
    /// # Errors
    ///
    /// Returns `PositionError` if either end cannot be converted.
    pub fn range_of(&self, start: usize, end: usize) -> Result<Range, PositionError> {
        Ok(Range::new(self.position_at(start)?, self.position_at(end)?))
    }

    /// Returns the line break used most often in the text. Ties go to
    /// `"\n"`, then `"\r\n"`; text without line breaks gets `"\n"`.
    #[must_use]
    pub fn line_delimiter(&self) -> &'static str {
        const DELIMITERS: [&str; 3] = ["\n", "\r\n", "\r"];
        let mut counts = [0usize; 3];
        for &next in self.line_starts.iter().skip(1) {
            let line = &self.text[..next];
            let kind = if line.ends_with("\r\n") {
                1
            } else if line.ends_with('\r') {
                2
            } else {
                0
            };
            counts[kind] += 1;
        }
        let mut best = 0;
        for (kind, &count) in counts.iter().enumerate().skip(1) {
            if count > counts[best] {
                best = kind;
            }
        }
        DELIMITERS[best]
    }

    fn check_offset(&self, offset: usize) -> Result<(), PositionError> {
        if offset > self.text.len() {
            return Err(PositionError::OffsetOutOfBounds {
                offset,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(PositionError::NotCharBoundary { offset });
        }
        Ok(())
    }

    fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// End of the line's content, excluding its line break.
    fn content_end_of_line(&self, line: usize) -> usize {
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let content = &self.text[self.line_starts[line]..end];
        let trimmed = content
            .strip_suffix("\r\n")
            .or_else(|| content.strip_suffix('\n'))
            .or_else(|| content.strip_suffix('\r'))
            .unwrap_or(content);
        self.line_starts[line] + trimmed.len()
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                starts.push(i + 2);
                i += 2;
            }
            b'\r' | b'\n' => {
                starts.push(i + 1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    starts
}
