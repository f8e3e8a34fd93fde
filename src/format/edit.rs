//! Text edits and their accumulation.
//!
//! [`EditBuilder`] collects replacements while the formatter walks the
//! tree. A replacement whose text already matches the source is dropped,
//! so an already-formatted document yields no edits at all.

use std::ops::Range;

use serde::Serialize;
use tracing::error;

use crate::error::EditError;

/// A replacement of the byte range `start..end` by `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextEdit {
    /// Byte offset of the first replaced byte.
    pub start: usize,
    /// Byte offset just past the last replaced byte.
    pub end: usize,
    /// The replacement text.
    pub new_text: String,
}

impl TextEdit {
    /// Creates a new edit.
    #[must_use]
    pub fn new(start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            new_text: new_text.into(),
        }
    }
}

/// Applies `edits` to `text`.
///
/// Edits are sorted by start offset first; ties keep their relative order.
///
/// # Errors
///
/// Returns `EditError::InvalidRange` if an edit does not fit `text`, and
/// `EditError::Overlapping` if two edits cover intersecting ranges.
///
/// # Examples
///
/// ```
/// use xmlfmt::format::{apply_edits, TextEdit};
///
/// let edits = vec![TextEdit::new(6, 7, ""), TextEdit::new(3, 3, "\n  ")];
/// assert_eq!(apply_edits("<a><b/ ></a>", &edits).unwrap(), "<a>\n  <b/></a>");
/// ```
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| edit.start);

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for edit in sorted {
        check_range(text, edit.start, edit.end)?;
        if edit.start < last {
            return Err(EditError::Overlapping {
                start: edit.start,
                previous_end: last,
            });
        }
        output.push_str(&text[last..edit.start]);
        output.push_str(&edit.new_text);
        last = edit.end;
    }
    output.push_str(&text[last..]);
    Ok(output)
}

fn check_range(text: &str, start: usize, end: usize) -> Result<(), EditError> {
    if start > end
        || end > text.len()
        || !text.is_char_boundary(start)
        || !text.is_char_boundary(end)
    {
        return Err(EditError::InvalidRange {
            start,
            end,
            len: text.len(),
        });
    }
    Ok(())
}

/// Accumulates the edits of one format run.
///
/// Edits are recorded in the order the tree walk produces them, which is
/// ascending document order. All of them are kept until [`finish`] so that
/// line widths can be measured against the already-edited text.
///
/// [`finish`]: EditBuilder::finish
pub(crate) struct EditBuilder<'a> {
    text: &'a str,
    edits: Vec<TextEdit>,
}

impl<'a> EditBuilder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            edits: Vec::new(),
        }
    }

    /// Returns the edits recorded so far.
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Records the replacement of `start..end` by `new_text` unless the
    /// source already reads `new_text` there.
    pub fn replace(&mut self, start: usize, end: usize, new_text: &str) {
        if let Err(err) = check_range(self.text, start, end) {
            error!(start, end, "dropping edit: {err}");
            return;
        }
        if &self.text[start..end] == new_text {
            return;
        }
        if let Some(last) = self.edits.last() {
            debug_assert!(
                start >= last.end,
                "edit {start}..{end} recorded after {}..{}",
                last.start,
                last.end
            );
            if start < last.end && end > last.start {
                error!(start, end, previous_end = last.end, "dropping overlapping edit");
                return;
            }
        }
        self.edits.push(TextEdit::new(start, end, new_text));
    }

    /// Like [`replace`](Self::replace), but first forgets the recorded
    /// edits lying inside `start..end`. An insertion at `start` is kept.
    pub fn supersede(&mut self, start: usize, end: usize, new_text: &str) {
        while self
            .edits
            .last()
            .is_some_and(|last| last.start >= start && last.end <= end && last.end > start)
        {
            self.edits.pop();
        }
        self.replace(start, end, new_text);
    }

    /// Returns the edits intersecting `range`, sorted by start offset.
    pub fn finish(self, range: Range<usize>) -> Vec<TextEdit> {
        let mut edits: Vec<TextEdit> = self
            .edits
            .into_iter()
            .filter(|edit| edit.start <= range.end && edit.end >= range.start)
            .collect();
        edits.sort_by_key(|edit| edit.start);
        edits
    }
}
