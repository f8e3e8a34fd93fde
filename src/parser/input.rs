//! Low-level input handling for the tolerant parser.
//!
//! [`ParserInput`] wraps the source text with a byte cursor and the
//! scanning primitives the parser builds on: peeking, advancing, name and
//! token scanning, and diagnostic recording. The cursor only ever rests on
//! UTF-8 character boundaries.

use std::ops::Range;

use crate::error::{ErrorSeverity, ParseDiagnostic, SourceLocation};
use crate::tree::{Attribute, AttributeValue};

// -------------------------------------------------------------------------
// Character classes
// -------------------------------------------------------------------------

/// Returns `true` for the four XML whitespace bytes (XML 1.0 §2.3 `[3]`).
pub(crate) fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
///
/// Used to decide whether a `<` opens a start tag at all.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Lenient name character: anything that cannot end a name in a tag.
///
/// Names are not validated against XML 1.0 `NameChar`; the formatter must
/// keep malformed names intact rather than split them.
pub(crate) fn is_lenient_name_char(c: char) -> bool {
    !c.is_ascii_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '?')
}

/// Characters that end an unquoted DTD parameter token.
fn ends_dtd_token(b: u8) -> bool {
    is_xml_whitespace(b) || matches!(b, b'>' | b'<' | b'"' | b'\'' | b'(' | b'[' | b']')
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Cursor over the source text plus collected diagnostics.
pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> ParserInput<'a> {
    /// Creates a new cursor at the start of `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to `pos`, which must be a character boundary.
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.input.is_char_boundary(pos));
        self.pos = pos;
    }

    /// Returns the text between two offsets.
    pub fn slice(&self, range: Range<usize>) -> &'a str {
        &self.input[range]
    }

    /// Peeks at the current byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Peeks at the byte `offset` positions ahead.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Peeks at the character `offset` bytes ahead (which must be a boundary).
    pub fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset..)?.chars().next()
    }

    /// Advances by `count` bytes. Callers only skip ASCII they have matched.
    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    /// Advances past the current character, whatever its width.
    pub fn advance_char(&mut self) {
        if let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    /// Moves the cursor to the end of input.
    pub fn skip_to_end(&mut self) {
        self.pos = self.input.len();
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s)
    }

    /// Case-insensitive ASCII version of [`looking_at`](Self::looking_at).
    pub fn looking_at_ci(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..]
            .get(..s.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(s))
    }

    /// Skips XML whitespace, returning `true` if any was skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_xml_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Returns the offset of the next occurrence of `needle` at or after
    /// the cursor.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.input[self.pos..].find(needle).map(|i| self.pos + i)
    }

    /// Returns the offset of the next byte matching `pred` at or after the
    /// cursor, or the end of input.
    pub fn find_byte_or_end(&self, pred: impl Fn(u8) -> bool) -> usize {
        self.input.as_bytes()[self.pos..]
            .iter()
            .position(|&b| pred(b))
            .map_or(self.input.len(), |i| self.pos + i)
    }

    /// Consumes a lenient name and returns its span (possibly empty).
    pub fn take_name(&mut self) -> Range<usize> {
        let start = self.pos;
        for c in self.input[self.pos..].chars() {
            if !is_lenient_name_char(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        start..self.pos
    }

    /// Consumes an attribute (`name`, `name=`, or `name=value`).
    ///
    /// Returns `None` without consuming anything if no name starts here.
    pub fn parse_attribute(&mut self) -> Option<Attribute> {
        let name = self.take_name();
        if name.is_empty() {
            return None;
        }
        let mut attr = Attribute {
            name: self.slice(name.clone()).to_string(),
            name_start: name.start,
            name_end: name.end,
            delimiter: None,
            value: None,
        };

        let after_name = self.pos;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            self.pos = after_name;
            return Some(attr);
        }
        attr.delimiter = Some(self.pos);
        self.advance(1);
        let after_delimiter = self.pos;
        self.skip_whitespace();

        let value_start = self.pos;
        let value_end = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let closing = self.input.as_bytes()[value_start + 1..]
                    .iter()
                    .position(|&b| b == quote)
                    .map(|i| value_start + 1 + i + 1);
                closing.unwrap_or_else(|| {
                    self.advance(1);
                    self.find_byte_or_end(|b| b == b'>' || b == b'<')
                })
            }
            Some(b) if !is_xml_whitespace(b) && b != b'>' && b != b'<' && !self.looking_at(b"/>") => {
                let mut end = self.pos;
                while let Some(b) = self.input.as_bytes().get(end).copied() {
                    if is_xml_whitespace(b)
                        || b == b'>'
                        || b == b'<'
                        || (b == b'/' && self.input.as_bytes().get(end + 1) == Some(&b'>'))
                    {
                        break;
                    }
                    end += 1;
                }
                end
            }
            _ => {
                self.pos = after_delimiter;
                return Some(attr);
            }
        };
        self.pos = value_end;
        attr.value = Some(AttributeValue {
            start: value_start,
            end: value_end,
            raw: self.slice(value_start..value_end).to_string(),
        });
        Some(attr)
    }

    /// Consumes one DTD parameter token: a quoted string, a parenthesized
    /// group (with its occurrence indicator), or a bare word.
    pub fn take_dtd_token(&mut self) -> Range<usize> {
        let start = self.pos;
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.advance(1);
                self.pos = match self.find_byte_or_end(|b| b == quote || b == b'>') {
                    end if self.input.as_bytes().get(end) == Some(&quote) => end + 1,
                    end => end,
                };
            }
            Some(b'(') => {
                let mut depth = 0usize;
                while let Some(b) = self.peek() {
                    match b {
                        b'(' => depth += 1,
                        b')' => depth = depth.saturating_sub(1),
                        b'>' | b'<' => break,
                        _ => {}
                    }
                    self.advance_char();
                    if depth == 0 {
                        break;
                    }
                }
                while self.peek().is_some_and(|b| matches!(b, b'*' | b'+' | b'?')) {
                    self.advance(1);
                }
            }
            _ => {
                while self.peek().is_some_and(|b| !ends_dtd_token(b)) {
                    self.advance_char();
                }
                if self.pos == start {
                    // a lone bracket is its own token
                    self.advance_char();
                }
            }
        }
        start..self.pos
    }

    /// Parses `name="value"` pseudo-attributes over `range`.
    ///
    /// Returns an empty list unless the whole range is made of well-formed
    /// quoted pairs, so PI data like `<?php echo 1 ?>` is left alone.
    pub fn pseudo_attributes(&self, range: Range<usize>) -> Vec<Attribute> {
        let mut scan = ParserInput::new(&self.input[..range.end]);
        scan.set_pos(range.start);
        let mut attributes = Vec::new();
        loop {
            scan.skip_whitespace();
            if scan.at_end() {
                return attributes;
            }
            match scan.parse_attribute() {
                Some(attr)
                    if attr.value.as_ref().is_some_and(|value| {
                        value.raw.len() >= 2
                            && matches!(value.raw.as_bytes()[0], b'"' | b'\'')
                            && value.raw.as_bytes()[0] == value.raw.as_bytes()[value.raw.len() - 1]
                    }) =>
                {
                    attributes.push(attr);
                }
                _ => return Vec::new(),
            }
        }
    }

    // --- Diagnostics ---

    /// Computes the 1-based line/column location of `offset`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn location(&self, offset: usize) -> SourceLocation {
        let before = &self.input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        SourceLocation {
            line: line as u32,
            column: before[line_start..].chars().count() as u32 + 1,
            byte_offset: offset,
        }
    }

    /// Records a recovered problem at `offset`.
    pub fn push_diagnostic(&mut self, severity: ErrorSeverity, message: String, offset: usize) {
        let location = self.location(offset);
        self.diagnostics.push(ParseDiagnostic {
            severity,
            message,
            location,
        });
    }

    /// Takes the collected diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
