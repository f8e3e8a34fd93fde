//! Core parser state machine.
//!
//! Builds the lossless node tree in a single forward pass. Markup that is
//! never terminated is kept as an unclosed node spanning what was seen, so
//! the formatter can still work around it.

use std::ops::Range;

use crate::error::ErrorSeverity;
use crate::text::TextDocument;
use crate::tree::{Attribute, DeclarationKind, Document, NodeId, NodeKind};

use super::input::{is_lenient_name_char, is_name_start_char, ParserInput};
use super::ParseOptions;

/// The tolerant parser.
pub(crate) struct XmlParser<'a> {
    /// Shared low-level input state (position, peek, advance, scanning).
    input: ParserInput<'a>,
    /// The document being built.
    doc: Document,
    /// Elements whose end tag has not been seen yet, innermost last.
    open: Vec<NodeId>,
    /// Standalone DTD mode.
    dtd: bool,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        Self {
            input: ParserInput::new(input),
            doc: Document::new(TextDocument::new(input), options.dtd),
            open: Vec::new(),
            dtd: options.dtd,
        }
    }

    /// Main parse entry point. Consumes the parser and returns the tree.
    pub fn parse(mut self) -> Document {
        let root = self.doc.root();
        if self.dtd {
            self.parse_dtd_content(root, false);
        } else {
            self.parse_content();
        }

        let end = self.input.pos();
        while let Some(id) = self.open.pop() {
            self.unclose(id, end);
        }
        self.doc.diagnostics = self.input.take_diagnostics();
        self.doc
    }

    fn parent(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn error(&mut self, message: String, offset: usize) {
        self.input
            .push_diagnostic(ErrorSeverity::Error, message, offset);
    }

    /// Appends a node spanning `start` to the cursor.
    fn leaf(&mut self, parent: NodeId, kind: NodeKind, start: usize, closed: bool) -> NodeId {
        let id = self.doc.create_node(kind, start);
        let node = self.doc.node_mut(id);
        node.end = self.input.pos();
        node.closed = closed;
        self.doc.append_child(parent, id);
        id
    }

    /// Marks an element as never closed, ending it at `end`.
    fn unclose(&mut self, id: NodeId, end: usize) {
        let node = self.doc.node_mut(id);
        node.closed = false;
        node.end = end;
        let start = node.start;
        let name = self.doc.node_name(id).unwrap_or_default().to_string();
        self.error(format!("element <{name}> is not closed"), start);
    }

    // --- Lookahead ---

    fn starts_start_tag(&self) -> bool {
        self.input.peek() == Some(b'<') && self.input.peek_char_at(1).is_some_and(is_name_start_char)
    }

    fn starts_end_tag(&self) -> bool {
        self.input.looking_at(b"</") && self.input.peek_char_at(2).is_some_and(is_lenient_name_char)
    }

    fn starts_declaration(&self) -> bool {
        self.input.looking_at(b"<!") && self.input.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic())
    }

    fn starts_markup(&self) -> bool {
        self.input.looking_at(b"<!--")
            || self.input.looking_at(b"<![CDATA[")
            || self.input.looking_at(b"<?")
            || self.starts_declaration()
            || self.starts_end_tag()
            || self.starts_start_tag()
    }

    fn starts_dtd_markup(&self, in_subset: bool) -> bool {
        self.input.looking_at(b"<!--")
            || self.input.looking_at(b"<?")
            || self.starts_declaration()
            || (in_subset && (self.starts_start_tag() || self.starts_end_tag()))
    }

    // --- Content ---

    fn parse_content(&mut self) {
        while !self.input.at_end() {
            let parent = self.parent();
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent);
            } else if self.input.looking_at(b"<![CDATA[") {
                self.parse_cdata(parent);
            } else if self.input.looking_at_ci(b"<!DOCTYPE") {
                self.parse_doctype(parent);
            } else if self.starts_declaration() {
                self.parse_declaration(parent, false);
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent);
            } else if self.starts_end_tag() {
                self.parse_end_tag(parent);
            } else if self.starts_start_tag() {
                self.parse_start_tag(parent);
            } else {
                self.parse_text(parent);
            }
        }
    }

    // --- Character Data ---

    /// Consumes text up to the next construct. A `<` that starts nothing
    /// is ordinary text.
    fn parse_text(&mut self, parent: NodeId) {
        let start = self.input.pos();
        loop {
            self.input.advance_char();
            let next = self.input.find_byte_or_end(|b| b == b'<');
            self.input.set_pos(next);
            if self.input.at_end() || self.starts_markup() {
                break;
            }
        }
        self.leaf(parent, NodeKind::Text, start, true);
    }

    // --- Elements ---

    fn parse_start_tag(&mut self, parent: NodeId) {
        let start = self.input.pos();
        self.input.advance(1);
        let name_range = self.input.take_name();
        let name = self.input.slice(name_range).to_string();

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut start_tag_close = None;
        let mut self_closed = false;
        loop {
            let before_ws = self.input.pos();
            self.input.skip_whitespace();
            match self.input.peek() {
                Some(b'>') => {
                    start_tag_close = Some(self.input.pos());
                    self.input.advance(1);
                    break;
                }
                Some(b'/') if self.input.looking_at(b"/>") => {
                    start_tag_close = Some(self.input.pos());
                    self_closed = true;
                    self.input.advance(2);
                    break;
                }
                None | Some(b'<') => {
                    self.input.set_pos(before_ws);
                    break;
                }
                Some(_) => {
                    if let Some(attr) = self.input.parse_attribute() {
                        attributes.push(attr);
                    } else {
                        let junk = self.input.pos();
                        self.input.advance_char();
                        self.error(format!("unexpected character in start tag <{name}>"), junk);
                    }
                }
            }
        }

        let terminated = start_tag_close.is_some();
        let kind = NodeKind::Element {
            name: name.clone(),
            attributes,
            start_tag_close,
            end_tag_open: None,
            end_tag_close: None,
            self_closed,
        };
        let id = self.leaf(parent, kind, start, terminated);
        if !terminated {
            self.error(format!("start tag <{name}> is not terminated"), start);
        } else if !self_closed {
            self.open.push(id);
        }
    }

    fn parse_end_tag(&mut self, parent: NodeId) {
        let start = self.input.pos();
        self.input.advance(2);
        let name_range = self.input.take_name();
        let name = self.input.slice(name_range).to_string();
        self.input.skip_whitespace();

        let close = match self.input.peek() {
            Some(b'>') => Some(self.input.pos()),
            _ => {
                let next = self.input.find_byte_or_end(|b| b == b'>' || b == b'<');
                if self.doc.text().as_bytes().get(next) == Some(&b'>') {
                    let junk = self.input.pos();
                    self.error(format!("unexpected content in end tag </{name}>"), junk);
                    Some(next)
                } else {
                    None
                }
            }
        };
        match close {
            Some(offset) => self.input.set_pos(offset + 1),
            None => {
                let end = self.input.find_byte_or_end(|b| b == b'<');
                // keep a trailing run of whitespace out of the tag
                let trimmed = self.input.slice(start..end).trim_end_matches([' ', '\t', '\r', '\n']).len();
                self.input.set_pos(start + trimmed);
            }
        }

        let Some(index) = self
            .open
            .iter()
            .rposition(|&id| self.doc.node_name(id) == Some(name.as_str()))
        else {
            self.leaf(parent, NodeKind::Text, start, true);
            self.input.push_diagnostic(
                ErrorSeverity::Warning,
                format!("unexpected end tag </{name}>"),
                start,
            );
            return;
        };

        while self.open.len() > index + 1 {
            if let Some(id) = self.open.pop() {
                self.unclose(id, start);
            }
        }
        let Some(id) = self.open.pop() else {
            return;
        };
        let end = self.input.pos();
        let node = self.doc.node_mut(id);
        if let NodeKind::Element {
            end_tag_open,
            end_tag_close,
            ..
        } = &mut node.kind
        {
            *end_tag_open = Some(start);
            *end_tag_close = close;
        }
        node.end = end;
        if close.is_none() {
            node.closed = false;
            self.error(format!("end tag </{name}> is not terminated"), start);
        }
    }

    // --- Comments, CDATA sections, processing instructions ---

    fn parse_delimited(&mut self, parent: NodeId, kind: NodeKind, open: usize, close: &str) {
        let start = self.input.pos();
        self.input.advance(open);
        let closed = match self.input.find(close) {
            Some(offset) => {
                self.input.set_pos(offset + close.len());
                true
            }
            None => {
                self.input.skip_to_end();
                false
            }
        };
        if !closed {
            self.error(format!("missing '{close}' before end of input"), start);
        }
        self.leaf(parent, kind, start, closed);
    }

    fn parse_comment(&mut self, parent: NodeId) {
        self.parse_delimited(parent, NodeKind::Comment, 4, "-->");
    }

    fn parse_cdata(&mut self, parent: NodeId) {
        self.parse_delimited(parent, NodeKind::CData, 9, "]]>");
    }

    fn parse_processing_instruction(&mut self, parent: NodeId) {
        let start = self.input.pos();
        self.input.advance(2);
        let target_range = self.input.take_name();
        let target = self.input.slice(target_range).to_string();
        let data_start = self.input.pos();
        let (data_end, closed) = match self.input.find("?>") {
            Some(offset) => {
                self.input.set_pos(offset + 2);
                (offset, true)
            }
            None => {
                self.input.skip_to_end();
                (self.input.pos(), false)
            }
        };
        if !closed {
            self.error(format!("processing instruction <?{target} is not terminated"), start);
        }
        let attributes = self.input.pseudo_attributes(data_start..data_end);
        self.leaf(
            parent,
            NodeKind::ProcessingInstruction { target, attributes },
            start,
            closed,
        );
    }

    // --- DOCTYPE Declaration ---

    fn parse_doctype(&mut self, parent: NodeId) {
        let start = self.input.pos();
        self.input.advance(b"<!DOCTYPE".len());
        let id = self.doc.create_node(
            NodeKind::DocumentType {
                parameters: Vec::new(),
                subset_open: None,
                subset_close: None,
            },
            start,
        );
        self.doc.append_child(parent, id);

        let mut parameters = Vec::new();
        let mut subset_open = None;
        let mut subset_close = None;
        let mut closed = false;
        loop {
            let before_ws = self.input.pos();
            self.input.skip_whitespace();
            match self.input.peek() {
                None | Some(b'<') => {
                    self.input.set_pos(before_ws);
                    break;
                }
                Some(b'>') => {
                    self.input.advance(1);
                    closed = true;
                    break;
                }
                Some(b'[') if subset_open.is_none() => {
                    subset_open = Some(self.input.pos());
                    self.input.advance(1);
                    self.parse_dtd_content(id, true);
                    if self.input.peek() != Some(b']') {
                        break;
                    }
                    subset_close = Some(self.input.pos());
                    self.input.advance(1);
                }
                Some(_) => parameters.push(self.input.take_dtd_token()),
            }
        }

        let end = self.input.pos();
        let node = self.doc.node_mut(id);
        node.kind = NodeKind::DocumentType {
            parameters,
            subset_open,
            subset_close,
        };
        node.end = end;
        node.closed = closed;
        if !closed {
            self.error("DOCTYPE declaration is not terminated".to_string(), start);
        }
    }

    // --- DTD content ---

    /// Parses markup declarations, comments, PIs, and the text between them
    /// until end of input or, inside an internal subset, the closing `]`.
    fn parse_dtd_content(&mut self, parent: NodeId, in_subset: bool) {
        while !self.input.at_end() {
            if in_subset
                && (self.input.peek() == Some(b']') || self.starts_start_tag() || self.starts_end_tag())
            {
                return;
            }
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent);
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent);
            } else if self.starts_declaration() {
                self.parse_declaration(parent, in_subset);
            } else {
                self.parse_dtd_text(parent, in_subset);
            }
        }
    }

    /// Text between declarations: whitespace, parameter-entity references,
    /// and anything unrecognized.
    fn parse_dtd_text(&mut self, parent: NodeId, in_subset: bool) {
        let start = self.input.pos();
        loop {
            self.input.advance_char();
            let next = self
                .input
                .find_byte_or_end(|b| b == b'<' || (in_subset && b == b']'));
            self.input.set_pos(next);
            if self.input.at_end()
                || (in_subset && self.input.peek() == Some(b']'))
                || self.starts_dtd_markup(in_subset)
            {
                break;
            }
        }
        self.leaf(parent, NodeKind::Text, start, true);
    }

    fn parse_declaration(&mut self, parent: NodeId, in_subset: bool) {
        let start = self.input.pos();
        self.input.advance(2);
        let keyword = self.input.take_name();
        let kind = DeclarationKind::from_keyword(self.input.slice(keyword.clone()));
        let keyword_end = keyword.end;

        let mut parameters: Vec<Range<usize>> = Vec::new();
        let mut closed = false;
        loop {
            self.input.skip_whitespace();
            match self.input.peek() {
                Some(b'>') => {
                    self.input.advance(1);
                    closed = true;
                    break;
                }
                None | Some(b'<') => break,
                Some(b']') if in_subset => break,
                Some(_) => parameters.push(self.input.take_dtd_token()),
            }
        }
        if !closed {
            let last = parameters.last().map_or(keyword_end, |p| p.end);
            self.input.set_pos(last);
            let keyword = self.input.slice(keyword.clone()).to_string();
            self.error(format!("<!{keyword} declaration is not terminated"), start);
        }

        let attribute_groups = if kind == DeclarationKind::AttList {
            self.attribute_groups(&parameters)
        } else {
            Vec::new()
        };
        self.leaf(
            parent,
            NodeKind::DtdDeclaration {
                kind,
                keyword_end,
                parameters,
                attribute_groups,
            },
            start,
            closed,
        );
    }

    /// Splits ATTLIST parameters after the element name into attribute
    /// definitions: name, type (`NOTATION` takes its group), default
    /// (`#FIXED` takes its value).
    fn attribute_groups(&self, parameters: &[Range<usize>]) -> Vec<Range<usize>> {
        let token = |i: usize| self.input.slice(parameters[i].clone());
        let mut groups = Vec::new();
        let mut i = 1;
        while i < parameters.len() {
            let group_start = i;
            i += 1;
            if i < parameters.len() {
                let notation = token(i) == "NOTATION";
                i += 1;
                if notation && i < parameters.len() {
                    i += 1;
                }
            }
            if i < parameters.len() {
                let fixed = token(i) == "#FIXED";
                i += 1;
                if fixed && i < parameters.len() {
                    i += 1;
                }
            }
            groups.push(group_start..i);
        }
        groups
    }
}
