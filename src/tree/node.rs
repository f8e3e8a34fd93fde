//! Node type definitions.
//!
//! The `NodeKind` enum represents every construct the formatter can see in
//! an XML or DTD document. Each variant carries the offsets of the syntax
//! pieces the formatter rewrites around (tag delimiters, parameters,
//! subsets). The node's overall span and closed flag live in `NodeData`.

use std::ops::Range;

use super::Attribute;

/// The kind of a node and its associated data.
///
/// All offsets are byte offsets into the document's source text.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element, e.g. `<div class="x">...</div>`.
    ///
    /// The element's start offset (in `NodeData`) is the `<` of its start tag.
    Element {
        /// The tag name as written, including any prefix.
        name: String,
        /// Attributes in document order. Names need not be unique.
        attributes: Vec<Attribute>,
        /// Offset of the start tag's `>`, or of the `/` in `/>`.
        /// `None` when the start tag is never terminated.
        start_tag_close: Option<usize>,
        /// Offset of the `<` of `</name`, if an end tag was found.
        end_tag_open: Option<usize>,
        /// Offset of the end tag's `>`, if the end tag is terminated.
        end_tag_close: Option<usize>,
        /// `true` for `<name/>`.
        self_closed: bool,
    },

    /// Character data between markup, including whitespace-only runs.
    Text,

    /// A CDATA section, `<![CDATA[...]]>`.
    CData,

    /// A comment, `<!-- ... -->`.
    Comment,

    /// A processing instruction, e.g. `<?xml version="1.0"?>`.
    ProcessingInstruction {
        /// The PI target (e.g. `"xml-stylesheet"`).
        target: String,
        /// Pseudo-attributes, when the PI data is a list of `name="value"`
        /// pairs. Empty otherwise.
        attributes: Vec<Attribute>,
    },

    /// A document type declaration, `<!DOCTYPE name ... [ subset ]>`.
    ///
    /// Declarations of the internal subset are the node's children.
    DocumentType {
        /// Parameters before the internal subset (name, `PUBLIC`, ids, ...).
        parameters: Vec<Range<usize>>,
        /// Offset of the `[` opening the internal subset.
        subset_open: Option<usize>,
        /// Offset of the `]` closing the internal subset.
        subset_close: Option<usize>,
    },

    /// A markup declaration, e.g. `<!ELEMENT note (to, from)>`.
    DtdDeclaration {
        /// Which declaration this is.
        kind: DeclarationKind,
        /// Offset just past the declaration keyword (`<!ELEMENT`).
        keyword_end: usize,
        /// Whitespace-separated parameters. Parenthesized groups and quoted
        /// strings are single parameters.
        parameters: Vec<Range<usize>>,
        /// For `ATTLIST`: ranges of indices into `parameters`, one per
        /// attribute definition. Empty for other declarations.
        attribute_groups: Vec<Range<usize>>,
    },
}

/// The keyword of a markup declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `<!ELEMENT`
    Element,
    /// `<!ATTLIST`
    AttList,
    /// `<!ENTITY`
    Entity,
    /// `<!NOTATION`
    Notation,
    /// Any other `<!KEYWORD`.
    Other,
}

impl DeclarationKind {
    /// Maps a declaration keyword (without `<!`) to its kind.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "ELEMENT" => Self::Element,
            "ATTLIST" => Self::AttList,
            "ENTITY" => Self::Entity,
            "NOTATION" => Self::Notation,
            _ => Self::Other,
        }
    }
}
