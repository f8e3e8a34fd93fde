//! Arena-based document tree.
//!
//! Nodes live in one `Vec<NodeData>` owned by the [`Document`], in the
//! order the parser creates them, and point at each other through
//! [`NodeId`]s. The formatter walks both down (children) and up (the
//! ancestors of a range root), so every node keeps its parent and both
//! sibling links.
//!
//! Every node records the byte span it covers in the source text. The tree
//! is a lossless cover of the text: whitespace between markup is kept as
//! `Text` nodes, and malformed constructs are kept with `closed == false`
//! rather than dropped. Child spans are monotonically non-decreasing and
//! contained within the parent's span.

mod node;

pub use node::{DeclarationKind, NodeKind};

use std::iter;
use std::num::NonZeroU32;

use crate::error::ParseDiagnostic;
use crate::text::TextDocument;

/// Handle of a node in its [`Document`].
///
/// Stored one-based so that `Option<NodeId>` stays four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[allow(clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index as u32))
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Tree links of one node.
#[derive(Debug, Clone, Copy, Default)]
struct Links {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
}

/// One node: its kind and the span of source text it covers.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Byte offset where the node starts.
    pub start: usize,
    /// Byte offset just past the node's last byte.
    pub end: usize,
    /// `false` when the construct is never terminated (unclosed element,
    /// comment running to end of input, ...).
    pub closed: bool,
    links: Links,
}

impl NodeData {
    fn new(kind: NodeKind, start: usize) -> Self {
        Self {
            kind,
            start,
            end: start,
            closed: true,
            links: Links::default(),
        }
    }
}

/// The value part of an attribute, `"v"` in `name="v"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// Offset of the first byte (the opening quote, if quoted).
    pub start: usize,
    /// Offset just past the last byte (the closing quote, if quoted).
    pub end: usize,
    /// The value exactly as written, delimiters included.
    pub raw: String,
}

impl AttributeValue {
    /// Returns the value without its delimiters.
    #[must_use]
    pub fn unquoted(&self) -> &str {
        let raw = self.raw.as_str();
        raw.strip_prefix(['"', '\''])
            .map_or(raw, |rest| rest.strip_suffix(['"', '\'']).unwrap_or(rest))
    }
}

/// An attribute on an element or a pseudo-attribute on a processing
/// instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name as written, including any prefix.
    pub name: String,
    /// Offset of the first byte of the name.
    pub name_start: usize,
    /// Offset just past the name.
    pub name_end: usize,
    /// Offset of the `=` delimiter, if present.
    pub delimiter: Option<usize>,
    /// The value, if present.
    pub value: Option<AttributeValue>,
}

impl Attribute {
    /// Returns the offset just past the attribute's last byte.
    #[must_use]
    pub fn end(&self) -> usize {
        match (&self.value, self.delimiter) {
            (Some(value), _) => value.end,
            (None, Some(delimiter)) => delimiter + 1,
            (None, None) => self.name_end,
        }
    }
}

/// A parsed document: the source text plus its node arena.
///
/// # Examples
///
/// ```
/// use xmlfmt::Document;
///
/// let doc = Document::parse_str("<root><child/></root>");
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("root"));
/// ```
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// The document node id.
    root: NodeId,
    /// The source text.
    text: TextDocument,
    /// `true` when the text is a standalone DTD rather than an XML document.
    dtd: bool,
    /// Problems the parser recovered from.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates an empty document over `text`. The parser fills in the nodes.
    #[must_use]
    pub fn new(text: TextDocument, dtd: bool) -> Self {
        let mut document = NodeData::new(NodeKind::Document, 0);
        document.end = text.len();
        Self {
            nodes: vec![document],
            root: NodeId::from_index(0),
            text,
            dtd,
            diagnostics: Vec::new(),
        }
    }

    /// Parses XML text. Parsing never fails; malformed markup is kept as
    /// unclosed nodes and reported in [`Document::diagnostics`].
    #[must_use]
    pub fn parse_str(input: &str) -> Self {
        crate::parser::parse_str(input)
    }

    /// Parses the text of a standalone DTD file.
    #[must_use]
    pub fn parse_dtd_str(input: &str) -> Self {
        let options = crate::parser::ParseOptions::default().dtd(true);
        crate::parser::parse_str_with_options(input, &options)
    }

    /// Returns the source text service.
    #[must_use]
    pub fn text_document(&self) -> &TextDocument {
        &self.text
    }

    /// Returns the source text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.text()
    }

    /// Returns `true` if this document is a standalone DTD.
    #[must_use]
    pub fn is_dtd(&self) -> bool {
        self.dtd
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the first top-level element, if any.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&id| self.is_element(id))
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a node of this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    /// Returns the source text covered by a node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        &self.text()[node.start..node.end]
    }

    /// Returns `true` if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Returns `true` if the node is a text node made only of whitespace.
    #[must_use]
    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text)
            && self.node_text(id).bytes().all(|b| b.is_ascii_whitespace())
    }

    /// Returns the name of an element or the target of a PI.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the attributes of an element or PI (empty for other nodes).
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. }
            | NodeKind::ProcessingInstruction { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the unquoted value of the first attribute named `name`.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value.as_ref())
            .map(AttributeValue::unquoted)
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).links.parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).links.first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).links.last_child
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).links.next_sibling
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).links.prev_sibling
    }

    /// Iterates over the children of a node in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.first_child(id), move |&child| self.next_sibling(child))
    }

    /// Iterates from a node up to the document node, the node included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(id), move |&node| self.parent(node))
    }

    // --- Lookup by offset ---

    /// Returns the deepest node whose span contains `offset`.
    ///
    /// An unclosed node is treated as extending to its recorded end.
    /// Falls back to the document node.
    #[must_use]
    pub fn find_node_at(&self, offset: usize) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for child in self.children(current) {
                let node = self.node(child);
                if node.start <= offset && offset < node.end {
                    current = child;
                    continue 'descend;
                }
                if node.start > offset {
                    break;
                }
            }
            return current;
        }
    }

    /// Returns the deepest node that starts before `offset`: the last such
    /// child at each level, descending while it still contains `offset`.
    #[must_use]
    pub fn find_node_before(&self, offset: usize) -> NodeId {
        let mut current = self.root;
        loop {
            let Some(candidate) = self
                .children(current)
                .take_while(|&child| self.node(child).start < offset)
                .last()
            else {
                return current;
            };
            if offset <= self.node(candidate).end {
                current = candidate;
            } else {
                return candidate;
            }
        }
    }

    /// Returns `true` if the span of `outer` covers the span of `inner`.
    #[must_use]
    pub fn covers(&self, outer: NodeId, inner: NodeId) -> bool {
        let (a, b) = (self.node(outer), self.node(inner));
        outer == inner || (a.start <= b.start && a.end >= b.end)
    }

    // --- Construction ---

    /// Allocates a new detached node starting at `start`.
    pub(crate) fn create_node(&mut self, kind: NodeKind, start: usize) -> NodeId {
        self.nodes.push(NodeData::new(kind, start));
        NodeId::from_index(self.nodes.len() - 1)
    }

    /// Links a detached `child` after the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "node is already attached");
        let previous = self.last_child(parent);
        match previous {
            Some(last) => self.node_mut(last).links.next_sibling = Some(child),
            None => self.node_mut(parent).links.first_child = Some(child),
        }
        self.node_mut(parent).links.last_child = Some(child);
        let links = &mut self.node_mut(child).links;
        links.parent = Some(parent);
        links.prev_sibling = previous;
    }

    /// Returns the number of nodes, the document node included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
