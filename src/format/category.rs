//! Whitespace significance.
//!
//! Every element is classified into a [`WhitespaceCategory`] that decides
//! how freely the whitespace around and inside it may be rewritten. The
//! first applicable rule wins:
//!
//! 1. an unclosed element inherits the enclosing category;
//! 2. names listed in `preserveSpace` are preserved;
//! 3. the registered [`FormatterParticipant`]s are asked in order;
//! 4. `xml:space="preserve"` preserves;
//! 5. preservation is inherited unless `xml:space="default"` resets it;
//! 6. otherwise the content decides: elements only (ignoring whitespace
//!    text) is [`IgnoreSpace`], elements and text is [`MixedContent`], and
//!    anything else is [`NormalizeSpace`].
//!
//! [`IgnoreSpace`]: WhitespaceCategory::IgnoreSpace
//! [`MixedContent`]: WhitespaceCategory::MixedContent
//! [`NormalizeSpace`]: WhitespaceCategory::NormalizeSpace

use tracing::trace;

use crate::tree::{Attribute, Document, NodeId, NodeKind};

use super::constraints::FormattingConstraints;
use super::edit::TextEdit;
use super::options::FormattingOptions;

/// How significant the whitespace of an element's content is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhitespaceCategory {
    /// Element-only content: whitespace between children is layout.
    IgnoreSpace,
    /// Text-only content: runs of whitespace mean a single space.
    NormalizeSpace,
    /// Text interleaved with elements: runs mean a single space.
    MixedContent,
    /// Every whitespace character is significant.
    PreserveSpace,
}

/// An external source of formatting hints, such as a schema that knows
/// which elements hold significant whitespace.
///
/// Participants are consulted in registration order.
///
/// # Examples
///
/// ```
/// use xmlfmt::format::{
///     FormatterParticipant, FormattingConstraints, WhitespaceCategory, XmlFormatter,
/// };
/// use xmlfmt::{Document, NodeId};
///
/// struct Verbatim;
///
/// impl FormatterParticipant for Verbatim {
///     fn suggest_category(
///         &self,
///         doc: &Document,
///         element: NodeId,
///         _parent: &FormattingConstraints,
///     ) -> Option<WhitespaceCategory> {
///         (doc.node_name(element) == Some("code")).then_some(WhitespaceCategory::PreserveSpace)
///     }
/// }
///
/// let formatter = XmlFormatter::default().with_participant(Box::new(Verbatim));
/// ```
pub trait FormatterParticipant: Send + Sync {
    /// Returns the category of `element`, or `None` to defer to the next
    /// participant and the built-in rules.
    fn suggest_category(
        &self,
        doc: &Document,
        element: NodeId,
        parent: &FormattingConstraints,
    ) -> Option<WhitespaceCategory> {
        let _ = (doc, element, parent);
        None
    }

    /// Returns `false` to keep an empty `element` from being collapsed to
    /// `<name/>`.
    fn should_collapse_empty_element(&self, doc: &Document, element: NodeId) -> bool {
        let _ = (doc, element);
        true
    }

    /// Returns the edits that lay out the quoted value of `attribute` on
    /// `element`, or `None` to defer to the next participant. The first
    /// participant returning edits wins.
    ///
    /// The edits must lie between the value's quotes and be sorted by
    /// offset; otherwise they are ignored.
    fn format_attribute_value(
        &self,
        doc: &Document,
        element: NodeId,
        attribute: &Attribute,
        context: &AttributeValueContext<'_>,
    ) -> Option<Vec<TextEdit>> {
        let _ = (doc, element, attribute, context);
        None
    }
}

/// What a participant knows about the attribute value it is asked to lay
/// out.
#[derive(Debug, Clone, Copy)]
pub struct AttributeValueContext<'a> {
    /// The settings of the run.
    pub options: &'a FormattingOptions,
    /// The line break the document uses.
    pub line_delimiter: &'a str,
    /// Column just after the opening quote, in the formatted text.
    pub column: usize,
}

/// Classifies `element` formatted inside a scope with `parent` constraints.
pub(crate) fn classify(
    doc: &Document,
    options: &FormattingOptions,
    participants: &[Box<dyn FormatterParticipant>],
    element: NodeId,
    parent: &FormattingConstraints,
) -> WhitespaceCategory {
    let category = resolve(doc, options, participants, element, parent);
    trace!(
        element = doc.node_name(element).unwrap_or_default(),
        offset = doc.node(element).start,
        ?category,
        "classified element"
    );
    category
}

fn resolve(
    doc: &Document,
    options: &FormattingOptions,
    participants: &[Box<dyn FormatterParticipant>],
    element: NodeId,
    parent: &FormattingConstraints,
) -> WhitespaceCategory {
    if !doc.node(element).closed {
        return parent.category;
    }
    if doc
        .node_name(element)
        .is_some_and(|name| options.is_preserve_space(name))
    {
        return WhitespaceCategory::PreserveSpace;
    }
    if let Some(category) = participants
        .iter()
        .find_map(|p| p.suggest_category(doc, element, parent))
    {
        return category;
    }
    match doc.attribute(element, "xml:space") {
        Some("preserve") => return WhitespaceCategory::PreserveSpace,
        Some("default") => {}
        _ if parent.category == WhitespaceCategory::PreserveSpace => {
            return WhitespaceCategory::PreserveSpace;
        }
        _ => {}
    }

    let mut has_element = false;
    let mut has_text = false;
    for child in doc.children(element) {
        match doc.node(child).kind {
            NodeKind::Element { .. } => has_element = true,
            NodeKind::Text if !doc.is_whitespace_text(child) => has_text = true,
            NodeKind::CData => has_text = true,
            _ => continue,
        }
        if has_element && has_text {
            return WhitespaceCategory::MixedContent;
        }
    }
    if has_element {
        WhitespaceCategory::IgnoreSpace
    } else {
        WhitespaceCategory::NormalizeSpace
    }
}
