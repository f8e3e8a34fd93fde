//! Layout of `xsi:schemaLocation` values.
//!
//! The value of `xsi:schemaLocation` is a list of namespace/location
//! pairs. [`SchemaLocationParticipant`] puts every token, or every pair,
//! on its own line, aligned under the first one:
//!
//! ```text
//! <beans xsi:schemaLocation="http://example.com/beans
//!                            http://example.com/beans.xsd">
//! ```
//!
//! The layout is chosen by [`FormattingOptions::xsi_schema_location_split`];
//! with [`SchemaLocationSplit::None`] the value is left as written.
//!
//! [`FormattingOptions::xsi_schema_location_split`]: super::FormattingOptions::xsi_schema_location_split
//! [`SchemaLocationSplit::None`]: super::SchemaLocationSplit::None

use crate::tree::{Attribute, Document, NodeId};

use super::category::{AttributeValueContext, FormatterParticipant};
use super::edit::TextEdit;
use super::options::FormattingOptions;
use super::scan::runs;

/// The XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Lays out `xsi:schemaLocation` values. Registered on every
/// [`XmlFormatter`](super::XmlFormatter) ahead of user participants.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaLocationParticipant;

impl FormatterParticipant for SchemaLocationParticipant {
    fn format_attribute_value(
        &self,
        doc: &Document,
        element: NodeId,
        attribute: &Attribute,
        context: &AttributeValueContext<'_>,
    ) -> Option<Vec<TextEdit>> {
        let per_line = context.options.xsi_schema_location_split.tokens_per_line()?;
        if !is_schema_location(doc, element, &attribute.name) {
            return None;
        }
        let value = attribute.value.as_ref()?;
        let content = value.raw.get(1..value.raw.len().checked_sub(1)?)?;
        let content_start = value.start + 1;
        let content_end = content_start + content.len();

        let indent = indentation_to(context.column, context.options);
        let mut edits = Vec::new();
        let mut previous_end = content_start;
        let locations = runs(doc.text(), content_start, content_end)
            .into_iter()
            .filter(|run| !run.whitespace);
        for (i, location) in locations.enumerate() {
            let separator = if i == 0 {
                String::new()
            } else if i % per_line == 0 {
                format!("{}{indent}", context.line_delimiter)
            } else {
                " ".to_string()
            };
            if doc.text()[previous_end..location.start] != separator {
                edits.push(TextEdit::new(previous_end, location.start, separator));
            }
            previous_end = location.end;
        }
        // nothing but whitespace between the quotes
        if previous_end == content_start {
            return None;
        }
        Some(edits)
    }
}

/// Returns `true` if `name` on `element` is `schemaLocation` in the XSI
/// namespace. An undeclared `xsi` prefix is taken at its word.
fn is_schema_location(doc: &Document, element: NodeId, name: &str) -> bool {
    let Some((prefix, "schemaLocation")) = name.split_once(':') else {
        return false;
    };
    let declaration = format!("xmlns:{prefix}");
    doc.ancestors(element)
        .find_map(|id| doc.attribute(id, &declaration))
        .map_or(prefix == "xsi", |namespace| namespace == XSI_NAMESPACE)
}

/// Whitespace reaching `column`: spaces, or tabs padded with spaces when
/// indenting with tabs.
fn indentation_to(column: usize, options: &FormattingOptions) -> String {
    if options.insert_spaces || options.tab_size == 0 {
        return " ".repeat(column);
    }
    let mut indent = "\t".repeat(column / options.tab_size);
    indent.push_str(&" ".repeat(column % options.tab_size));
    indent
}
