//! Formatting settings.
//!
//! [`FormattingOptions`] deserializes from the camelCase JSON shape editors
//! send (`{"tabSize": 4, "emptyElements": "collapse"}`); every key is
//! optional and falls back to its default.

use serde::{Deserialize, Serialize};

/// What to do with elements that have no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum EmptyElements {
    /// Leave `<a></a>` and `<a/>` as written.
    #[default]
    Ignore,
    /// Rewrite `<a/>` as `<a></a>`.
    Expand,
    /// Rewrite `<a></a>` as `<a/>`.
    Collapse,
}

/// Whether attribute value delimiters are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforceQuoteStyle {
    /// Keep the delimiters as written.
    #[default]
    Ignore,
    /// Rewrite delimiters to [`FormattingOptions::quote_style`].
    Preferred,
}

/// The preferred attribute value delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum QuoteStyle {
    /// `"`
    #[default]
    #[cfg_attr(feature = "cli", value(name = "double"))]
    DoubleQuotes,
    /// `'`
    #[cfg_attr(feature = "cli", value(name = "single"))]
    SingleQuotes,
}

impl QuoteStyle {
    /// Returns the delimiter byte.
    #[must_use]
    pub fn quote(self) -> u8 {
        match self {
            Self::DoubleQuotes => b'"',
            Self::SingleQuotes => b'\'',
        }
    }

    /// Returns the delimiter that is not preferred.
    #[must_use]
    pub fn other(self) -> u8 {
        match self {
            Self::DoubleQuotes => b'\'',
            Self::SingleQuotes => b'"',
        }
    }
}

/// How the locations of an `xsi:schemaLocation` value are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SchemaLocationSplit {
    /// Leave the value as written.
    #[default]
    None,
    /// Put every namespace and every location on its own line.
    OnElement,
    /// Put every namespace/location pair on its own line.
    OnPair,
}

impl SchemaLocationSplit {
    /// Number of whitespace-separated tokens per line, or `None` when the
    /// value is left alone.
    #[must_use]
    pub fn tokens_per_line(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::OnElement => Some(1),
            Self::OnPair => Some(2),
        }
    }
}

fn default_preserve_space() -> Vec<String> {
    [
        "xsl:text",
        "xsl:comment",
        "xsl:processing-instruction",
        "literallayout",
        "programlisting",
        "screen",
        "synopsis",
        "pre",
        "xd:pre",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// User preferences consumed by the formatter.
///
/// Use the builder methods to configure options:
///
/// ```
/// use xmlfmt::format::{EmptyElements, FormattingOptions};
///
/// let opts = FormattingOptions::default()
///     .tab_size(4)
///     .empty_elements(EmptyElements::Collapse)
///     .max_line_width(100);
/// assert_eq!(opts.tab_size, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingOptions {
    /// Width of one indentation step, and of a tab character when measuring
    /// line width.
    pub tab_size: usize,
    /// Indent with spaces rather than tab characters.
    pub insert_spaces: bool,
    /// Maximum line width before text is wrapped. 0 disables wrapping.
    pub max_line_width: usize,
    /// Maximum number of blank lines kept between tags.
    pub preserved_newlines: usize,
    /// Put every attribute of a multi-attribute tag on its own line.
    pub split_attributes: bool,
    /// Extra indentation (in levels) of split attributes.
    pub split_attributes_indent_size: usize,
    /// Keep line breaks that already separate attributes.
    pub preserve_attribute_line_breaks: bool,
    /// Put the closing bracket of a split tag on its own line.
    pub closing_bracket_new_line: bool,
    /// Join the lines of text content.
    pub join_content_lines: bool,
    /// Join the lines of comments.
    pub join_comment_lines: bool,
    /// Join the lines of CDATA sections.
    #[serde(rename = "joinCDATALines")]
    pub join_cdata_lines: bool,
    /// Never touch text content, and never collapse or expand an element
    /// that has children.
    pub preserve_empty_content: bool,
    /// Empty element canonicalization.
    pub empty_elements: EmptyElements,
    /// Write `<a />` rather than `<a/>`.
    pub space_before_empty_close_tag: bool,
    /// Whether [`quote_style`](Self::quote_style) is enforced.
    pub enforce_quote_style: EnforceQuoteStyle,
    /// The preferred attribute value delimiter.
    pub quote_style: QuoteStyle,
    /// Remove spaces and tabs at the end of lines that would otherwise be
    /// left as written.
    pub trim_trailing_whitespace: bool,
    /// Remove line breaks at the end of the document.
    pub trim_final_newlines: bool,
    /// End the document with exactly one line break.
    pub insert_final_newline: bool,
    /// Elements whose content is never reformatted. A trailing `*` matches
    /// every name with that prefix.
    pub preserve_space: Vec<String>,
    /// Reformat comments. When unset, comments and the whitespace before
    /// them are left as written.
    pub format_comments: bool,
    /// Layout of `xsi:schemaLocation` values.
    pub xsi_schema_location_split: SchemaLocationSplit,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            tab_size: 2,
            insert_spaces: true,
            max_line_width: 80,
            preserved_newlines: 2,
            split_attributes: false,
            split_attributes_indent_size: 2,
            preserve_attribute_line_breaks: true,
            closing_bracket_new_line: false,
            join_content_lines: false,
            join_comment_lines: false,
            join_cdata_lines: false,
            preserve_empty_content: false,
            empty_elements: EmptyElements::Ignore,
            space_before_empty_close_tag: false,
            enforce_quote_style: EnforceQuoteStyle::Ignore,
            quote_style: QuoteStyle::DoubleQuotes,
            trim_trailing_whitespace: false,
            trim_final_newlines: true,
            insert_final_newline: false,
            preserve_space: default_preserve_space(),
            format_comments: true,
            xsi_schema_location_split: SchemaLocationSplit::None,
        }
    }
}

impl FormattingOptions {
    /// Sets the indentation width.
    #[must_use]
    pub fn tab_size(mut self, size: usize) -> Self {
        self.tab_size = size;
        self
    }

    /// Indents with spaces (`true`) or tabs (`false`).
    #[must_use]
    pub fn insert_spaces(mut self, yes: bool) -> Self {
        self.insert_spaces = yes;
        self
    }

    /// Sets the maximum line width; 0 disables wrapping.
    #[must_use]
    pub fn max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width;
        self
    }

    /// Sets the number of blank lines kept between tags.
    #[must_use]
    pub fn preserved_newlines(mut self, count: usize) -> Self {
        self.preserved_newlines = count;
        self
    }

    /// Enables or disables splitting attributes onto separate lines.
    #[must_use]
    pub fn split_attributes(mut self, yes: bool) -> Self {
        self.split_attributes = yes;
        self
    }

    /// Sets the indentation of split attributes, in levels.
    #[must_use]
    pub fn split_attributes_indent_size(mut self, size: usize) -> Self {
        self.split_attributes_indent_size = size;
        self
    }

    /// Enables or disables keeping existing line breaks between attributes.
    #[must_use]
    pub fn preserve_attribute_line_breaks(mut self, yes: bool) -> Self {
        self.preserve_attribute_line_breaks = yes;
        self
    }

    /// Enables or disables putting the closing bracket of split tags on its
    /// own line.
    #[must_use]
    pub fn closing_bracket_new_line(mut self, yes: bool) -> Self {
        self.closing_bracket_new_line = yes;
        self
    }

    /// Enables or disables joining text content lines.
    #[must_use]
    pub fn join_content_lines(mut self, yes: bool) -> Self {
        self.join_content_lines = yes;
        self
    }

    /// Enables or disables joining comment lines.
    #[must_use]
    pub fn join_comment_lines(mut self, yes: bool) -> Self {
        self.join_comment_lines = yes;
        self
    }

    /// Enables or disables joining CDATA lines.
    #[must_use]
    pub fn join_cdata_lines(mut self, yes: bool) -> Self {
        self.join_cdata_lines = yes;
        self
    }

    /// Enables or disables preserving empty content.
    #[must_use]
    pub fn preserve_empty_content(mut self, yes: bool) -> Self {
        self.preserve_empty_content = yes;
        self
    }

    /// Sets the empty element policy.
    #[must_use]
    pub fn empty_elements(mut self, policy: EmptyElements) -> Self {
        self.empty_elements = policy;
        self
    }

    /// Enables or disables the space in `<a />`.
    #[must_use]
    pub fn space_before_empty_close_tag(mut self, yes: bool) -> Self {
        self.space_before_empty_close_tag = yes;
        self
    }

    /// Sets whether the quote style is enforced.
    #[must_use]
    pub fn enforce_quote_style(mut self, enforce: EnforceQuoteStyle) -> Self {
        self.enforce_quote_style = enforce;
        self
    }

    /// Sets the preferred quote style.
    #[must_use]
    pub fn quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }

    /// Enables or disables removing whitespace at the end of lines.
    #[must_use]
    pub fn trim_trailing_whitespace(mut self, yes: bool) -> Self {
        self.trim_trailing_whitespace = yes;
        self
    }

    /// Enables or disables trimming line breaks at the end of the document.
    #[must_use]
    pub fn trim_final_newlines(mut self, yes: bool) -> Self {
        self.trim_final_newlines = yes;
        self
    }

    /// Enables or disables ending the document with a line break.
    #[must_use]
    pub fn insert_final_newline(mut self, yes: bool) -> Self {
        self.insert_final_newline = yes;
        self
    }

    /// Replaces the list of elements whose content is preserved.
    #[must_use]
    pub fn preserve_space(mut self, names: Vec<String>) -> Self {
        self.preserve_space = names;
        self
    }

    /// Enables or disables comment formatting.
    #[must_use]
    pub fn format_comments(mut self, yes: bool) -> Self {
        self.format_comments = yes;
        self
    }

    /// Sets the layout of `xsi:schemaLocation` values.
    #[must_use]
    pub fn xsi_schema_location_split(mut self, split: SchemaLocationSplit) -> Self {
        self.xsi_schema_location_split = split;
        self
    }

    /// Returns `true` if `name` matches an entry of
    /// [`preserve_space`](Self::preserve_space).
    #[must_use]
    pub fn is_preserve_space(&self, name: &str) -> bool {
        self.preserve_space.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => pattern == name,
        })
    }

    /// Returns the indentation string for `level`.
    #[must_use]
    pub fn indentation(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(level * self.tab_size)
        } else {
            "\t".repeat(level)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let opts = FormattingOptions::default();
        assert_eq!(opts.tab_size, 2);
        assert!(opts.insert_spaces);
        assert_eq!(opts.max_line_width, 80);
        assert_eq!(opts.empty_elements, EmptyElements::Ignore);
        assert!(!opts.space_before_empty_close_tag);
        assert!(opts.trim_final_newlines);
        assert!(!opts.insert_final_newline);
        assert!(!opts.trim_trailing_whitespace);
        assert!(opts.format_comments);
        assert_eq!(opts.xsi_schema_location_split, SchemaLocationSplit::None);
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let json = r#"{
            "tabSize": 4,
            "insertSpaces": false,
            "joinCDATALines": true,
            "emptyElements": "collapse",
            "enforceQuoteStyle": "preferred",
            "quoteStyle": "singleQuotes",
            "trimTrailingWhitespace": true,
            "formatComments": false,
            "xsiSchemaLocationSplit": "onPair"
        }"#;
        let opts: FormattingOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.tab_size, 4);
        assert!(!opts.insert_spaces);
        assert!(opts.join_cdata_lines);
        assert_eq!(opts.empty_elements, EmptyElements::Collapse);
        assert_eq!(opts.enforce_quote_style, EnforceQuoteStyle::Preferred);
        assert_eq!(opts.quote_style, QuoteStyle::SingleQuotes);
        assert!(opts.trim_trailing_whitespace);
        assert!(!opts.format_comments);
        assert_eq!(opts.xsi_schema_location_split, SchemaLocationSplit::OnPair);
        // untouched keys keep their defaults
        assert_eq!(opts.max_line_width, 80);
        assert_eq!(opts.preserved_newlines, 2);
    }

    #[test]
    fn test_serialize_roundtrip_keys() {
        let json = serde_json::to_value(FormattingOptions::default()).unwrap();
        assert_eq!(json["joinCDATALines"], false);
        assert_eq!(json["quoteStyle"], "doubleQuotes");
        assert_eq!(json["emptyElements"], "ignore");
    }

    #[test]
    fn test_preserve_space_patterns() {
        let opts = FormattingOptions::default().preserve_space(vec!["pre".into(), "xsl:*".into()]);
        assert!(opts.is_preserve_space("pre"));
        assert!(!opts.is_preserve_space("preface"));
        assert!(opts.is_preserve_space("xsl:text"));
        assert!(!opts.is_preserve_space("xs:text"));
    }

    #[test]
    fn test_indentation() {
        let opts = FormattingOptions::default().tab_size(4);
        assert_eq!(opts.indentation(2), "        ");
        assert_eq!(opts.insert_spaces(false).indentation(2), "\t\t");
    }

    #[test]
    fn test_quote_style_bytes() {
        assert_eq!(QuoteStyle::DoubleQuotes.quote(), b'"');
        assert_eq!(QuoteStyle::DoubleQuotes.other(), b'\'');
        assert_eq!(QuoteStyle::SingleQuotes.quote(), b'\'');
    }
}
