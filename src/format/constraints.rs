//! The constraints threaded through the tree walk.

use super::category::WhitespaceCategory;

/// Indentation, remaining line width, and whitespace category of the scope
/// a node is formatted in.
///
/// A container forks a fresh copy for its children; siblings share one
/// value whose `available_line_width` advances as each sibling is
/// formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingConstraints {
    /// Indentation level of nodes in this scope.
    pub indent_level: usize,
    /// Columns left on the current line. Negative when over budget.
    pub available_line_width: i32,
    /// Whitespace category of the enclosing element.
    pub category: WhitespaceCategory,
}

impl FormattingConstraints {
    /// Creates a new constraints value.
    #[must_use]
    pub fn new(indent_level: usize, available_line_width: i32, category: WhitespaceCategory) -> Self {
        Self {
            indent_level,
            available_line_width,
            category,
        }
    }
}
