//! The seam between the engine and concrete grammars.

use thiserror::Error;

use crate::source::ParsedSource;
use crate::tree::{Node, Position};

/// A text the parser could not understand.
///
/// Surfaces as a single fatal problem, never as a [`crate::LintError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({}:{})", position.line, position.column + 1)]
pub struct ParseError {
    /// Parser message.
    pub message: String,
    /// Where parsing failed.
    pub position: Position,
}

impl ParseError {
    /// Creates a parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Produces trees and comments for a language.
pub trait SourceParser: Send + Sync {
    /// Language name used in logs.
    fn language(&self) -> &str;

    /// Parses `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the text is not valid in this language.
    fn parse(&self, text: &str) -> Result<ParsedSource, ParseError>;

    /// Whether `node` belongs to the selector class `:class`.
    ///
    /// The default compares the class against the end of the node kind,
    /// ignoring case and underscores, so `:statement` matches both
    /// `expression_statement` and `ExpressionStatement`.
    fn matches_class(&self, class: &str, node: Node<'_>) -> bool {
        default_class_match(class, node.kind())
    }
}

/// Kind-suffix class matching used by [`SourceParser::matches_class`].
#[must_use]
pub fn default_class_match(class: &str, kind: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    let class = normalize(class);
    !class.is_empty() && normalize(kind).ends_with(&class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_matches_kind_suffix() {
        assert!(default_class_match("statement", "expression_statement"));
        assert!(default_class_match("statement", "ExpressionStatement"));
        assert!(default_class_match("declaration", "function_declaration"));
        assert!(!default_class_match("statement", "statement_list"));
        assert!(!default_class_match("", "anything"));
    }

    #[test]
    fn parse_error_displays_one_based_column() {
        let err = ParseError::new("Unexpected token", Position::new(3, 4));
        assert_eq!(err.to_string(), "Unexpected token (3:5)");
    }
}
