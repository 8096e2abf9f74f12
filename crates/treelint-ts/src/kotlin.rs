//! Kotlin source parser using Tree-sitter.

use tracing::debug;
use tree_sitter::{Language, Parser};
use treelint_core::{ParseError, ParsedSource, Position, SourceParser};

use crate::convert::convert;

/// Parses Kotlin into treelint trees.
pub struct KotlinParser {
    language: Language,
}

impl KotlinParser {
    /// Creates a new Kotlin parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }
}

impl Default for KotlinParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KotlinParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KotlinParser").finish_non_exhaustive()
    }
}

impl SourceParser for KotlinParser {
    fn language(&self) -> &str {
        "kotlin"
    }

    fn parse(&self, text: &str) -> Result<ParsedSource, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language).map_err(|e| {
            ParseError::new(format!("failed to load kotlin grammar: {e}"), Position::new(1, 0))
        })?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| ParseError::new("tree-sitter produced no tree", Position::new(1, 0)))?;
        debug!(nodes = tree.root_node().descendant_count(), "parsed kotlin source");
        convert(&tree, text)
    }
}
