//! Source text, line index and comments handed to rules.

use serde::{Deserialize, Serialize};

use crate::tree::{Node, Position, SourceLocation, TextRange, Tree};

/// Byte offsets of line starts.
///
/// `\r\n`, `\n` and a lone `\r` all terminate a line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Indexes `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => starts.push(i + 1),
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    starts.push(i + 2);
                    i += 1;
                }
                b'\r' => starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self {
            starts,
            len: text.len(),
        }
    }

    /// Number of lines, counting a trailing empty line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte offset where `line` (1-indexed) begins.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1).and_then(|i| self.starts.get(i)).copied()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.starts.partition_point(|start| *start <= offset);
        Position::new(line, offset - self.starts[line - 1])
    }

    /// Byte offset of a position, if it lies inside the text.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<usize> {
        let start = self.line_start(position.line)?;
        let offset = start + position.column;
        (offset <= self.len).then_some(offset)
    }
}

/// Comment flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    /// Runs to the end of the line.
    Line,
    /// Delimited on both sides.
    Block,
}

/// A comment found by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Line or block.
    pub kind: CommentKind,
    /// Text between the delimiters.
    pub value: String,
    /// Byte range of the whole comment, delimiters included.
    pub range: TextRange,
    /// Location of the whole comment.
    pub loc: SourceLocation,
}

/// Everything a parser produces for one text.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    /// The syntax tree.
    pub tree: Tree,
    /// Comments in document order.
    pub comments: Vec<Comment>,
}

/// Parsed source text as seen by rules.
#[derive(Debug, Clone)]
pub struct SourceCode {
    text: String,
    lines: LineIndex,
    tree: Tree,
    comments: Vec<Comment>,
}

impl SourceCode {
    /// Wraps a parsed text.
    #[must_use]
    pub fn new(text: impl Into<String>, parsed: ParsedSource) -> Self {
        let text = text.into();
        Self {
            lines: LineIndex::new(&text),
            text,
            tree: parsed.tree,
            comments: parsed.comments,
        }
    }

    /// Full text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Syntax tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Comments in document order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Line index.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Text of a line (1-indexed) without its terminator.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = self.lines.line_start(line)?;
        let end = self.lines.line_start(line + 1).unwrap_or(self.text.len());
        let raw = self.text.get(start..end)?;
        Some(raw.trim_end_matches(['\n', '\r']))
    }

    /// Text covered by a node.
    #[must_use]
    pub fn node_text(&self, node: Node<'_>) -> &str {
        self.slice(node.range())
    }

    /// Text covered by a range, empty if the range is invalid.
    #[must_use]
    pub fn slice(&self, range: TextRange) -> &str {
        self.text.get(range.start..range.end).unwrap_or_default()
    }

    /// Position of a byte offset.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(offset)
    }

    /// Byte offset of a position.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<usize> {
        self.lines.offset(position)
    }
}
