//! Conversion from tree-sitter trees into treelint trees.
//!
//! Named nodes become tree nodes, hung under their parent's `children` slot.
//! A node reached through a tree-sitter field keeps that field name. Named
//! leaves carry their source text in a `text` attribute. Comment nodes are
//! collected as [`Comment`]s instead of becoming part of the tree.

use tracing::trace;
use treelint_core::{
    Comment, CommentKind, LineIndex, ParseError, ParsedSource, Position, SourceLocation,
    TextRange, TreeBuilder, TreeError,
};

/// Slot holding the named children of every converted node.
pub const CHILDREN: &str = "children";

/// Attribute holding the source text of a named leaf.
pub const TEXT: &str = "text";

fn is_comment(node: tree_sitter::Node<'_>) -> bool {
    node.kind().contains("comment")
}

fn to_comment(node: tree_sitter::Node<'_>, text: &str, lines: &LineIndex) -> Comment {
    let range = TextRange::new(node.start_byte(), node.end_byte());
    let raw = text.get(range.start..range.end).unwrap_or_default();
    let (kind, value) = if let Some(body) = raw.strip_prefix("/*") {
        (CommentKind::Block, body.strip_suffix("*/").unwrap_or(body))
    } else {
        let body = raw
            .strip_prefix("//")
            .or_else(|| raw.strip_prefix('#'))
            .unwrap_or(raw);
        (CommentKind::Line, body.trim_end_matches(['\n', '\r']))
    };
    Comment {
        kind,
        value: value.to_string(),
        range,
        loc: SourceLocation::new(lines.position(range.start), lines.position(range.end)),
    }
}

/// First `ERROR` or `MISSING` node in document order.
fn first_error(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn syntax_error(node: tree_sitter::Node<'_>, text: &str, lines: &LineIndex) -> ParseError {
    let position = lines.position(node.start_byte());
    if node.is_missing() {
        return ParseError::new(format!("Missing {}", node.kind()), position);
    }
    let mut leaf = node;
    while let Some(child) = leaf.child(0) {
        leaf = child;
    }
    let token = text
        .get(leaf.start_byte()..leaf.end_byte())
        .unwrap_or_default()
        .trim();
    if token.is_empty() {
        ParseError::new("Unexpected token", position)
    } else {
        ParseError::new(format!("Unexpected token '{token}'"), position)
    }
}

/// Converts a tree-sitter parse of `text`.
///
/// # Errors
///
/// Returns a [`ParseError`] located at the first `ERROR` or `MISSING` node.
pub fn convert(tree: &tree_sitter::Tree, text: &str) -> Result<ParsedSource, ParseError> {
    let lines = LineIndex::new(text);
    let root_ts = tree.root_node();
    if let Some(node) = first_error(root_ts) {
        return Err(syntax_error(node, text, &lines));
    }

    let tree_error = |e: TreeError| ParseError::new(e.to_string(), Position::new(1, 0));
    let mut b = TreeBuilder::new(text);
    let mut comments = Vec::new();
    let root = b
        .node(root_ts.kind(), root_ts.start_byte(), root_ts.end_byte())
        .map_err(tree_error)?;
    let mut parents = vec![root];

    let mut cursor = root_ts.walk();
    if cursor.goto_first_child() {
        'walk: loop {
            let node = cursor.node();
            if is_comment(node) {
                comments.push(to_comment(node, text, &lines));
            } else if node.is_named() {
                let (start, end) = (node.start_byte(), node.end_byte());
                let id = b.node(node.kind(), start, end).map_err(tree_error)?;
                if let Some(field) = cursor.field_name() {
                    b.set_field(id, field);
                }
                let parent = parents.last().copied().unwrap_or(root);
                b.push(parent, CHILDREN, id).map_err(tree_error)?;

                if node.named_child_count() == 0 {
                    b.set_attr(id, TEXT, text.get(start..end).unwrap_or_default());
                } else if cursor.goto_first_child() {
                    parents.push(id);
                    continue;
                }
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                parents.pop();
                if parents.is_empty() {
                    break 'walk;
                }
            }
        }
    }

    trace!(comments = comments.len(), "converted tree-sitter tree");
    Ok(ParsedSource {
        tree: b.finish(root).map_err(tree_error)?,
        comments,
    })
}
