//! Arena tree model shared by every tree provider.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Children hang
//! in named slots; the [`VisitorKeys`] table fixes the order in which slots
//! are walked. [`TreeBuilder`] is the only way to assemble a [`Tree`] and it
//! refuses to attach a node twice, so every reachable node is visited once.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TreeError;
use crate::source::LineIndex;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Byte column (0-indexed).
    pub column: usize,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Start and end of a node or comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// First position covered.
    pub start: Position,
    /// Position just past the end.
    pub end: Position,
}

impl SourceLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl TextRange {
    /// Creates a range.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the range covers nothing.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

/// Children stored under one slot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSlot {
    /// A slot holding exactly one node.
    One(NodeId),
    /// A slot holding an ordered list.
    Many(Vec<NodeId>),
}

impl ChildSlot {
    /// Nodes in this slot, in order.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// Ordered child-slot names per node kind.
///
/// Kinds missing from the table are walked in slot insertion order.
#[derive(Debug, Clone, Default)]
pub struct VisitorKeys {
    keys: HashMap<String, Vec<String>>,
}

impl VisitorKeys {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the slot order for a kind.
    #[must_use]
    pub fn with<I, S>(mut self, kind: impl Into<String>, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(kind, slots);
        self
    }

    /// Sets the slot order for a kind.
    pub fn insert<I, S>(&mut self, kind: impl Into<String>, slots: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys
            .insert(kind.into(), slots.into_iter().map(Into::into).collect());
    }

    /// Slot order for a kind, if declared.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&[String]> {
        self.keys.get(kind).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    range: TextRange,
    loc: SourceLocation,
    parent: Option<NodeId>,
    slot: Option<String>,
    field: Option<String>,
    slots: Vec<(String, ChildSlot)>,
    attributes: BTreeMap<String, Value>,
}

impl NodeData {
    fn slot(&self, name: &str) -> Option<&ChildSlot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// An immutable syntax tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    visitor_keys: VisitorKeys,
}

impl Tree {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// Handle for a node id produced by this tree's builder.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced for this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.0 < self.nodes.len(), "node {id} does not belong to this tree");
        Node { tree: self, id }
    }

    /// Number of nodes in the arena, reachable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the arena is empty. Never the case for a built tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The visitor key table.
    #[must_use]
    pub fn visitor_keys(&self) -> &VisitorKeys {
        &self.visitor_keys
    }

    /// Children of `id` in traversal order.
    #[must_use]
    pub fn traversal_children(&self, id: NodeId) -> Vec<NodeId> {
        let data = &self.nodes[id.0];
        match self.visitor_keys.get(&data.kind) {
            Some(keys) => keys
                .iter()
                .filter_map(|key| data.slot(key))
                .flat_map(|slot| slot.ids().iter().copied())
                .collect(),
            None => data
                .slots
                .iter()
                .flat_map(|(_, slot)| slot.ids().iter().copied())
                .collect(),
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Borrowed handle to a node.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Node<'t> {
    /// The node's id.
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    #[must_use]
    pub fn tree(self) -> &'t Tree {
        self.tree
    }

    /// Kind tag, e.g. `call_expression`.
    #[must_use]
    pub fn kind(self) -> &'t str {
        &self.tree.data(self.id).kind
    }

    /// Byte range.
    #[must_use]
    pub fn range(self) -> TextRange {
        self.tree.data(self.id).range
    }

    /// Line/column location.
    #[must_use]
    pub fn loc(self) -> SourceLocation {
        self.tree.data(self.id).loc
    }

    /// Parent node, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<Node<'t>> {
        self.tree.data(self.id).parent.map(|id| self.tree.node(id))
    }

    /// Field name this node is known by in its parent.
    ///
    /// Defaults to the slot name; providers may override it.
    #[must_use]
    pub fn field(self) -> Option<&'t str> {
        let data = self.tree.data(self.id);
        data.field.as_deref().or(data.slot.as_deref())
    }

    /// Attribute value.
    #[must_use]
    pub fn attr(self, name: &str) -> Option<&'t Value> {
        self.tree.data(self.id).attributes.get(name)
    }

    /// All attributes.
    #[must_use]
    pub fn attributes(self) -> &'t BTreeMap<String, Value> {
        &self.tree.data(self.id).attributes
    }

    /// The node stored in a single-node slot.
    #[must_use]
    pub fn child(self, slot: &str) -> Option<Node<'t>> {
        match self.tree.data(self.id).slot(slot)? {
            ChildSlot::One(id) => Some(self.tree.node(*id)),
            ChildSlot::Many(_) => None,
        }
    }

    /// Nodes stored in a slot of either arity.
    #[must_use]
    pub fn children(self, slot: &str) -> Vec<Node<'t>> {
        self.tree
            .data(self.id)
            .slot(slot)
            .map(|s| s.ids().iter().map(|id| self.tree.node(*id)).collect())
            .unwrap_or_default()
    }

    /// First child whose field name matches, searching single slots first.
    #[must_use]
    pub fn child_by_field(self, name: &str) -> Option<Node<'t>> {
        self.child(name).or_else(|| {
            self.all_children()
                .into_iter()
                .find(|c| c.field() == Some(name))
        })
    }

    /// Every child in traversal order.
    #[must_use]
    pub fn all_children(self) -> Vec<Node<'t>> {
        self.tree
            .traversal_children(self.id)
            .into_iter()
            .map(|id| self.tree.node(id))
            .collect()
    }

    /// The list this node sits in and its index there.
    ///
    /// Returns `None` for the root and for nodes in single-node slots.
    #[must_use]
    pub fn sibling_list(self) -> Option<(&'t [NodeId], usize)> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        match parent.slot(data.slot.as_deref()?)? {
            ChildSlot::Many(ids) => ids
                .iter()
                .position(|id| *id == self.id)
                .map(|index| (ids.as_slice(), index)),
            ChildSlot::One(_) => None,
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.loc().start;
        write!(f, "{}{}@{}:{}", self.kind(), self.id, start.line, start.column)
    }
}

/// Assembles a [`Tree`] over a source text.
///
/// ```ignore
/// let mut b = TreeBuilder::new("let x");
/// let root = b.node("Program", 0, 5)?;
/// let id = b.node("Identifier", 4, 5)?;
/// b.set_attr(id, "name", "x");
/// b.push(root, "body", id)?;
/// let tree = b.finish(root)?;
/// ```
#[derive(Debug)]
pub struct TreeBuilder<'s> {
    text: &'s str,
    lines: LineIndex,
    nodes: Vec<NodeData>,
    visitor_keys: VisitorKeys,
}

impl<'s> TreeBuilder<'s> {
    /// Creates a builder for `text`.
    #[must_use]
    pub fn new(text: &'s str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
            nodes: Vec::new(),
            visitor_keys: VisitorKeys::default(),
        }
    }

    /// Sets the visitor key table of the finished tree.
    #[must_use]
    pub fn visitor_keys(mut self, keys: VisitorKeys) -> Self {
        self.visitor_keys = keys;
        self
    }

    /// Adds a detached node spanning `start..end`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRange`] if the range is inverted or
    /// outside the text.
    pub fn node(
        &mut self,
        kind: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Result<NodeId, TreeError> {
        if start > end || end > self.text.len() {
            return Err(TreeError::InvalidRange {
                start,
                end,
                len: self.text.len(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: kind.into(),
            range: TextRange::new(start, end),
            loc: SourceLocation::new(self.lines.position(start), self.lines.position(end)),
            parent: None,
            slot: None,
            field: None,
            slots: Vec::new(),
            attributes: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Sets an attribute on a node.
    pub fn set_attr(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<Value>) {
        self.nodes[id.0].attributes.insert(key.into(), value.into());
    }

    /// Overrides the field name a node is known by in its parent.
    pub fn set_field(&mut self, id: NodeId, field: impl Into<String>) {
        self.nodes[id.0].field = Some(field.into());
    }

    /// Appends `child` to the list slot `slot` of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if the child is already attached, if attaching it would create
    /// a cycle, or if `slot` already holds a single node.
    pub fn push(&mut self, parent: NodeId, slot: &str, child: NodeId) -> Result<(), TreeError> {
        self.check_attach(parent, child)?;
        let data = &mut self.nodes[parent.0];
        match data.slots.iter_mut().find(|(n, _)| n == slot) {
            Some((_, ChildSlot::Many(ids))) => ids.push(child),
            Some((_, ChildSlot::One(_))) => {
                return Err(TreeError::SlotOccupied {
                    parent,
                    slot: slot.to_string(),
                })
            }
            None => data
                .slots
                .push((slot.to_string(), ChildSlot::Many(vec![child]))),
        }
        self.link(parent, slot, child);
        Ok(())
    }

    /// Stores `child` in the single-node slot `slot` of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if the child is already attached, if attaching it would create
    /// a cycle, or if `slot` is already in use.
    pub fn set(&mut self, parent: NodeId, slot: &str, child: NodeId) -> Result<(), TreeError> {
        self.check_attach(parent, child)?;
        let data = &mut self.nodes[parent.0];
        if data.slot(slot).is_some() {
            return Err(TreeError::SlotOccupied {
                parent,
                slot: slot.to_string(),
            });
        }
        data.slots.push((slot.to_string(), ChildSlot::One(child)));
        self.link(parent, slot, child);
        Ok(())
    }

    /// Finishes the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootHasParent`] if `root` is attached somewhere.
    pub fn finish(self, root: NodeId) -> Result<Tree, TreeError> {
        if self.nodes[root.0].parent.is_some() {
            return Err(TreeError::RootHasParent(root));
        }
        Ok(Tree {
            nodes: self.nodes,
            root,
            visitor_keys: self.visitor_keys,
        })
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.nodes[child.0].parent.is_some() {
            return Err(TreeError::AlreadyAttached { child });
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(TreeError::Cycle { parent, child });
            }
            cursor = self.nodes[id.0].parent;
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, slot: &str, child: NodeId) {
        let data = &mut self.nodes[child.0];
        data.parent = Some(parent);
        data.slot = Some(slot.to_string());
    }
}
