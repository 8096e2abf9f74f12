//! Tree walk and selector event generation.
//!
//! The walk is flattened into a list of [`Step`]s first. The
//! [`Traverser`] then replays the steps, keeping the ancestor stack, and
//! asks the [`EventGenerator`] which selectors fire on each node.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::LintError;
use crate::registry::EventArgs;
use crate::selector::{ClassMatcher, Selector, SelectorCache};
use crate::tree::{Node, NodeId, Tree};

/// Name of the call event emitted once the walk is done. Its single
/// argument is the line count.
pub const END_OF_FILE: &str = "end-of-file";

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Entering a node.
    Enter(NodeId),
    /// Leaving a node.
    Exit(NodeId),
    /// A named call event, dispatched by exact name.
    Call {
        /// Event name.
        event: String,
        /// Arguments passed to listeners.
        args: Vec<Value>,
    },
}

/// Depth-first enter/exit steps for the whole tree, children ordered by the
/// visitor keys.
#[must_use]
pub fn steps(tree: &Tree) -> Vec<Step> {
    let mut out = Vec::with_capacity(tree.len() * 2);
    let mut stack = vec![(tree.root().id(), false)];
    while let Some((id, entered)) = stack.pop() {
        if entered {
            out.push(Step::Exit(id));
            continue;
        }
        out.push(Step::Enter(id));
        stack.push((id, true));
        for child in tree.traversal_children(id).into_iter().rev() {
            stack.push((child, false));
        }
    }
    out
}

/// Receives matched events.
pub trait EventSink<'t> {
    /// Handles one event. `ancestors` runs from the root down to the
    /// parent; it is empty for call events.
    ///
    /// # Errors
    ///
    /// Any error stops the traversal.
    fn emit(
        &mut self,
        event: &str,
        args: &EventArgs<'t>,
        ancestors: &[Node<'t>],
    ) -> Result<(), LintError>;
}

/// Selectors bucketed by phase and node kind, each bucket ordered by
/// specificity.
#[derive(Debug, Default)]
pub struct EventGenerator {
    enter_by_type: HashMap<String, Vec<Arc<Selector>>>,
    exit_by_type: HashMap<String, Vec<Arc<Selector>>>,
    enter_any: Vec<Arc<Selector>>,
    exit_any: Vec<Arc<Selector>>,
}

impl EventGenerator {
    /// Compiles `selectors` through `cache` and buckets them.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::InvalidSelector`] for the first selector that
    /// does not parse.
    pub fn new<I, S>(selectors: I, cache: &SelectorCache) -> Result<Self, LintError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut generator = Self::default();
        for raw in selectors {
            let selector = cache.get(raw.as_ref())?;
            let (by_type, any) = if selector.is_exit() {
                (&mut generator.exit_by_type, &mut generator.exit_any)
            } else {
                (&mut generator.enter_by_type, &mut generator.enter_any)
            };
            match selector.node_types() {
                Some(kinds) => {
                    for kind in kinds {
                        by_type
                            .entry(kind.clone())
                            .or_default()
                            .push(Arc::clone(&selector));
                    }
                }
                None => any.push(Arc::clone(&selector)),
            }
        }
        let by_specificity = |a: &Arc<Selector>, b: &Arc<Selector>| a.compare(b);
        for bucket in generator
            .enter_by_type
            .values_mut()
            .chain(generator.exit_by_type.values_mut())
        {
            bucket.sort_by(by_specificity);
        }
        generator.enter_any.sort_by(by_specificity);
        generator.exit_any.sort_by(by_specificity);
        trace!(
            typed = generator.enter_by_type.len() + generator.exit_by_type.len(),
            any = generator.enter_any.len() + generator.exit_any.len(),
            "built event generator"
        );
        Ok(generator)
    }

    /// Emits every selector of the phase that matches `node`, lowest
    /// specificity first.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `sink`.
    pub fn apply_selectors<'t>(
        &self,
        node: Node<'t>,
        ancestry: &[Node<'t>],
        is_exit: bool,
        classes: ClassMatcher<'_>,
        sink: &mut dyn EventSink<'t>,
    ) -> Result<(), LintError> {
        let (by_type, any) = if is_exit {
            (&self.exit_by_type, &self.exit_any)
        } else {
            (&self.enter_by_type, &self.enter_any)
        };
        let typed = by_type.get(node.kind()).map_or(&[][..], Vec::as_slice);
        let args = EventArgs::Node(node);
        let (mut i, mut j) = (0, 0);
        while i < typed.len() || j < any.len() {
            let take_any = i >= typed.len()
                || (j < any.len() && any[j].compare(&typed[i]) == Ordering::Less);
            let selector = if take_any {
                j += 1;
                &any[j - 1]
            } else {
                i += 1;
                &typed[i - 1]
            };
            if selector.matches(node, ancestry, classes) {
                sink.emit(selector.source(), &args, ancestry)?;
            }
        }
        Ok(())
    }
}

/// Replays traversal steps against an [`EventGenerator`].
pub struct Traverser<'g> {
    generator: &'g EventGenerator,
    classes: ClassMatcher<'g>,
}

impl<'g> Traverser<'g> {
    /// Creates a traverser using `classes` for `:class` selectors.
    #[must_use]
    pub fn new(generator: &'g EventGenerator, classes: ClassMatcher<'g>) -> Self {
        Self { generator, classes }
    }

    /// Runs every step. The node is dispatched on enter before it joins the
    /// ancestor stack, and leaves the stack before its exit dispatch.
    ///
    /// # Errors
    ///
    /// Returns the first listener error, wrapped with the node being
    /// visited.
    pub fn run<'t>(
        &self,
        tree: &'t Tree,
        steps: &'t [Step],
        sink: &mut dyn EventSink<'t>,
    ) -> Result<(), LintError> {
        let mut ancestry: Vec<Node<'t>> = Vec::new();
        for step in steps {
            match step {
                Step::Enter(id) => {
                    let node = tree.node(*id);
                    self.generator
                        .apply_selectors(node, &ancestry, false, self.classes, sink)
                        .map_err(|e| at_node(e, node))?;
                    ancestry.push(node);
                }
                Step::Exit(id) => {
                    let node = tree.node(*id);
                    ancestry.pop();
                    self.generator
                        .apply_selectors(node, &ancestry, true, self.classes, sink)
                        .map_err(|e| at_node(e, node))?;
                }
                Step::Call { event, args } => {
                    sink.emit(event, &EventArgs::Call(args.as_slice()), &[])?;
                }
            }
        }
        Ok(())
    }
}

fn at_node(error: LintError, node: Node<'_>) -> LintError {
    let start = node.loc().start;
    LintError::AtNode {
        node_type: node.kind().to_string(),
        line: start.line,
        column: start.column + 1,
        source: Box::new(error),
    }
}
