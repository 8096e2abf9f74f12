//! Compiled selectors and the per-linter selector cache.
//!
//! A selector is an esquery-style pattern over node kinds, attributes and
//! tree shape. Compilation derives the facts dispatch needs: which node
//! kinds can match at all, whether the listener fires on exit, and the
//! specificity used to order listeners on the same node.

mod matcher;
mod parser;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::error::LintError;
use crate::tree::Node;

pub use matcher::ClassMatcher;
pub use parser::{AttributeOp, AttributeTest, AttributeValue, SelectorAst};

const EXIT_SUFFIX: &str = ":exit";

/// A compiled selector.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    ast: SelectorAst,
    is_exit: bool,
    node_types: Option<Vec<String>>,
    attribute_count: usize,
    identifier_count: usize,
}

impl Selector {
    /// Compiles raw selector text, including an optional `:exit` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::InvalidSelector`] on a syntax error.
    pub fn parse(raw: &str) -> Result<Self, LintError> {
        let (body, is_exit) = match raw.strip_suffix(EXIT_SUFFIX) {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let ast = parser::parse(body)
            .map_err(|e| LintError::invalid_selector(raw, e.position, e.message))?;
        let (attribute_count, identifier_count) = count(&ast);
        Ok(Self {
            source: raw.to_string(),
            node_types: node_types(&ast),
            ast,
            is_exit,
            attribute_count,
            identifier_count,
        })
    }

    /// The raw text, `:exit` included.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed syntax.
    #[must_use]
    pub fn ast(&self) -> &SelectorAst {
        &self.ast
    }

    /// True for `:exit` selectors.
    #[must_use]
    pub fn is_exit(&self) -> bool {
        self.is_exit
    }

    /// Kinds this selector can match, `None` when it may match any kind.
    #[must_use]
    pub fn node_types(&self) -> Option<&[String]> {
        self.node_types.as_deref()
    }

    /// Attribute, field, class and nth-child queries.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attribute_count
    }

    /// Kind identifiers.
    #[must_use]
    pub fn identifier_count(&self) -> usize {
        self.identifier_count
    }

    /// Specificity order: attribute count, then identifier count, then the
    /// raw text.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.attribute_count
            .cmp(&other.attribute_count)
            .then(self.identifier_count.cmp(&other.identifier_count))
            .then_with(|| self.source.cmp(&other.source))
    }

    /// Tests a node. `ancestry` lists ancestors from the root down to the
    /// parent.
    #[must_use]
    pub fn matches<'t>(
        &self,
        node: Node<'t>,
        ancestry: &[Node<'t>],
        classes: ClassMatcher<'_>,
    ) -> bool {
        matcher::matches(node, &self.ast, ancestry, classes)
    }
}

fn node_types(ast: &SelectorAst) -> Option<Vec<String>> {
    match ast {
        SelectorAst::Identifier(name) => Some(vec![name.clone()]),
        SelectorAst::Matches(list) => {
            let mut union: Vec<String> = Vec::new();
            for types in list.iter().map(node_types) {
                for kind in types? {
                    if !union.contains(&kind) {
                        union.push(kind);
                    }
                }
            }
            Some(union)
        }
        SelectorAst::Compound(list) => {
            let mut typed = list.iter().filter_map(node_types);
            let first = typed.next()?;
            Some(typed.fold(first, |acc, types| {
                acc.into_iter().filter(|k| types.contains(k)).collect()
            }))
        }
        SelectorAst::Child(_, right)
        | SelectorAst::Descendant(_, right)
        | SelectorAst::Sibling(_, right)
        | SelectorAst::Adjacent(_, right) => node_types(right),
        _ => None,
    }
}

fn count(ast: &SelectorAst) -> (usize, usize) {
    let sum = |list: &[SelectorAst]| {
        list.iter()
            .map(count)
            .fold((0, 0), |(a, i), (da, di)| (a + da, i + di))
    };
    match ast {
        SelectorAst::Wildcard | SelectorAst::Class(_) => (0, 0),
        SelectorAst::Identifier(_) => (0, 1),
        SelectorAst::Attribute { .. }
        | SelectorAst::Field(_)
        | SelectorAst::NthChild(_)
        | SelectorAst::NthLastChild(_) => (1, 0),
        SelectorAst::Not(list) | SelectorAst::Matches(list) | SelectorAst::Compound(list) => {
            sum(list)
        }
        SelectorAst::Child(left, right)
        | SelectorAst::Descendant(left, right)
        | SelectorAst::Sibling(left, right)
        | SelectorAst::Adjacent(left, right) => {
            let (la, li) = count(left);
            let (ra, ri) = count(right);
            (la + ra, li + ri)
        }
    }
}

/// Compiled selectors keyed by raw text, in first-compiled order.
///
/// Owned by a linter instance; shared by every lint call it serves.
#[derive(Debug, Default)]
pub struct SelectorCache {
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    order: Vec<String>,
    entries: HashMap<String, Arc<Selector>>,
}

impl SelectorCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled selector for `raw`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::InvalidSelector`] on a syntax error. Failures
    /// are not cached.
    pub fn get(&self, raw: &str) -> Result<Arc<Selector>, LintError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(selector) = inner.entries.get(raw) {
            return Ok(Arc::clone(selector));
        }
        trace!(selector = raw, "compiling selector");
        let selector = Arc::new(Selector::parse(raw)?);
        inner.order.push(raw.to_string());
        inner.entries.insert(raw.to_string(), Arc::clone(&selector));
        Ok(selector)
    }

    /// Number of cached selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    /// True when nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw texts in first-compiled order.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Tree, TreeBuilder};

    // ────────────────────────────────────────────
    // Analysis
    // ────────────────────────────────────────────

    #[test]
    fn exit_suffix_is_detected() {
        let s = Selector::parse("FunctionDeclaration:exit").unwrap();
        assert!(s.is_exit());
        assert_eq!(s.node_types(), Some(&["FunctionDeclaration".to_string()][..]));
        assert_eq!(s.source(), "FunctionDeclaration:exit");
    }

    #[test]
    fn node_types_follow_combinators_and_lists() {
        let types = |raw: &str| Selector::parse(raw).unwrap().node_types().map(<[String]>::to_vec);
        assert_eq!(types("A > B"), Some(vec!["B".to_string()]));
        assert_eq!(types("A, B"), Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(types("A, *"), None);
        assert_eq!(types(":matches(A, B):matches(B, C)"), Some(vec!["B".to_string()]));
        assert_eq!(types("[name]"), None);
        assert_eq!(types(":not(A)"), None);
    }

    #[test]
    fn counts_attributes_and_identifiers() {
        let s = Selector::parse("A > B[name=\"x\"]:first-child .body").unwrap();
        assert_eq!(s.attribute_count(), 3);
        assert_eq!(s.identifier_count(), 2);
        let s = Selector::parse(":not(A, [x])").unwrap();
        assert_eq!((s.attribute_count(), s.identifier_count()), (1, 1));
    }

    #[test]
    fn specificity_ordering() {
        let star = Selector::parse("*").unwrap();
        let ident = Selector::parse("Foo").unwrap();
        let attr = Selector::parse("[x]").unwrap();
        let two = Selector::parse("Bar > Foo").unwrap();
        assert_eq!(star.compare(&ident), Ordering::Less);
        assert_eq!(ident.compare(&two), Ordering::Less);
        assert_eq!(two.compare(&attr), Ordering::Less);
        let a = Selector::parse("A").unwrap();
        let b = Selector::parse("B").unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn classes_add_no_specificity() {
        let class = Selector::parse(":statement").unwrap();
        assert_eq!((class.attribute_count(), class.identifier_count()), (0, 0));
        let ident = Selector::parse("Identifier").unwrap();
        assert_eq!(class.compare(&ident), Ordering::Less);
        let attr = Selector::parse("[x]").unwrap();
        assert_eq!(class.compare(&attr), Ordering::Less);
    }

    #[test]
    fn syntax_error_carries_raw_source() {
        let err = Selector::parse("A >:exit").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error in selector \"A >:exit\" at position 3: Expected a selector"
        );
    }

    #[test]
    fn cache_keeps_first_compiled_order() {
        let cache = SelectorCache::new();
        let first = cache.get("B").unwrap();
        cache.get("A").unwrap();
        let again = cache.get("B").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.sources(), vec!["B".to_string(), "A".to_string()]);
        assert!(cache.get("[").is_err());
        assert_eq!(cache.len(), 2);
    }

    // ────────────────────────────────────────────
    // Matching
    // ────────────────────────────────────────────

    // Program
    //   body: [ Call(callee: Identifier foo, args: [Literal 1, Literal "two"]),
    //           Identifier bar ]
    fn sample(text: &str) -> Tree {
        let mut b = TreeBuilder::new(text);
        let root = b.node("Program", 0, text.len()).unwrap();
        let call = b.node("Call", 0, 14).unwrap();
        let callee = b.node("Identifier", 0, 3).unwrap();
        b.set_attr(callee, "name", "foo");
        let one = b.node("Literal", 4, 5).unwrap();
        b.set_attr(one, "value", 1);
        let two = b.node("Literal", 7, 12).unwrap();
        b.set_attr(two, "value", "two");
        b.set_attr(two, "meta", serde_json::json!({"quote": "double"}));
        let bar = b.node("Identifier", 15, 18).unwrap();
        b.set_attr(bar, "name", "bar");
        b.set(call, "callee", callee).unwrap();
        b.push(call, "args", one).unwrap();
        b.push(call, "args", two).unwrap();
        b.push(root, "body", call).unwrap();
        b.push(root, "body", bar).unwrap();
        b.finish(root).unwrap()
    }

    const TEXT: &str = "foo(1, \"two\");\nbar";

    fn no_classes(_: &str, _: Node<'_>) -> bool {
        false
    }

    fn ancestry(node: Node<'_>) -> Vec<Node<'_>> {
        let mut out = Vec::new();
        let mut cur = node.parent();
        while let Some(p) = cur {
            out.push(p);
            cur = p.parent();
        }
        out.reverse();
        out
    }

    fn matching<'t>(tree: &'t Tree, raw: &str) -> Vec<Node<'t>> {
        let selector = Selector::parse(raw).unwrap();
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if selector.matches(node, &ancestry(node), &no_classes) {
                out.push(node);
            }
            stack.extend(node.all_children().into_iter().rev());
        }
        out
    }

    fn names(nodes: &[Node<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| match n.attr("name").or(n.attr("value")) {
                Some(v) => v.to_string().trim_matches('"').to_string(),
                None => n.kind().to_string(),
            })
            .collect()
    }

    #[test]
    fn child_and_descendant() {
        let tree = sample(TEXT);
        assert_eq!(names(&matching(&tree, "Program > Identifier")), vec!["bar"]);
        assert_eq!(names(&matching(&tree, "Program Identifier")), vec!["foo", "bar"]);
        assert_eq!(names(&matching(&tree, "Call > *")), vec!["foo", "1", "two"]);
    }

    #[test]
    fn attribute_operators() {
        let tree = sample(TEXT);
        assert_eq!(names(&matching(&tree, "[name=\"foo\"]")), vec!["foo"]);
        assert_eq!(names(&matching(&tree, "Identifier[name!=foo]")), vec!["bar"]);
        assert_eq!(names(&matching(&tree, "[value>=1]")), vec!["1"]);
        assert_eq!(names(&matching(&tree, "[value=/^t/]")), vec!["two"]);
        assert_eq!(names(&matching(&tree, "[value=type(number)]")), vec!["1"]);
        assert_eq!(names(&matching(&tree, "[meta.quote=double]")), vec!["two"]);
        assert_eq!(names(&matching(&tree, "[callee.name=foo]")), vec!["Call"]);
        assert_eq!(names(&matching(&tree, "[type=Call]")), vec!["Call"]);
    }

    #[test]
    fn fields_and_positions() {
        let tree = sample(TEXT);
        assert_eq!(names(&matching(&tree, ".callee")), vec!["foo"]);
        assert_eq!(names(&matching(&tree, "Literal:first-child")), vec!["1"]);
        assert_eq!(names(&matching(&tree, "Literal:last-child")), vec!["two"]);
        assert_eq!(names(&matching(&tree, ":nth-child(2)")), vec!["two", "bar"]);
        assert_eq!(names(&matching(&tree, "Literal ~ Literal")), vec!["two"]);
        assert_eq!(names(&matching(&tree, "Call + Identifier")), vec!["bar"]);
        assert!(matching(&tree, "Identifier + Identifier").is_empty());
    }

    #[test]
    fn negation_and_alternatives() {
        let tree = sample(TEXT);
        assert_eq!(names(&matching(&tree, "Identifier:not([name=foo])")), vec!["bar"]);
        assert_eq!(names(&matching(&tree, ":is(Call, Literal[value=1])")), vec!["Call", "1"]);
    }

    #[test]
    fn classes_use_the_supplied_matcher() {
        let tree = sample(TEXT);
        let selector = Selector::parse(":call").unwrap();
        let by_kind = |class: &str, node: Node<'_>| crate::parser::default_class_match(class, node.kind());
        let call = tree.root().children("body")[0];
        assert!(selector.matches(call, &ancestry(call), &by_kind));
        assert!(!selector.matches(call, &ancestry(call), &no_classes));
    }
}
