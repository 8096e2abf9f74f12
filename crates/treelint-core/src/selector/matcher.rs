//! Matching a parsed selector against a node and its ancestry.

use serde_json::Value;

use super::parser::{AttributeOp, AttributeTest, AttributeValue, SelectorAst};
use crate::tree::Node;

/// Resolves `:class` pseudo-classes.
pub type ClassMatcher<'a> = &'a dyn Fn(&str, Node<'_>) -> bool;

/// Tests `node` against `ast`. `ancestry` lists ancestors from the root
/// down to the parent and never contains `node` itself.
pub(crate) fn matches<'t>(
    node: Node<'t>,
    ast: &SelectorAst,
    ancestry: &[Node<'t>],
    classes: ClassMatcher<'_>,
) -> bool {
    match ast {
        SelectorAst::Wildcard => true,
        SelectorAst::Identifier(name) => node.kind() == name,
        SelectorAst::Attribute { path, test } => {
            let value = resolve(node, path);
            match test {
                None => value.is_some_and(|v| !matches!(v, Resolved::Value(Value::Null))),
                Some(test) => compare(value, test),
            }
        }
        SelectorAst::Field(path) => in_field_path(node, path, ancestry),
        SelectorAst::NthChild(n) => node
            .sibling_list()
            .is_some_and(|(_, index)| index + 1 == *n),
        SelectorAst::NthLastChild(n) => node
            .sibling_list()
            .is_some_and(|(ids, index)| ids.len() - index == *n),
        SelectorAst::Class(name) => classes(name, node),
        SelectorAst::Not(list) => !list.iter().any(|s| matches(node, s, ancestry, classes)),
        SelectorAst::Matches(list) => list.iter().any(|s| matches(node, s, ancestry, classes)),
        SelectorAst::Compound(list) => list.iter().all(|s| matches(node, s, ancestry, classes)),
        SelectorAst::Child(left, right) => {
            matches(node, right, ancestry, classes)
                && ancestry.split_last().is_some_and(|(parent, rest)| {
                    matches(*parent, left, rest, classes)
                })
        }
        SelectorAst::Descendant(left, right) => {
            matches(node, right, ancestry, classes)
                && (0..ancestry.len())
                    .rev()
                    .any(|i| matches(ancestry[i], left, &ancestry[..i], classes))
        }
        SelectorAst::Sibling(left, right) => {
            matches(node, right, ancestry, classes)
                && node.sibling_list().is_some_and(|(ids, index)| {
                    ids[..index]
                        .iter()
                        .any(|id| matches(node.tree().node(*id), left, ancestry, classes))
                })
        }
        SelectorAst::Adjacent(left, right) => {
            matches(node, right, ancestry, classes)
                && node.sibling_list().is_some_and(|(ids, index)| {
                    index > 0 && matches(node.tree().node(ids[index - 1]), left, ancestry, classes)
                })
        }
    }
}

fn in_field_path(node: Node<'_>, path: &[String], ancestry: &[Node<'_>]) -> bool {
    if ancestry.len() < path.len() {
        return false;
    }
    let mut current = node;
    for name in path.iter().rev() {
        if current.field() != Some(name.as_str()) {
            return false;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    true
}

#[derive(Debug, Clone, Copy)]
enum Resolved<'t> {
    Value(&'t Value),
    Node(Node<'t>),
    Kind(&'t str),
}

fn resolve<'t>(node: Node<'t>, path: &[String]) -> Option<Resolved<'t>> {
    let mut current = Resolved::Node(node);
    for segment in path {
        current = match current {
            Resolved::Node(n) => n
                .attr(segment)
                .map(Resolved::Value)
                .or_else(|| (segment == "type").then(|| Resolved::Kind(n.kind())))
                .or_else(|| n.child_by_field(segment).map(Resolved::Node))?,
            Resolved::Value(Value::Object(map)) => Resolved::Value(map.get(segment)?),
            Resolved::Value(Value::Array(items)) => {
                Resolved::Value(items.get(segment.parse::<usize>().ok()?)?)
            }
            Resolved::Value(_) | Resolved::Kind(_) => return None,
        };
    }
    Some(current)
}

fn as_text(value: Resolved<'_>) -> Option<String> {
    match value {
        Resolved::Value(Value::String(s)) => Some(s.clone()),
        Resolved::Value(v) if matches!(v, Value::Number(_) | Value::Bool(_) | Value::Null) => {
            Some(v.to_string())
        }
        Resolved::Kind(kind) => Some(kind.to_string()),
        Resolved::Value(_) | Resolved::Node(_) => None,
    }
}

fn as_number(value: Resolved<'_>) -> Option<f64> {
    match value {
        Resolved::Value(Value::Number(n)) => n.as_f64(),
        Resolved::Value(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: Option<Resolved<'_>>) -> &'static str {
    match value {
        None => "undefined",
        Some(Resolved::Value(Value::String(_)) | Resolved::Kind(_)) => "string",
        Some(Resolved::Value(Value::Number(_))) => "number",
        Some(Resolved::Value(Value::Bool(_))) => "boolean",
        Some(_) => "object",
    }
}

fn compare(value: Option<Resolved<'_>>, test: &AttributeTest) -> bool {
    let equal = match &test.value {
        AttributeValue::Literal(literal) => match test.op {
            AttributeOp::Eq | AttributeOp::Ne => value.and_then(as_text).as_deref() == Some(literal),
            op => {
                let (Some(actual), Ok(expected)) =
                    (value.and_then(as_number), literal.parse::<f64>())
                else {
                    return false;
                };
                return match op {
                    AttributeOp::Lt => actual < expected,
                    AttributeOp::Le => actual <= expected,
                    AttributeOp::Gt => actual > expected,
                    _ => actual >= expected,
                };
            }
        },
        AttributeValue::Regex(re) => match value {
            Some(Resolved::Value(Value::String(s))) => re.is_match(s),
            Some(Resolved::Kind(kind)) => re.is_match(kind),
            _ => false,
        },
        AttributeValue::Type(name) => type_name(value) == name,
    };
    if test.op == AttributeOp::Ne {
        !equal
    } else {
        equal
    }
}
