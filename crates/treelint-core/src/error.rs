//! Error types raised by the engine.
//!
//! Everything in [`LintError`] is a configuration or programming mistake and
//! aborts the current lint call. Problems found in the linted text, including
//! parse failures, are reported as [`crate::Problem`]s instead.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::config::ConfigError;
use crate::tree::NodeId;

/// Errors that abort a lint call.
#[derive(Debug, Error, Diagnostic)]
pub enum LintError {
    /// A selector could not be parsed.
    #[error("Syntax error in selector \"{selector}\" at position {position}: {message}")]
    #[diagnostic(code(treelint::selector_syntax))]
    InvalidSelector {
        /// Raw selector text.
        #[source_code]
        selector: String,
        /// Byte offset of the failure inside the selector.
        position: usize,
        /// What the parser expected.
        message: String,
        /// Span pointing at `position`.
        #[label("{message}")]
        span: SourceSpan,
    },

    /// A rule reported a fix without declaring itself fixable.
    #[error(
        "Fixable rules must set the `fixable` meta property to \"code\" or \"whitespace\" (rule '{rule_id}')."
    )]
    #[diagnostic(code(treelint::undeclared_fix))]
    UndeclaredFix {
        /// Offending rule.
        rule_id: String,
    },

    /// A rule reported suggestions without declaring `has_suggestions`.
    #[error(
        "Rules with suggestions must set the `has_suggestions` meta property to true (rule '{rule_id}')."
    )]
    #[diagnostic(code(treelint::undeclared_suggestions))]
    UndeclaredSuggestions {
        /// Offending rule.
        rule_id: String,
    },

    /// A report descriptor was malformed.
    #[error("Invalid report from rule '{rule_id}': {message}")]
    #[diagnostic(code(treelint::invalid_report))]
    InvalidReport {
        /// Offending rule.
        rule_id: String,
        /// Description of the defect.
        message: String,
    },

    /// Options passed to a rule could not be understood.
    #[error("Invalid options for rule '{rule_id}': {message}")]
    #[diagnostic(code(treelint::invalid_options))]
    InvalidOptions {
        /// Offending rule.
        rule_id: String,
        /// Description of the defect.
        message: String,
    },

    /// A directive kind outside the four known kinds.
    #[error("Unrecognized directive type '{kind}'")]
    #[diagnostic(code(treelint::unrecognized_directive))]
    UnrecognizedDirective {
        /// The kind as written.
        kind: String,
    },

    /// `Rule::create` failed.
    #[error("Error while loading rule '{rule_id}': {source}")]
    #[diagnostic(code(treelint::rule_load))]
    RuleLoad {
        /// Rule being created.
        rule_id: String,
        /// Underlying failure.
        source: Box<LintError>,
    },

    /// A listener returned an error.
    #[error("{source}\nRule: \"{rule_id}\"")]
    #[diagnostic(code(treelint::rule_failed))]
    InRule {
        /// Rule owning the listener.
        rule_id: String,
        /// Underlying failure.
        source: Box<LintError>,
    },

    /// Traversal aborted while visiting a node.
    #[error("{source}\nOccurred while visiting {node_type} at {line}:{column}")]
    #[diagnostic(code(treelint::traversal))]
    AtNode {
        /// Kind of the node being visited.
        node_type: String,
        /// 1-based line of the node.
        line: usize,
        /// 1-based column of the node.
        column: usize,
        /// Underlying failure.
        source: Box<LintError>,
    },

    /// Two rules were registered under the same name.
    #[error("Rule '{name}' is registered more than once")]
    DuplicateRule {
        /// Duplicated name.
        name: String,
    },

    /// The linter was built without a source parser.
    #[error("No source parser configured")]
    MissingParser,

    /// Invalid tree construction.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Free-form failure raised from rule code.
    #[error("{0}")]
    Custom(String),
}

impl LintError {
    /// Creates an [`LintError::InvalidSelector`] pointing at `position`.
    #[must_use]
    pub fn invalid_selector(
        selector: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        let selector = selector.into();
        let width = usize::from(position < selector.len());
        Self::InvalidSelector {
            span: SourceSpan::from((position, width)),
            selector,
            position,
            message: message.into(),
        }
    }

    /// Creates a free-form error from rule code.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Strips the rule and node context wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::InRule { source, .. }
            | Self::AtNode { source, .. }
            | Self::RuleLoad { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn in_rule(self, rule_id: &str) -> Self {
        Self::InRule {
            rule_id: rule_id.to_string(),
            source: Box::new(self),
        }
    }
}

/// Errors raised while assembling a [`crate::Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node already hangs under another parent.
    #[error("node {child} is already attached to a parent")]
    AlreadyAttached {
        /// Node being attached.
        child: NodeId,
    },

    /// Attaching the node would make it its own ancestor.
    #[error("attaching node {child} under {parent} would create a cycle")]
    Cycle {
        /// Prospective parent.
        parent: NodeId,
        /// Node being attached.
        child: NodeId,
    },

    /// A single-node slot is already filled, or a slot was used with the
    /// wrong arity.
    #[error("slot '{slot}' of node {parent} cannot take another child")]
    SlotOccupied {
        /// Parent node.
        parent: NodeId,
        /// Slot name.
        slot: String,
    },

    /// A node range falls outside the source text.
    #[error("range {start}..{end} is outside the source text (length {len})")]
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Source length in bytes.
        len: usize,
    },

    /// The chosen root has a parent.
    #[error("node {0} cannot be the root because it has a parent")]
    RootHasParent(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_error_message_names_position() {
        let err = LintError::invalid_selector("Foo >", 5, "Expected a selector");
        assert_eq!(
            err.to_string(),
            "Syntax error in selector \"Foo >\" at position 5: Expected a selector"
        );
    }

    #[test]
    fn root_cause_unwraps_context() {
        let err = LintError::AtNode {
            node_type: "Identifier".into(),
            line: 1,
            column: 1,
            source: Box::new(LintError::custom("boom").in_rule("demo")),
        };
        assert!(matches!(err.root_cause(), LintError::Custom(msg) if msg == "boom"));
        assert!(err.to_string().starts_with("boom\nRule: \"demo\""));
    }
}
