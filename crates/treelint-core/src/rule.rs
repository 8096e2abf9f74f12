//! Rule trait and rule metadata.

use std::collections::BTreeMap;

use crate::context::CreateContext;
use crate::error::LintError;
use crate::registry::Listeners;
use crate::types::Severity;

/// Kind of automatic fixes a rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixableKind {
    /// Fixes may change code.
    Code,
    /// Fixes only touch whitespace.
    Whitespace,
}

/// Static facts a rule declares about itself.
///
/// `fixable` and `has_suggestions` are contracts: a report carrying a fix or
/// suggestions from a rule that did not declare them aborts the lint.
#[derive(Debug, Clone, Default)]
pub struct RuleMeta {
    /// Whether and how the rule fixes problems.
    pub fixable: Option<FixableKind>,
    /// Whether the rule offers suggestions.
    pub has_suggestions: bool,
    /// Options merged under the configured ones.
    pub default_options: Vec<toml::Value>,
    /// Message templates by id.
    pub messages: BTreeMap<String, String>,
}

impl RuleMeta {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the rule fixable.
    #[must_use]
    pub fn fixable(mut self, kind: FixableKind) -> Self {
        self.fixable = Some(kind);
        self
    }

    /// Declares that the rule offers suggestions.
    #[must_use]
    pub fn with_suggestions(mut self) -> Self {
        self.has_suggestions = true;
        self
    }

    /// Adds a message template. `{{ name }}` placeholders are filled from
    /// report data.
    #[must_use]
    pub fn message(mut self, id: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(id.into(), template.into());
        self
    }

    /// Sets the default options.
    #[must_use]
    pub fn default_options(mut self, options: Vec<toml::Value>) -> Self {
        self.default_options = options;
        self
    }
}

/// A lint rule.
///
/// Rules do not walk the tree themselves. `create` returns listeners keyed
/// by selector; the engine walks the tree once and calls every listener
/// whose selector matches.
///
/// # Example
///
/// ```ignore
/// use treelint_core::{CreateContext, Descriptor, LintError, Listeners, Rule};
///
/// pub struct NoDebugger;
///
/// impl Rule for NoDebugger {
///     fn name(&self) -> &'static str { "no-debugger" }
///     fn code(&self) -> &'static str { "TL900" }
///
///     fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
///         Ok(Listeners::new().on("debugger_statement", |ctx, node| {
///             ctx.report(Descriptor::message("Unexpected debugger.").node(node))
///         }))
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "no-trailing-spaces").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "TL001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Severity used by presets.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Returns the rule's metadata.
    fn meta(&self) -> RuleMeta {
        RuleMeta::default()
    }

    /// Creates the listeners for one lint pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured options are invalid.
    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRule;

    impl Rule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }
        fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
            Ok(Listeners::new())
        }
    }

    #[test]
    fn test_rule_trait() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert_eq!(rule.default_severity(), Severity::Error);
        assert!(rule.meta().fixable.is_none());
    }

    #[test]
    fn meta_builder() {
        let meta = RuleMeta::new()
            .fixable(FixableKind::Whitespace)
            .with_suggestions()
            .message("unexpected", "Unexpected {{ name }}.");
        assert_eq!(meta.fixable, Some(FixableKind::Whitespace));
        assert!(meta.has_suggestions);
        assert_eq!(meta.messages["unexpected"], "Unexpected {{ name }}.");
    }
}
