//! Context types handed to rules.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;

use crate::error::LintError;
use crate::report::{Descriptor, Report};
use crate::rule::RuleMeta;
use crate::source::SourceCode;
use crate::tree::Node;
use crate::types::Severity;

/// A configured rule taking part in one lint call.
#[derive(Debug, Clone)]
pub struct ActiveRule {
    id: String,
    severity: Severity,
    meta: RuleMeta,
    options: Vec<toml::Value>,
}

impl ActiveRule {
    /// Creates an entry. `options` are already merged with the defaults.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        meta: RuleMeta,
        options: Vec<toml::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            meta,
            options,
        }
    }

    /// Rule name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Severity of reported problems.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Declared metadata.
    #[must_use]
    pub fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    /// Effective options.
    #[must_use]
    pub fn options(&self) -> &[toml::Value] {
        &self.options
    }
}

/// Context passed to [`crate::Rule::create`].
#[derive(Debug, Clone, Copy)]
pub struct CreateContext<'a> {
    rule: &'a ActiveRule,
    source: &'a SourceCode,
    settings: &'a toml::Table,
    flags: &'a BTreeSet<String>,
}

impl<'a> CreateContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(
        rule: &'a ActiveRule,
        source: &'a SourceCode,
        settings: &'a toml::Table,
        flags: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            rule,
            source,
            settings,
            flags,
        }
    }

    /// Rule name.
    #[must_use]
    pub fn id(&self) -> &'a str {
        self.rule.id()
    }

    /// Effective options.
    #[must_use]
    pub fn options(&self) -> &'a [toml::Value] {
        self.rule.options()
    }

    /// Deserializes the option at `index`, falling back to `T::default()`
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::InvalidOptions`] if the option has the wrong
    /// shape.
    pub fn option<T: DeserializeOwned + Default>(&self, index: usize) -> Result<T, LintError> {
        match self.options().get(index) {
            None => Ok(T::default()),
            Some(value) => value.clone().try_into().map_err(|e: toml::de::Error| {
                LintError::InvalidOptions {
                    rule_id: self.id().to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    /// Shared settings.
    #[must_use]
    pub fn settings(&self) -> &'a toml::Table {
        self.settings
    }

    /// The text being linted.
    #[must_use]
    pub fn source_code(&self) -> &'a SourceCode {
        self.source
    }

    /// Whether a feature flag was enabled on the linter.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

/// Context passed to listeners.
pub struct RuleContext<'c> {
    rule: &'c ActiveRule,
    source: &'c SourceCode,
    settings: &'c toml::Table,
    ancestors: &'c [Node<'c>],
    report: &'c mut Report,
}

impl<'c> RuleContext<'c> {
    pub(crate) fn new(
        rule: &'c ActiveRule,
        source: &'c SourceCode,
        settings: &'c toml::Table,
        ancestors: &'c [Node<'c>],
        report: &'c mut Report,
    ) -> Self {
        Self {
            rule,
            source,
            settings,
            ancestors,
            report,
        }
    }

    /// Rule name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.rule.id()
    }

    /// Effective options.
    #[must_use]
    pub fn options(&self) -> &[toml::Value] {
        self.rule.options()
    }

    /// Shared settings.
    #[must_use]
    pub fn settings(&self) -> &toml::Table {
        self.settings
    }

    /// The text being linted.
    #[must_use]
    pub fn source_code(&self) -> &'c SourceCode {
        self.source
    }

    /// Ancestors of the current node, root first. Empty for call events.
    #[must_use]
    pub fn ancestors(&self) -> &[Node<'c>] {
        self.ancestors
    }

    /// Reports a problem.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is malformed or breaks the rule's
    /// declared `fixable` / `has_suggestions` contract.
    pub fn report(&mut self, descriptor: Descriptor) -> Result<(), LintError> {
        self.report
            .add_rule_problem(self.rule, descriptor, self.source)
    }
}
