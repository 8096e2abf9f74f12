//! Rule to forbid syntax matched by configured selectors.
//!
//! Every option is either a selector string or a table
//! `{ selector = "...", message = "..." }`.
//!
//! ```toml
//! [rules]
//! no-restricted-syntax = ["error", "call_expression", { selector = "Block > Block", message = "Flatten this." }]
//! ```

use serde::Deserialize;
use treelint_core::{CreateContext, Descriptor, LintError, Listeners, Rule, RuleMeta};

/// Rule code for no-restricted-syntax.
pub const CODE: &str = "TL004";

/// Rule name for no-restricted-syntax.
pub const NAME: &str = "no-restricted-syntax";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Restriction {
    Selector(String),
    Detailed {
        selector: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl Restriction {
    fn into_parts(self) -> (String, Option<String>) {
        match self {
            Self::Selector(selector) => (selector, None),
            Self::Detailed { selector, message } => (selector, message),
        }
    }
}

/// Forbids syntax matching configured selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestrictedSyntax;

impl NoRestrictedSyntax {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoRestrictedSyntax {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids syntax matched by configured selectors"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new().message("restrictedSyntax", "Using '{{ selector }}' is not allowed.")
    }

    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let mut listeners = Listeners::new();
        for option in ctx.options() {
            let restriction: Restriction =
                option
                    .clone()
                    .try_into()
                    .map_err(|e: toml::de::Error| LintError::InvalidOptions {
                        rule_id: ctx.id().to_string(),
                        message: e.to_string(),
                    })?;
            let (selector, message) = restriction.into_parts();
            let shown = selector.clone();
            listeners = listeners.on(selector, move |ctx, node| {
                let descriptor = match &message {
                    Some(text) => Descriptor::message(text.as_str()),
                    None => Descriptor::message_id("restrictedSyntax").data("selector", &shown),
                };
                ctx.report(descriptor.node(node))
            });
        }
        Ok(listeners)
    }
}
