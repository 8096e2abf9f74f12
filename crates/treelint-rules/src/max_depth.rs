//! Rule to limit how deeply blocks nest.
//!
//! # Configuration
//!
//! - `max`: Deepest allowed nesting (default: 4)
//! - `selector`: Which nodes count as a nesting level (default: `":block"`,
//!   every node whose kind ends in `block`)

use std::cell::Cell;
use std::rc::Rc;

use serde::Deserialize;
use treelint_core::{CreateContext, Descriptor, LintError, Listeners, Rule, RuleMeta, Severity};

/// Rule code for max-depth.
pub const CODE: &str = "TL005";

/// Rule name for max-depth.
pub const NAME: &str = "max-depth";

const DEFAULT_MAX: usize = 4;
const DEFAULT_SELECTOR: &str = ":block";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Options {
    max: usize,
    selector: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX,
            selector: DEFAULT_SELECTOR.to_string(),
        }
    }
}

/// Limits block nesting depth.
#[derive(Debug, Clone)]
pub struct MaxDepth {
    max: usize,
}

impl Default for MaxDepth {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxDepth {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { max: DEFAULT_MAX }
    }

    /// Sets the default maximum depth.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }
}

impl Rule for MaxDepth {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Limits how deeply blocks can be nested"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn meta(&self) -> RuleMeta {
        let mut defaults = toml::Table::new();
        let max = i64::try_from(self.max).unwrap_or(i64::MAX);
        defaults.insert("max".into(), toml::Value::Integer(max));
        RuleMeta::new()
            .default_options(vec![toml::Value::Table(defaults)])
            .message(
                "tooDeeply",
                "Blocks are nested too deeply ({{ depth }}). Maximum allowed is {{ max }}.",
            )
    }

    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let options: Options = ctx.option(0)?;
        let depth = Rc::new(Cell::new(0_usize));
        let exit = Rc::clone(&depth);
        let max = options.max;

        Ok(Listeners::new()
            .on(options.selector.clone(), move |ctx, node| {
                depth.set(depth.get() + 1);
                if depth.get() <= max {
                    return Ok(());
                }
                ctx.report(
                    Descriptor::message_id("tooDeeply")
                        .data("depth", depth.get())
                        .data("max", max)
                        .node(node),
                )
            })
            .on(format!("{}:exit", options.selector), move |_ctx, _node| {
                exit.set(exit.get().saturating_sub(1));
                Ok(())
            }))
    }
}
