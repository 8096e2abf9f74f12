//! Rule to forbid whitespace at the end of lines.
//!
//! # Rationale
//!
//! Trailing whitespace is invisible in most editors and produces noisy diffs.
//!
//! # Configuration
//!
//! - `skip_blank_lines`: Ignore lines made only of whitespace (default: false)
//! - `ignore_comments`: Ignore whitespace inside comments (default: false)
//!
//! Problems are fixed by deleting the whitespace.

use serde::Deserialize;
use treelint_core::{
    CreateContext, Descriptor, Fix, FixableKind, LintError, Listeners, Rule, RuleMeta,
    Severity, SourceLocation, TextRange, END_OF_FILE,
};

/// Rule code for no-trailing-spaces.
pub const CODE: &str = "TL001";

/// Rule name for no-trailing-spaces.
pub const NAME: &str = "no-trailing-spaces";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct Options {
    skip_blank_lines: bool,
    ignore_comments: bool,
}

/// Forbids trailing whitespace.
#[derive(Debug, Clone, Default)]
pub struct NoTrailingSpaces {
    defaults: Options,
}

impl NoTrailingSpaces {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default for `skip_blank_lines`.
    #[must_use]
    pub fn skip_blank_lines(mut self, skip: bool) -> Self {
        self.defaults.skip_blank_lines = skip;
        self
    }

    /// Sets the default for `ignore_comments`.
    #[must_use]
    pub fn ignore_comments(mut self, ignore: bool) -> Self {
        self.defaults.ignore_comments = ignore;
        self
    }
}

impl Rule for NoTrailingSpaces {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids whitespace at the end of lines"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn meta(&self) -> RuleMeta {
        let mut defaults = toml::Table::new();
        defaults.insert(
            "skip_blank_lines".into(),
            self.defaults.skip_blank_lines.into(),
        );
        defaults.insert("ignore_comments".into(), self.defaults.ignore_comments.into());
        RuleMeta::new()
            .fixable(FixableKind::Whitespace)
            .default_options(vec![toml::Value::Table(defaults)])
            .message("trailingSpace", "Trailing spaces not allowed.")
    }

    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let options: Options = ctx.option(0)?;

        Ok(Listeners::new().on_call(END_OF_FILE, move |ctx, _args| {
            let source = ctx.source_code();
            for line in 1..=source.line_count() {
                let (Some(text), Some(line_start)) =
                    (source.line(line), source.line_index().line_start(line))
                else {
                    continue;
                };
                let kept = text.trim_end_matches(char::is_whitespace);
                if kept.len() == text.len() || (options.skip_blank_lines && kept.is_empty()) {
                    continue;
                }

                let range = TextRange::new(line_start + kept.len(), line_start + text.len());
                if options.ignore_comments
                    && source
                        .comments()
                        .iter()
                        .any(|c| c.range.start < range.end && range.start < c.range.end)
                {
                    continue;
                }

                ctx.report(
                    Descriptor::message_id("trailingSpace")
                        .loc(SourceLocation::new(
                            source.position(range.start),
                            source.position(range.end),
                        ))
                        .fix(Fix::remove_range(range)),
                )?;
            }
            Ok(())
        }))
    }
}
