//! Rule to require or forbid a line break at the end of the text.
//!
//! The first option is `"always"` (default) or `"never"`.

use serde::Deserialize;
use treelint_core::{
    CreateContext, Descriptor, Fix, FixableKind, LintError, Listeners, Rule, RuleMeta,
    Severity, TextRange, END_OF_FILE,
};

/// Rule code for eol-last.
pub const CODE: &str = "TL002";

/// Rule name for eol-last.
pub const NAME: &str = "eol-last";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Mode {
    #[default]
    Always,
    Never,
}

/// Requires (or forbids) a final line break.
#[derive(Debug, Clone, Copy, Default)]
pub struct EolLast;

impl EolLast {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for EolLast {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires or forbids a newline at the end of the text"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new()
            .fixable(FixableKind::Whitespace)
            .message("missing", "Newline required at end of file but not found.")
            .message("unexpected", "Newline not allowed at end of file.")
    }

    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let mode: Mode = ctx.option(0)?;

        Ok(Listeners::new().on_call(END_OF_FILE, move |ctx, _args| {
            let source = ctx.source_code();
            let text = source.text();
            if text.is_empty() {
                return Ok(());
            }
            let ends_with_break = text.ends_with(['\n', '\r']);

            match mode {
                Mode::Always if !ends_with_break => ctx.report(
                    Descriptor::message_id("missing")
                        .at(source.position(text.len()))
                        .fix(Fix::insert_at(text.len(), "\n")),
                ),
                Mode::Never if ends_with_break => {
                    let kept = text.trim_end_matches(['\n', '\r']);
                    let range = TextRange::new(kept.len(), text.len());
                    ctx.report(
                        Descriptor::message_id("unexpected")
                            .at(source.position(range.start))
                            .fix(Fix::remove_range(range)),
                    )
                }
                _ => Ok(()),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fix, lint};

    fn never() -> Vec<toml::Value> {
        vec![toml::Value::String("never".into())]
    }

    #[test]
    fn test_detects_missing_newline() {
        let output = lint(EolLast::new(), vec![], "a\nb");
        assert_eq!(output.messages.len(), 1);
        assert_eq!((output.messages[0].line, output.messages[0].column), (2, 2));
        assert_eq!(fix(EolLast::new(), vec![], "a\nb").output, "a\nb\n");
    }

    #[test]
    fn test_allows_final_newline() {
        assert!(lint(EolLast::new(), vec![], "a\r\n").messages.is_empty());
        assert!(lint(EolLast::new(), vec![], "").messages.is_empty());
    }

    #[test]
    fn test_never_removes_trailing_breaks() {
        let output = lint(EolLast::new(), never(), "a\n\n");
        assert_eq!(output.messages[0].message, "Newline not allowed at end of file.");
        assert_eq!(fix(EolLast::new(), never(), "a\n\n").output, "a");
        assert!(lint(EolLast::new(), never(), "a").messages.is_empty());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let linter = treelint_core::Linter::builder()
            .parser(crate::test_support::BraceParser)
            .rule(EolLast::new())
            .build()
            .unwrap();
        let config = treelint_core::Config::parse("[rules]\neol-last = [\"error\", \"sometimes\"]")
            .unwrap();
        let err = linter
            .verify("a", &config, &treelint_core::VerifyOptions::default())
            .unwrap_err();
        assert!(matches!(err.root_cause(), LintError::InvalidOptions { .. }));
    }
}
