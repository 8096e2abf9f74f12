//! Rule to flag comments such as `TODO` and `FIXME`.
//!
//! # Configuration
//!
//! - `terms`: Words to look for, case-insensitive (default: `todo`, `fixme`, `xxx`)
//! - `location`: `"start"` to match only at the start of a comment, or
//!   `"anywhere"` (default: `"start"`)
//!
//! Each problem suggests deleting the comment.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use treelint_core::{
    Comment, CreateContext, Descriptor, Fix, LintError, Listeners, Rule, RuleMeta, Severity,
    SuggestionDescriptor, END_OF_FILE,
};

/// Rule code for no-warning-comments.
pub const CODE: &str = "TL003";

/// Rule name for no-warning-comments.
pub const NAME: &str = "no-warning-comments";

const DEFAULT_TERMS: &[&str] = &["todo", "fixme", "xxx"];
const MAX_EXCERPT: usize = 40;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Location {
    #[default]
    Start,
    Anywhere,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Options {
    terms: Vec<String>,
    location: Location,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.iter().map(ToString::to_string).collect(),
            location: Location::Start,
        }
    }
}

/// Flags warning terms in comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWarningComments;

impl NoWarningComments {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn term_pattern(term: &str, location: Location) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(term.trim());
    // only bound the term on sides that are word characters
    let prefix = if term.trim().starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    let suffix = if term.trim().ends_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    let pattern = match location {
        Location::Start => format!(r"^\s*{escaped}{suffix}"),
        Location::Anywhere => format!(r"{prefix}{escaped}{suffix}"),
    };
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

fn excerpt(comment: &Comment) -> String {
    let mut shown = String::new();
    for word in comment.value.split_whitespace() {
        let extra = usize::from(!shown.is_empty()) + word.chars().count();
        if shown.chars().count() + extra > MAX_EXCERPT {
            shown.push_str("...");
            return shown;
        }
        if !shown.is_empty() {
            shown.push(' ');
        }
        shown.push_str(word);
    }
    shown
}

impl Rule for NoWarningComments {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Flags warning terms such as TODO in comments"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new()
            .with_suggestions()
            .message(
                "unexpectedComment",
                "Unexpected '{{ matchedTerm }}' comment: '{{ comment }}'.",
            )
            .message("removeComment", "Remove this comment.")
    }

    fn create<'a>(&'a self, ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let options: Options = ctx.option(0)?;
        let patterns = options
            .terms
            .iter()
            .filter(|term| !term.trim().is_empty())
            .map(|term| {
                term_pattern(term, options.location)
                    .map(|re| (term.clone(), re))
                    .map_err(|e| LintError::InvalidOptions {
                        rule_id: ctx.id().to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Listeners::new().on_call(END_OF_FILE, move |ctx, _args| {
            let source = ctx.source_code();
            for comment in source.comments() {
                let Some((term, _)) = patterns.iter().find(|(_, re)| re.is_match(&comment.value))
                else {
                    continue;
                };
                ctx.report(
                    Descriptor::message_id("unexpectedComment")
                        .data("matchedTerm", term)
                        .data("comment", excerpt(comment))
                        .loc(comment.loc)
                        .suggest(
                            SuggestionDescriptor::message_id("removeComment")
                                .fix(Fix::remove_range(comment.range)),
                        ),
                )?;
            }
            Ok(())
        }))
    }
}
