//! Turning rule reports into [`Problem`]s.
//!
//! A [`Descriptor`] is what a listener hands to `RuleContext::report`. The
//! [`Report`] resolves message ids, interpolates data, converts locations to
//! 1-based columns, merges multi-part fixes and enforces the rule's declared
//! `fixable` and `has_suggestions` contracts.

use std::collections::BTreeMap;

use crate::context::ActiveRule;
use crate::error::LintError;
use crate::source::SourceCode;
use crate::tree::{Node, Position, SourceLocation, TextRange};
use crate::types::{Fix, Problem, Severity, Suggestion};

/// A report request built by a rule.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    message: Option<String>,
    message_id: Option<String>,
    data: BTreeMap<String, String>,
    node: Option<(String, SourceLocation)>,
    start: Option<Position>,
    end: Option<Position>,
    fixes: Vec<Fix>,
    suggestions: Vec<SuggestionDescriptor>,
}

impl Descriptor {
    /// Starts a report with literal message text.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::default()
        }
    }

    /// Starts a report whose text comes from the rule's `messages`.
    #[must_use]
    pub fn message_id(id: impl Into<String>) -> Self {
        Self {
            message_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets literal message text.
    #[must_use]
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }

    /// Adds a `{{ key }}` placeholder value.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }

    /// Reports at a node. An explicit `loc`/`at` takes precedence for the
    /// position.
    #[must_use]
    pub fn node(mut self, node: Node<'_>) -> Self {
        self.node = Some((node.kind().to_string(), node.loc()));
        self
    }

    /// Reports at an explicit location.
    #[must_use]
    pub fn loc(mut self, loc: SourceLocation) -> Self {
        self.start = Some(loc.start);
        self.end = Some(loc.end);
        self
    }

    /// Reports at a single position.
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.start = Some(position);
        self.end = None;
        self
    }

    /// Attaches a fix.
    #[must_use]
    pub fn fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Attaches several fixes, merged into one edit.
    #[must_use]
    pub fn fixes(mut self, fixes: impl IntoIterator<Item = Fix>) -> Self {
        self.fixes.extend(fixes);
        self
    }

    /// Attaches a suggestion.
    #[must_use]
    pub fn suggest(mut self, suggestion: SuggestionDescriptor) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

/// A suggestion request.
#[derive(Debug, Clone, Default)]
pub struct SuggestionDescriptor {
    desc: Option<String>,
    message_id: Option<String>,
    data: BTreeMap<String, String>,
    fixes: Vec<Fix>,
}

impl SuggestionDescriptor {
    /// Suggestion with literal description.
    #[must_use]
    pub fn desc(text: impl Into<String>) -> Self {
        Self {
            desc: Some(text.into()),
            ..Self::default()
        }
    }

    /// Suggestion described by a message id.
    #[must_use]
    pub fn message_id(id: impl Into<String>) -> Self {
        Self {
            message_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Adds a `{{ key }}` placeholder value.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }

    /// Adds an edit. Suggestions without edits are dropped.
    #[must_use]
    pub fn fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }
}

/// Replaces `{{ key }}` placeholders. Unknown keys stay as written.
#[must_use]
pub fn interpolate(template: &str, data: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let key = after[..close].trim();
                match data.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Problems collected during one lint call.
#[derive(Debug, Default)]
pub struct Report {
    problems: Vec<Problem>,
    disable_fixes: bool,
}

impl Report {
    /// Creates an empty report. With `disable_fixes`, fixes and suggestions
    /// are discarded.
    #[must_use]
    pub fn new(disable_fixes: bool) -> Self {
        Self {
            problems: Vec::new(),
            disable_fixes,
        }
    }

    /// Problems so far, in report order.
    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Consumes the report.
    #[must_use]
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }

    /// Adds a ready-made problem.
    pub fn push(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    /// Adds an engine-level error at a 1-based position.
    pub fn add_error(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.push(Problem::new(None, Severity::Error, message, line, column));
    }

    /// Adds an engine-level warning at a 1-based position.
    pub fn add_warning(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.push(Problem::new(None, Severity::Warning, message, line, column));
    }

    /// Adds a fatal error at a 1-based position.
    pub fn add_fatal(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.push(Problem::new(None, Severity::Error, message, line, column).into_fatal());
    }

    /// Validates a descriptor from `rule` and records the problem.
    ///
    /// # Errors
    ///
    /// See [`crate::RuleContext::report`].
    pub fn add_rule_problem(
        &mut self,
        rule: &ActiveRule,
        descriptor: Descriptor,
        source: &SourceCode,
    ) -> Result<(), LintError> {
        let problem = self.create_problem(rule, descriptor, source)?;
        if problem.fix.is_some() && rule.meta().fixable.is_none() {
            return Err(LintError::UndeclaredFix {
                rule_id: rule.id().to_string(),
            });
        }
        if !problem.suggestions.is_empty() && !rule.meta().has_suggestions {
            return Err(LintError::UndeclaredSuggestions {
                rule_id: rule.id().to_string(),
            });
        }
        self.problems.push(problem);
        Ok(())
    }

    fn create_problem(
        &self,
        rule: &ActiveRule,
        descriptor: Descriptor,
        source: &SourceCode,
    ) -> Result<Problem, LintError> {
        let invalid = |message: String| LintError::InvalidReport {
            rule_id: rule.id().to_string(),
            message,
        };
        let messages = &rule.meta().messages;

        let (message, message_id) = match (descriptor.message, descriptor.message_id) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "report called with a message and a messageId; pass only one".into(),
                ))
            }
            (None, Some(id)) => {
                let template = messages.get(&id).ok_or_else(|| {
                    invalid(format!(
                        "messageId '{id}' is not declared; known ids: [{}]",
                        messages.keys().cloned().collect::<Vec<_>>().join(", ")
                    ))
                })?;
                (interpolate(template, &descriptor.data), Some(id))
            }
            (Some(text), None) => (interpolate(&text, &descriptor.data), None),
            (None, None) => return Err(invalid("missing message or messageId".into())),
        };

        let (start, end) = match (descriptor.start, &descriptor.node) {
            (Some(start), _) => (start, descriptor.end),
            (None, Some((_, loc))) => (loc.start, Some(loc.end)),
            (None, None) => {
                return Err(invalid(
                    "a node or a location must be provided when reporting".into(),
                ))
            }
        };

        let mut problem = Problem::new(
            Some(rule.id().to_string()),
            rule.severity(),
            message,
            start.line,
            start.column + 1,
        );
        problem.message_id = message_id;
        problem.node_type = descriptor.node.map(|(kind, _)| kind);
        if let Some(end) = end {
            problem = problem.with_end(end.line, end.column + 1);
        }

        if self.disable_fixes {
            return Ok(problem);
        }

        problem.fix = merge_fixes(descriptor.fixes, source).map_err(invalid)?;
        for suggestion in descriptor.suggestions {
            let desc = match (&suggestion.desc, &suggestion.message_id) {
                (Some(desc), _) => interpolate(desc, &suggestion.data),
                (None, Some(id)) => {
                    let template = messages.get(id).ok_or_else(|| {
                        invalid(format!("suggestion messageId '{id}' is not declared"))
                    })?;
                    interpolate(template, &suggestion.data)
                }
                (None, None) => {
                    return Err(invalid(
                        "suggestion needs either a description or a messageId".into(),
                    ))
                }
            };
            if let Some(fix) = merge_fixes(suggestion.fixes, source).map_err(invalid)? {
                problem.suggestions.push(Suggestion {
                    desc,
                    message_id: suggestion.message_id,
                    fix,
                });
            }
        }
        Ok(problem)
    }
}

/// Merges the fixes of one report into a single edit.
///
/// # Errors
///
/// Returns a message if a range is invalid or two fixes overlap.
pub fn merge_fixes(mut fixes: Vec<Fix>, source: &SourceCode) -> Result<Option<Fix>, String> {
    let text = source.text();
    for fix in &fixes {
        let TextRange { start, end } = fix.range;
        if start > end
            || end > text.len()
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            return Err(format!(
                "fix range {start}..{end} is not valid for a text of {} bytes",
                text.len()
            ));
        }
    }
    if fixes.len() <= 1 {
        return Ok(fixes.pop());
    }

    fixes.sort_by_key(|f| (f.range.start, f.range.end));
    let start = fixes[0].range.start;
    let end = fixes.iter().map(|f| f.range.end).max().unwrap_or(start);
    let mut merged = String::new();
    let mut last = start;
    for fix in &fixes {
        if fix.range.start < last {
            return Err("Fix objects must not be overlapped in a report.".into());
        }
        merged.push_str(&text[last..fix.range.start]);
        merged.push_str(&fix.text);
        last = fix.range.end;
    }
    merged.push_str(&text[last..end]);
    Ok(Some(Fix::replace_range(TextRange::new(start, end), merged)))
}
