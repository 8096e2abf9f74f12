//! Core types for problems, fixes and lint output.

use std::cmp::Ordering;
use std::fmt;

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};

use crate::source::SourceCode;
use crate::stats::PassTimes;
use crate::tree::{Node, Position, TextRange};

/// Severity level of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Should be addressed, does not fail the lint.
    Warning = 1,
    /// Must be fixed.
    Error = 2,
}

impl Severity {
    /// Numeric form: 1 for warnings, 2 for errors.
    #[must_use]
    pub fn as_number(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A text edit: replace `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fix {
    /// Byte range to replace.
    pub range: TextRange,
    /// Replacement text.
    pub text: String,
}

impl Fix {
    /// Replaces a byte range.
    #[must_use]
    pub fn replace_range(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Replaces the text of a node.
    #[must_use]
    pub fn replace_text(node: Node<'_>, text: impl Into<String>) -> Self {
        Self::replace_range(node.range(), text)
    }

    /// Inserts text at a byte offset.
    #[must_use]
    pub fn insert_at(offset: usize, text: impl Into<String>) -> Self {
        Self::replace_range(TextRange::new(offset, offset), text)
    }

    /// Inserts text before a node.
    #[must_use]
    pub fn insert_text_before(node: Node<'_>, text: impl Into<String>) -> Self {
        Self::insert_at(node.range().start, text)
    }

    /// Inserts text after a node.
    #[must_use]
    pub fn insert_text_after(node: Node<'_>, text: impl Into<String>) -> Self {
        Self::insert_at(node.range().end, text)
    }

    /// Removes a byte range.
    #[must_use]
    pub fn remove_range(range: TextRange) -> Self {
        Self::replace_range(range, "")
    }

    /// Removes a node.
    #[must_use]
    pub fn remove(node: Node<'_>) -> Self {
        Self::remove_range(node.range())
    }
}

/// An optional edit offered to the user, never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description.
    pub desc: String,
    /// Message id the description came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// The edit.
    pub fix: Fix,
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Reporting rule, `None` for engine-level problems.
    pub rule_id: Option<String>,
    /// Severity.
    pub severity: Severity,
    /// Final message text.
    pub message: String,
    /// Message id the text came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// End line (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    /// End column (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    /// Kind of the reported node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// True for problems that stop linting, such as parse failures.
    #[serde(default)]
    pub fatal: bool,
    /// Automatic edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    /// Optional edits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

impl Problem {
    /// Creates a problem at a 1-based line and column.
    #[must_use]
    pub fn new(
        rule_id: Option<String>,
        severity: Severity,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            rule_id,
            severity,
            message: message.into(),
            message_id: None,
            line,
            column,
            end_line: None,
            end_column: None,
            node_type: None,
            fatal: false,
            fix: None,
            suggestions: Vec::new(),
        }
    }

    /// Sets the 1-based end position.
    #[must_use]
    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }

    /// Attaches a fix.
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Marks the problem fatal.
    #[must_use]
    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Start as a [`Position`] with a 0-based column.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column.saturating_sub(1))
    }

    /// Orders by line, then column.
    #[must_use]
    pub fn cmp_location(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }

    /// Formats the problem for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{}:{}  {}  {}",
            self.line, self.column, self.severity, self.message
        );
        if let Some(rule) = &self.rule_id {
            let _ = write!(output, "  {rule}");
        }
        for suggestion in &self.suggestions {
            let _ = write!(output, "\n  = suggestion: {}", suggestion.desc);
        }
        output
    }

    /// Builds a miette diagnostic spanning the problem in `source`.
    #[must_use]
    pub fn to_diagnostic(&self, source: &SourceCode) -> ProblemDiagnostic {
        let start = source.offset(self.position()).unwrap_or(0);
        let end = match (self.end_line, self.end_column) {
            (Some(line), Some(column)) => source
                .offset(Position::new(line, column.saturating_sub(1)))
                .unwrap_or(start),
            _ => start,
        };
        ProblemDiagnostic {
            message: self.message.clone(),
            help: self.suggestions.first().map(|s| s.desc.clone()),
            source_code: source.text().to_string(),
            span: SourceSpan::from((start, end.saturating_sub(start))),
            label_message: self
                .rule_id
                .clone()
                .unwrap_or_else(|| self.severity.to_string()),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.line, self.column, self.severity, self.message
        )?;
        if let Some(rule) = &self.rule_id {
            write!(f, " [{rule}]")?;
        }
        Ok(())
    }
}

/// A problem rendered through miette.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ProblemDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[source_code]
    source_code: String,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

/// How a problem was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionKind {
    /// An inline directive comment.
    Directive,
}

/// One reason a problem was hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Mechanism.
    pub kind: SuppressionKind,
    /// Text after `--` in the directive, empty if none.
    pub justification: String,
}

/// A problem hidden by suppression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedProblem {
    /// The hidden problem.
    pub problem: Problem,
    /// Why it was hidden.
    pub suppressions: Vec<Suppression>,
}

/// Result of linting one text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintOutput {
    /// Surfaced problems, ordered by location.
    pub messages: Vec<Problem>,
    /// Problems hidden by directives.
    pub suppressed: Vec<SuppressedProblem>,
    /// Timing of the pass, when stats were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<PassTimes>,
}

impl LintOutput {
    /// Returns true if any surfaced problem is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|p| p.severity == Severity::Error)
    }

    /// Returns true if any surfaced problem is fatal.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.messages.iter().any(|p| p.fatal)
    }

    /// Counts surfaced problems as `(errors, warnings)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize) {
        let errors = self
            .messages
            .iter()
            .filter(|p| p.severity == Severity::Error)
            .count();
        (errors, self.messages.len() - errors)
    }

    /// Counts surfaced problems carrying a fix as `(errors, warnings)`.
    #[must_use]
    pub fn fixable_count(&self) -> (usize, usize) {
        let fixable = self.messages.iter().filter(|p| p.fix.is_some());
        let (errors, warnings): (Vec<&Problem>, Vec<&Problem>) =
            fixable.partition(|p| p.severity == Severity::Error);
        (errors.len(), warnings.len())
    }

    /// Formats surfaced problems as a multi-line report.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for problem in &self.messages {
            let _ = writeln!(report, "  {}", problem.format());
        }
        let (errors, warnings) = self.count_by_severity();
        let _ = write!(
            report,
            "{} problem(s) ({errors} error(s), {warnings} warning(s))",
            self.messages.len()
        );
        let (fix_errors, fix_warnings) = self.fixable_count();
        if fix_errors + fix_warnings > 0 {
            let _ = write!(
                report,
                "\n  {fix_errors} error(s) and {fix_warnings} warning(s) potentially fixable"
            );
        }
        report
    }
}
