//! Inline directive comments.
//!
//! Supports comments like:
//! ```text
//! /* treelint-disable no-trailing-spaces, max-depth -- generated code */
//! /* treelint-enable */
//! // treelint-disable-line eol-last
//! // treelint-disable-next-line
//! ```
//!
//! `disable` and `enable` are only read from block comments; the line
//! scoped kinds are read from either comment kind.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::LintError;
use crate::source::{Comment, CommentKind, SourceCode};
use crate::tree::{SourceLocation, TextRange};
use crate::types::{Problem, Severity};

const PREFIX: &str = "treelint-";

/// The four directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Disables rules from here on.
    Disable,
    /// Re-enables rules from here on.
    Enable,
    /// Disables rules on the comment's own line.
    DisableLine,
    /// Disables rules on the line after the comment.
    DisableNextLine,
}

impl DirectiveKind {
    /// Kind as written after the `treelint-` prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Enable => "enable",
            Self::DisableLine => "disable-line",
            Self::DisableNextLine => "disable-next-line",
        }
    }

    /// True for every kind except `enable`.
    #[must_use]
    pub fn is_disable(self) -> bool {
        self != Self::Enable
    }

    fn allowed_in(self, comment: CommentKind) -> bool {
        comment == CommentKind::Block || matches!(self, Self::DisableLine | Self::DisableNextLine)
    }
}

impl FromStr for DirectiveKind {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(Self::Disable),
            "enable" => Ok(Self::Enable),
            "disable-line" => Ok(Self::DisableLine),
            "disable-next-line" => Ok(Self::DisableNextLine),
            other => Err(LintError::UnrecognizedDirective {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.as_str())
    }
}

/// A rule name inside a directive comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleToken {
    /// Rule name.
    pub id: String,
    /// Byte range of the name in the source text.
    pub range: TextRange,
}

/// The comment a directive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveComment {
    /// Comment flavour.
    pub kind: CommentKind,
    /// Directive kind.
    pub directive: DirectiveKind,
    /// Comment text between the delimiters.
    pub value: String,
    /// Byte range of the whole comment.
    pub range: TextRange,
    /// Location of the whole comment.
    pub loc: SourceLocation,
    /// Every rule listed, known or not, in order of appearance.
    pub rules: Vec<RuleToken>,
}

/// One directive for one rule (or for all rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive kind.
    pub kind: DirectiveKind,
    /// Targeted rule, `None` for all rules.
    pub rule_id: Option<String>,
    /// Line (1-indexed).
    pub line: usize,
    /// Column (1-indexed).
    pub column: usize,
    /// Text after `--`, empty if none.
    pub justification: String,
    /// Originating comment. Directives built in code may have none.
    pub comment: Option<Arc<DirectiveComment>>,
}

impl Directive {
    /// Creates a directive at a 1-based position.
    #[must_use]
    pub fn new(kind: DirectiveKind, rule_id: Option<&str>, line: usize, column: usize) -> Self {
        Self {
            kind,
            rule_id: rule_id.map(str::to_string),
            line,
            column,
            justification: String::new(),
            comment: None,
        }
    }

    /// Sets the justification.
    #[must_use]
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = justification.into();
        self
    }

    /// Attaches the originating comment.
    #[must_use]
    pub fn with_comment(mut self, comment: Arc<DirectiveComment>) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Directives found in a text, plus problems about malformed ones.
#[derive(Debug, Clone, Default)]
pub struct DirectiveExtraction {
    /// Directives in comment order.
    pub directives: Vec<Directive>,
    /// Errors such as unknown rule names.
    pub problems: Vec<Problem>,
}

struct Parsed {
    directive: DirectiveKind,
    // offsets relative to the comment value
    rules: Vec<(usize, usize)>,
    justification: String,
}

/// Reads the directive, if any, in a comment value.
fn parse_comment_value(value: &str) -> Option<Parsed> {
    let body = value.trim_start();
    let body_start = value.len() - body.len();
    let rest = body.strip_prefix(PREFIX)?;
    let kind_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let directive: DirectiveKind = rest[..kind_len].parse().ok()?;

    let list_start = body_start + PREFIX.len() + kind_len;
    let (list_end, justification) = split_justification(value, list_start);

    let mut rules = Vec::new();
    let mut offset = list_start;
    for part in value[list_start..list_end].split(',') {
        let trimmed = part.trim_start();
        let start = offset + (part.len() - trimmed.len());
        let trimmed = trimmed.trim_end();
        if !trimmed.is_empty() {
            rules.push((start, start + trimmed.len()));
        }
        offset += part.len() + 1;
    }
    Some(Parsed {
        directive,
        rules,
        justification,
    })
}

/// Finds a whitespace-delimited run of two or more dashes after `from`.
/// Returns where the rule list ends and the trimmed justification.
fn split_justification(value: &str, from: usize) -> (usize, String) {
    let bytes = value.as_bytes();
    let mut i = from.max(1);
    while i < bytes.len() {
        if bytes[i] == b'-' && bytes[i - 1].is_ascii_whitespace() {
            let mut j = i;
            while j < bytes.len() && bytes[j] == b'-' {
                j += 1;
            }
            if j - i >= 2 && j < bytes.len() && bytes[j].is_ascii_whitespace() {
                return (i - 1, value[j..].trim().to_string());
            }
            i = j;
        } else {
            i += 1;
        }
    }
    (value.len(), String::new())
}

fn value_offset(source: &SourceCode, comment: &Comment) -> usize {
    let text = source.slice(comment.range);
    text.find(comment.value.as_str())
        .map_or(comment.range.start + 2, |i| comment.range.start + i)
}

fn problem_at(rule_id: Option<String>, severity: Severity, message: String, loc: SourceLocation) -> Problem {
    Problem::new(rule_id, severity, message, loc.start.line, loc.start.column + 1)
        .with_end(loc.end.line, loc.end.column + 1)
}

/// Extracts directives from every comment of `source`.
///
/// `is_known` decides whether a listed rule exists; unknown rules produce
/// a `Definition for rule '...' was not found.` error and no directive.
pub fn collect_directives(
    source: &SourceCode,
    is_known: impl Fn(&str) -> bool,
) -> DirectiveExtraction {
    let mut out = DirectiveExtraction::default();
    for comment in source.comments() {
        let Some(parsed) = parse_comment_value(&comment.value) else {
            continue;
        };
        if !parsed.directive.allowed_in(comment.kind) {
            continue;
        }
        if parsed.directive == DirectiveKind::DisableLine
            && comment.loc.start.line != comment.loc.end.line
        {
            out.problems.push(problem_at(
                None,
                Severity::Error,
                format!("{} comment should not span multiple lines.", parsed.directive),
                comment.loc,
            ));
            continue;
        }

        let base = value_offset(source, comment);
        let mut rules: Vec<RuleToken> = Vec::new();
        for (start, end) in parsed.rules {
            let id = &comment.value[start..end];
            if rules.iter().all(|r| r.id != id) {
                rules.push(RuleToken {
                    id: id.to_string(),
                    range: TextRange::new(base + start, base + end),
                });
            }
        }
        let shared = Arc::new(DirectiveComment {
            kind: comment.kind,
            directive: parsed.directive,
            value: comment.value.clone(),
            range: comment.range,
            loc: comment.loc,
            rules,
        });

        let anchor = if parsed.directive == DirectiveKind::DisableNextLine {
            comment.loc.end
        } else {
            comment.loc.start
        };
        let make = |rule_id: Option<&str>| {
            Directive::new(parsed.directive, rule_id, anchor.line, anchor.column + 1)
                .with_justification(parsed.justification.clone())
                .with_comment(Arc::clone(&shared))
        };

        if shared.rules.is_empty() {
            out.directives.push(make(None));
            continue;
        }
        for token in &shared.rules {
            if is_known(&token.id) {
                out.directives.push(make(Some(&token.id)));
            } else {
                out.problems.push(problem_at(
                    Some(token.id.clone()),
                    Severity::Error,
                    format!("Definition for rule '{}' was not found.", token.id),
                    comment.loc,
                ));
            }
        }
    }
    out
}

/// Warnings for directive comments when inline configuration is disabled.
#[must_use]
pub fn inline_config_warnings(source: &SourceCode) -> Vec<Problem> {
    source
        .comments()
        .iter()
        .filter(|c| parse_comment_value(&c.value).is_some_and(|p| p.directive.allowed_in(c.kind)))
        .map(|c| {
            problem_at(
                None,
                Severity::Warning,
                format!(
                    "'{}' has no effect because you have 'no_inline_config' setting in your config.",
                    source.slice(c.range)
                ),
                c.loc,
            )
        })
        .collect()
}
