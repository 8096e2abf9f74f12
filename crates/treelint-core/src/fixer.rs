//! Applying fixes to text.

use std::fmt;
use std::sync::Arc;

use crate::types::Problem;

const BOM: char = '\u{feff}';

/// Which fixes to apply.
#[derive(Clone, Default)]
pub enum FixFilter {
    /// Every fix.
    #[default]
    All,
    /// No fix; the text is returned unchanged.
    None,
    /// Fixes whose problem passes the predicate.
    Custom(Arc<dyn Fn(&Problem) -> bool + Send + Sync>),
}

impl FixFilter {
    /// Wraps a predicate.
    #[must_use]
    pub fn custom(predicate: impl Fn(&Problem) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Whether the fix of `problem` may be applied.
    #[must_use]
    pub fn allows(&self, problem: &Problem) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Custom(predicate) => predicate(problem),
        }
    }
}

impl fmt::Debug for FixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::None => write!(f, "None"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Result of one round of fixing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedText {
    /// Whether any fix was applied.
    pub fixed: bool,
    /// The rewritten text.
    pub output: String,
    /// Problems whose fix was not applied, or that had none.
    pub remaining: Vec<Problem>,
}

/// Applies the fixes carried by problems.
pub trait FixApplier: Send + Sync {
    /// Applies non-overlapping fixes from `messages` to `text`.
    fn apply(&self, text: &str, messages: &[Problem], filter: &FixFilter) -> FixedText;
}

/// Default applier: one left-to-right pass, first fix wins on overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceCodeFixer;

impl FixApplier for SourceCodeFixer {
    fn apply(&self, text: &str, messages: &[Problem], filter: &FixFilter) -> FixedText {
        if matches!(filter, FixFilter::None) {
            return FixedText {
                fixed: false,
                output: text.to_string(),
                remaining: messages.to_vec(),
            };
        }

        let (bom, body) = match text.strip_prefix(BOM) {
            Some(body) => (BOM.len_utf8(), body),
            None => (0, text),
        };

        let mut remaining = Vec::new();
        let mut fixes = Vec::new();
        for problem in messages {
            if problem.fix.is_some() && filter.allows(problem) {
                fixes.push(problem);
            } else {
                remaining.push(problem.clone());
            }
        }
        fixes.sort_by_key(|p| p.fix.as_ref().map(|f| (f.range.start, f.range.end)));

        let mut output = String::with_capacity(text.len());
        output.push_str(&text[..bom]);
        let mut last_end: Option<usize> = None;
        let mut copied = 0;
        let mut fixed = false;
        for problem in fixes {
            let Some(fix) = &problem.fix else { continue };
            let (start, end) = (fix.range.start, fix.range.end);
            let overlaps = last_end.is_some_and(|last| last >= start);
            let valid = start <= end
                && end <= body.len()
                && body.is_char_boundary(start)
                && body.is_char_boundary(end);
            if overlaps || !valid {
                remaining.push(problem.clone());
                continue;
            }
            output.push_str(&body[copied..start]);
            output.push_str(&fix.text);
            copied = end;
            last_end = Some(end);
            fixed = true;
        }
        output.push_str(&body[copied..]);
        remaining.sort_by(Problem::cmp_location);

        FixedText {
            fixed,
            output,
            remaining,
        }
    }
}
