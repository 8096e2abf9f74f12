//! Filtering problems through directive comments.
//!
//! Block directives (`disable`/`enable`) are applied first, then the line
//! scoped ones, each stage by the same location-ordered sweep. Directives
//! that hid nothing can be reported back as problems with a removal fix.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::ReportUnused;
use crate::directive::{Directive, DirectiveComment, DirectiveKind};
use crate::tree::TextRange;
use crate::types::{Fix, Problem, SuppressedProblem, Suppression, SuppressionKind};

/// Input of [`apply_disable_directives`].
#[derive(Debug)]
pub struct SuppressionInput<'a> {
    /// Problems, ordered by location.
    pub problems: Vec<Problem>,
    /// Directives in any order.
    pub directives: &'a [Directive],
    /// Whether and how unused directives are reported.
    pub report_unused: ReportUnused,
    /// Leave unused-directive problems without fixes.
    pub disable_fixes: bool,
    /// The linted text, used to compute removal fixes.
    pub text: &'a str,
}

/// Output of [`apply_disable_directives`].
#[derive(Debug, Clone, Default)]
pub struct SuppressionResult {
    /// Surviving problems plus unused-directive problems.
    pub problems: Vec<Problem>,
    /// Problems hidden by a directive.
    pub suppressed: Vec<SuppressedProblem>,
}

#[derive(Debug, Clone, Copy)]
struct Marker<'d> {
    disable: bool,
    rule_id: Option<&'d str>,
    line: usize,
    column: usize,
    origin: usize,
}

/// Applies `directives` to `problems`.
#[must_use]
pub fn apply_disable_directives(input: SuppressionInput<'_>) -> SuppressionResult {
    let SuppressionInput {
        problems,
        directives,
        report_unused,
        disable_fixes,
        text,
    } = input;

    let mut block = Vec::new();
    let mut line = Vec::new();
    for (origin, d) in directives.iter().enumerate() {
        let marker = |disable, at_line, column| Marker {
            disable,
            rule_id: d.rule_id.as_deref(),
            line: at_line,
            column,
            origin,
        };
        match d.kind {
            DirectiveKind::Disable => block.push(marker(true, d.line, d.column)),
            DirectiveKind::Enable => block.push(marker(false, d.line, d.column)),
            DirectiveKind::DisableLine => {
                line.push(marker(true, d.line, 1));
                line.push(marker(false, d.line + 1, 0));
            }
            DirectiveKind::DisableNextLine => {
                line.push(marker(true, d.line + 1, 1));
                line.push(marker(false, d.line + 2, 0));
            }
        }
    }
    block.sort_by_key(|m| (m.line, m.column));
    line.sort_by_key(|m| (m.line, m.column));

    let mut used = vec![false; directives.len()];
    let mut suppressed = Vec::new();
    let survivors = sweep(problems, &block, directives, &mut used, &mut suppressed);
    let mut kept = sweep(survivors, &line, directives, &mut used, &mut suppressed);

    let Some(severity) = report_unused.to_severity() else {
        return SuppressionResult {
            problems: kept,
            suppressed,
        };
    };

    let unused: Vec<usize> = (0..directives.len())
        .filter(|&i| directives[i].kind.is_disable() && !used[i])
        .collect();
    debug!(unused = unused.len(), "unused disable directives");

    // unused rule ids, per comment
    let mut unused_ids: HashMap<*const DirectiveComment, HashSet<&str>> = HashMap::new();
    for &i in &unused {
        if let (Some(comment), Some(rule)) = (&directives[i].comment, &directives[i].rule_id) {
            unused_ids
                .entry(Arc::as_ptr(comment))
                .or_default()
                .insert(rule.as_str());
        }
    }

    for &i in &unused {
        let directive = &directives[i];
        let message = match &directive.rule_id {
            Some(rule) => format!(
                "Unused treelint-disable directive (no problems were reported from '{rule}')."
            ),
            None => "Unused treelint-disable directive (no problems were reported).".to_string(),
        };
        let mut problem = Problem::new(None, severity, message, directive.line, directive.column);
        if !disable_fixes {
            if let Some(comment) = &directive.comment {
                let unused_here = unused_ids.get(&Arc::as_ptr(comment));
                let remaining = comment
                    .rules
                    .iter()
                    .any(|r| unused_here.map_or(true, |ids| !ids.contains(r.id.as_str())));
                problem.fix = Some(match (&directive.rule_id, remaining) {
                    (Some(rule), true) => rule_removal(comment, rule, text),
                    _ => comment_removal(comment.range, text),
                });
            }
        }
        kept.push(problem);
    }
    kept.sort_by(Problem::cmp_location);

    SuppressionResult {
        problems: kept,
        suppressed,
    }
}

/// One pass over location-sorted problems with a single directive cursor.
fn sweep(
    mut problems: Vec<Problem>,
    markers: &[Marker<'_>],
    directives: &[Directive],
    used: &mut [bool],
    suppressed: &mut Vec<SuppressedProblem>,
) -> Vec<Problem> {
    problems.sort_by(Problem::cmp_location);

    let mut next = 0;
    let mut global: Option<usize> = None;
    let mut disabled: HashMap<&str, usize> = HashMap::new();
    let mut enabled: HashSet<&str> = HashSet::new();
    let mut kept = Vec::with_capacity(problems.len());

    for problem in problems {
        while let Some(marker) = markers.get(next) {
            if (marker.line, marker.column) > (problem.line, problem.column) {
                break;
            }
            next += 1;
            match (marker.disable, marker.rule_id) {
                (true, None) => {
                    global = Some(marker.origin);
                    disabled.clear();
                    enabled.clear();
                }
                (true, Some(rule)) => {
                    if global.is_some() {
                        enabled.remove(rule);
                    }
                    disabled.insert(rule, marker.origin);
                }
                (false, None) => {
                    global = None;
                    disabled.clear();
                }
                (false, Some(rule)) => {
                    if global.is_some() {
                        enabled.insert(rule);
                    }
                    disabled.remove(rule);
                }
            }
        }

        if problem.fatal {
            kept.push(problem);
            continue;
        }
        let rule = problem.rule_id.as_deref();
        let by = match rule.and_then(|r| disabled.get(r)) {
            Some(&origin) => Some(origin),
            None => global.filter(|_| rule.map_or(true, |r| !enabled.contains(r))),
        };
        match by {
            Some(origin) => {
                used[origin] = true;
                suppressed.push(SuppressedProblem {
                    problem,
                    suppressions: vec![Suppression {
                        kind: SuppressionKind::Directive,
                        justification: directives[origin].justification.clone(),
                    }],
                });
            }
            None => kept.push(problem),
        }
    }
    kept
}

/// Removes one rule name and an adjacent comma from a directive comment.
fn rule_removal(comment: &DirectiveComment, rule: &str, text: &str) -> Fix {
    let Some(index) = comment.rules.iter().position(|r| r.id == rule) else {
        return comment_removal(comment.range, text);
    };
    let token = comment.rules[index].range;
    let range = match (comment.rules.get(index + 1), index.checked_sub(1)) {
        (Some(next), _) => TextRange::new(token.start, next.range.start),
        (None, Some(prev)) => TextRange::new(comment.rules[prev].range.end, token.end),
        (None, None) => return comment_removal(comment.range, text),
    };
    Fix::remove_range(range)
}

/// Removes a whole comment, taking surrounding whitespace with it.
fn comment_removal(range: TextRange, text: &str) -> Fix {
    let is_break = |c: char| c == '\n' || c == '\r';
    let line_start = text[..range.start].rfind(is_break).map_or(0, |i| i + 1);
    let line_end = text[range.end..]
        .find(is_break)
        .map_or(text.len(), |i| range.end + i);
    let before = &text[line_start..range.start];
    let after = &text[range.end..line_end];
    let space_before = before.len() - before.trim_end().len();
    let space_after = after.len() - after.trim_start().len();

    match (before.trim().is_empty(), after.trim().is_empty()) {
        (true, true) => {
            let rest = &text[line_end..];
            let terminator = if rest.starts_with("\r\n") {
                2
            } else {
                usize::from(!rest.is_empty())
            };
            Fix::remove_range(TextRange::new(line_start, line_end + terminator))
        }
        (false, true) => {
            Fix::remove_range(TextRange::new(range.start - space_before, line_end))
        }
        (true, false) => Fix::remove_range(TextRange::new(range.start, range.end + space_after)),
        (false, false) if space_before + space_after > 0 => Fix::replace_range(
            TextRange::new(range.start - space_before, range.end + space_after),
            " ",
        ),
        (false, false) => Fix::remove_range(range),
    }
}
