//! Directive comments and unused-directive reporting through `verify`.

mod support;

use support::{linter, NoWord};
use treelint_core::{
    Config, CreateContext, Descriptor, FixApplier, FixFilter, LintError, Linter, LintOutput,
    Listeners, ReportUnused, Rule, RuleSeverity, Severity, SourceCodeFixer, SuppressionKind,
    TextRange, VerifyOptions, END_OF_FILE,
};

fn word_linter() -> Linter {
    linter(vec![
        Box::new(NoWord {
            name: "no-foo",
            word: "foo",
        }),
        Box::new(NoWord {
            name: "no-bar",
            word: "bar",
        }),
    ])
}

fn config() -> Config {
    Config::new()
        .rule("no-foo", RuleSeverity::Error)
        .rule("no-bar", RuleSeverity::Error)
}

fn lint(text: &str, config: &Config) -> LintOutput {
    word_linter()
        .verify(text, config, &VerifyOptions::default())
        .unwrap()
}

fn summary(output: &LintOutput) -> Vec<String> {
    output
        .messages
        .iter()
        .map(|p| format!("{}@{}:{}", p.rule_id.as_deref().unwrap_or("-"), p.line, p.column))
        .collect()
}

#[test]
fn block_disable_hides_everything_after_it() {
    let output = lint("foo\n/* treelint-disable */\nfoo bar", &config());

    assert_eq!(summary(&output), ["no-foo@1:1"]);
    assert_eq!(output.suppressed.len(), 2);
    let suppression = &output.suppressed[0].suppressions[0];
    assert_eq!(suppression.kind, SuppressionKind::Directive);
    assert_eq!(suppression.justification, "");
}

#[test]
fn enable_reopens_one_rule_under_a_global_disable() {
    let output = lint(
        "/* treelint-disable */ /* treelint-enable no-foo */\nfoo bar",
        &config(),
    );

    assert_eq!(summary(&output), ["no-foo@2:1"]);
    assert_eq!(output.suppressed.len(), 1);
    assert_eq!(
        output.suppressed[0].problem.rule_id.as_deref(),
        Some("no-bar")
    );
}

#[test]
fn rule_disable_and_enable_bracket_a_region() {
    let text = "foo\n/* treelint-disable no-foo */\nfoo bar\n/* treelint-enable no-foo */\nfoo";
    let output = lint(text, &config());

    assert_eq!(summary(&output), ["no-foo@1:1", "no-bar@3:5", "no-foo@5:1"]);
}

#[test]
fn disable_next_line_covers_only_the_following_line() {
    let output = lint(
        "foo\n// treelint-disable-next-line no-foo\nfoo\nfoo",
        &config(),
    );

    assert_eq!(summary(&output), ["no-foo@1:1", "no-foo@4:1"]);
}

#[test]
fn disable_line_covers_its_own_line() {
    let output = lint("foo bar // treelint-disable-line\nfoo", &config());

    assert_eq!(summary(&output), ["no-foo@2:1"]);
}

#[test]
fn line_comments_cannot_hold_block_directives() {
    let output = lint("// treelint-disable\nfoo", &config());

    assert_eq!(summary(&output), ["no-foo@2:1"]);
}

#[test]
fn justification_is_recorded() {
    let output = lint("foo /* treelint-disable-line no-foo -- legacy api */", &config());

    assert!(output.messages.is_empty());
    assert_eq!(
        output.suppressed[0].suppressions[0].justification,
        "legacy api"
    );
}

#[test]
fn unknown_rules_in_directives_are_errors() {
    let output = lint("/* treelint-disable no-such */\nfoo", &config());

    assert_eq!(summary(&output), ["no-such@1:1", "no-foo@2:1"]);
    assert_eq!(
        output.messages[0].message,
        "Definition for rule 'no-such' was not found."
    );
}

#[test]
fn multi_line_disable_line_is_rejected() {
    let output = lint("foo /* treelint-disable-line\n */", &config());

    assert_eq!(summary(&output), ["no-foo@1:1", "-@1:5"]);
    assert_eq!(
        output.messages[1].message,
        "treelint-disable-line comment should not span multiple lines."
    );
}

#[test]
fn unused_global_disable_is_reported_with_a_whole_comment_fix() {
    let text = "/* treelint-disable */";
    let config = config().report_unused_disable_directives(ReportUnused::Error);
    let output = lint(text, &config);

    assert_eq!(output.messages.len(), 1);
    let problem = &output.messages[0];
    assert_eq!(problem.rule_id, None);
    assert_eq!(problem.severity, Severity::Error);
    assert_eq!(
        problem.message,
        "Unused treelint-disable directive (no problems were reported)."
    );
    assert_eq!((problem.line, problem.column), (1, 1));
    let fix = problem.fix.as_ref().unwrap();
    assert_eq!(fix.range, TextRange::new(0, text.len()));
    assert_eq!(fix.text, "");
}

#[test]
fn used_directives_are_not_reported() {
    let config = config().report_unused_disable_directives(ReportUnused::Warn);
    let output = lint("/* treelint-disable */\nfoo", &config);

    assert!(output.messages.is_empty());
    assert_eq!(output.suppressed.len(), 1);
}

#[test]
fn partially_unused_comment_loses_only_the_unused_rule() {
    let text = "/* treelint-disable no-foo, no-bar */\nfoo";
    let config = config().report_unused_disable_directives(ReportUnused::Warn);
    let output = lint(text, &config);

    assert_eq!(output.messages.len(), 1);
    let problem = &output.messages[0];
    assert_eq!(problem.severity, Severity::Warning);
    assert_eq!(
        problem.message,
        "Unused treelint-disable directive (no problems were reported from 'no-bar')."
    );

    let fixed = SourceCodeFixer.apply(text, &output.messages, &FixFilter::All);
    assert_eq!(fixed.output, "/* treelint-disable no-foo */\nfoo");

    let again = lint(&fixed.output, &config);
    assert!(again.messages.is_empty());
    assert_eq!(again.suppressed.len(), 1);
}

#[test]
fn options_override_config_for_unused_reporting() {
    let linter = word_linter();
    let config = config().report_unused_disable_directives(ReportUnused::Error);
    let options = VerifyOptions::new().report_unused_disable_directives(ReportUnused::Off);

    let output = linter
        .verify("/* treelint-disable */", &config, &options)
        .unwrap();
    assert!(output.messages.is_empty());
}

#[test]
fn inline_config_can_be_turned_off() {
    let linter = word_linter();
    let options = VerifyOptions::new().allow_inline_config(false);

    let output = linter
        .verify("/* treelint-disable */\nfoo", &config(), &options)
        .unwrap();
    assert_eq!(summary(&output), ["no-foo@2:1"]);
}

#[test]
fn no_inline_config_warns_about_each_directive() {
    let mut config = config();
    config.linter.no_inline_config = true;
    let output = lint("/* treelint-disable */\nfoo", &config);

    assert_eq!(summary(&output), ["-@1:1", "no-foo@2:1"]);
    assert_eq!(output.messages[0].severity, Severity::Warning);
    assert_eq!(
        output.messages[0].message,
        "'/* treelint-disable */' has no effect because you have 'no_inline_config' setting in your config."
    );
}

#[test]
fn parse_errors_are_never_suppressed() {
    let output = lint("/* treelint-disable */\nfoo /* open", &config());

    assert_eq!(output.messages.len(), 1);
    assert!(output.messages[0].fatal);
    assert_eq!(output.messages[0].message, "Parsing error: Unterminated comment");
    assert_eq!((output.messages[0].line, output.messages[0].column), (2, 5));
}

/// Reports at the start of every comment, so problems share a location with
/// the directives themselves.
struct CommentMarker;

impl Rule for CommentMarker {
    fn name(&self) -> &'static str {
        "comment-marker"
    }

    fn code(&self) -> &'static str {
        "T010"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        Ok(Listeners::new().on_call(END_OF_FILE, |ctx, _args| {
            let starts: Vec<_> = ctx
                .source_code()
                .comments()
                .iter()
                .map(|c| c.loc.start)
                .collect();
            for start in starts {
                ctx.report(Descriptor::message("Comment here.").at(start))?;
            }
            Ok(())
        }))
    }
}

fn marker_lint(text: &str) -> LintOutput {
    let config = Config::new().rule("comment-marker", RuleSeverity::Error);
    linter(vec![Box::new(CommentMarker)])
        .verify(text, &config, &VerifyOptions::default())
        .unwrap()
}

#[test]
fn problem_on_an_enable_comment_is_reported() {
    let output =
        marker_lint("/* treelint-disable comment-marker */\n/* treelint-enable comment-marker */");

    assert_eq!(summary(&output), ["comment-marker@2:1"]);
    assert_eq!(output.suppressed.len(), 1);
    assert_eq!(output.suppressed[0].problem.line, 1);
}

#[test]
fn problem_on_an_enable_under_global_disable_is_reported() {
    let output = marker_lint("/* treelint-disable */ /* treelint-enable comment-marker */");

    assert_eq!(summary(&output), ["comment-marker@1:24"]);
    assert_eq!(output.suppressed.len(), 1);
}
