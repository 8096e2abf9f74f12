//! Traversal and listener dispatch through a full lint call.

mod support;

use std::sync::{Arc, Mutex};

use support::{linter, NoWord, Recorder};
use treelint_core::{
    Config, CreateContext, LintError, Listeners, Rule, RuleSeverity, Severity, VerifyOptions,
    END_OF_FILE,
};

fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn listeners_fire_in_specificity_order() {
    let log = log();
    let recorder = Recorder::new("recorder", &log)
        .on("attr", "Identifier[name='a']")
        .on("child", "Statement > Identifier")
        .on("ident", "Identifier")
        .on("any", "*")
        .on("exit", "Statement:exit");
    let linter = linter(vec![Box::new(recorder)]);
    let config = Config::new().rule("recorder", RuleSeverity::Error);

    linter
        .verify("a b", &config, &VerifyOptions::default())
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        [
            "any:Program",
            "any:Statement",
            "any:Identifier",
            "ident:Identifier",
            "child:Identifier",
            "attr:Identifier",
            "any:Identifier",
            "ident:Identifier",
            "child:Identifier",
            "exit:Statement",
        ]
    );
}

#[test]
fn same_selector_listeners_run_in_rule_order() {
    let log = log();
    let first = Recorder::new("a-first", &log).on("first", "Identifier");
    let second = Recorder::new("b-second", &log).on("second", "Identifier");
    let linter = linter(vec![Box::new(second), Box::new(first)]);
    let config = Config::new()
        .rule("a-first", RuleSeverity::Warn)
        .rule("b-second", RuleSeverity::Warn);

    linter
        .verify("x", &config, &VerifyOptions::default())
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        ["first:Identifier", "second:Identifier"]
    );
}

struct AncestorProbe {
    log: Arc<Mutex<Vec<String>>>,
}

impl Rule for AncestorProbe {
    fn name(&self) -> &'static str {
        "ancestor-check"
    }

    fn code(&self) -> &'static str {
        "T100"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let enter = Arc::clone(&self.log);
        let exit = Arc::clone(&self.log);
        let eof = Arc::clone(&self.log);
        Ok(Listeners::new()
            .on("Identifier", move |ctx, _node| {
                let kinds: Vec<&str> = ctx.ancestors().iter().map(|n| n.kind()).collect();
                enter.lock().unwrap().push(format!("enter {}", kinds.join(">")));
                Ok(())
            })
            .on("Identifier:exit", move |ctx, _node| {
                let kinds: Vec<&str> = ctx.ancestors().iter().map(|n| n.kind()).collect();
                exit.lock().unwrap().push(format!("exit {}", kinds.join(">")));
                Ok(())
            })
            .on_call(END_OF_FILE, move |ctx, args| {
                eof.lock()
                    .unwrap()
                    .push(format!("eof {} {}", args[0], ctx.ancestors().len()));
                Ok(())
            }))
    }
}

#[test]
fn enter_and_exit_see_strict_ancestors_and_calls_see_none() {
    let log = log();
    let linter = linter(vec![Box::new(AncestorProbe {
        log: Arc::clone(&log),
    })]);
    let config = Config::new().rule("ancestor-check", RuleSeverity::Error);

    linter
        .verify("a\nb", &config, &VerifyOptions::default())
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        [
            "enter Program>Statement",
            "exit Program>Statement",
            "enter Program>Statement",
            "exit Program>Statement",
            "eof 2 0",
        ]
    );
}

struct Boom;

impl Rule for Boom {
    fn name(&self) -> &'static str {
        "boom"
    }

    fn code(&self) -> &'static str {
        "T101"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        Ok(Listeners::new().on("Identifier[name='x']", |_ctx, _node| {
            Err(LintError::custom("boom"))
        }))
    }
}

#[test]
fn listener_errors_abort_with_rule_and_node_context() {
    let linter = linter(vec![Box::new(Boom)]);
    let config = Config::new().rule("boom", RuleSeverity::Error);

    let err = linter
        .verify("a\n  x", &config, &VerifyOptions::default())
        .unwrap_err();

    assert!(matches!(
        &err,
        LintError::AtNode { node_type, line: 2, column: 3, .. } if node_type == "Identifier"
    ));
    assert!(matches!(
        &err,
        LintError::AtNode { source, .. } if matches!(**source, LintError::InRule { .. })
    ));
    assert!(matches!(err.root_cause(), LintError::Custom(m) if m == "boom"));
    assert_eq!(
        err.to_string(),
        "boom\nRule: \"boom\"\nOccurred while visiting Identifier at 2:3"
    );
}

#[test]
fn problems_carry_rule_severity_and_location() {
    let linter = linter(vec![Box::new(NoWord {
        name: "no-x",
        word: "x",
    })]);
    let config = Config::new().rule("no-x", RuleSeverity::Warn);

    let output = linter
        .verify("a x\nx", &config, &VerifyOptions::default())
        .unwrap();

    let locations: Vec<_> = output.messages.iter().map(|p| (p.line, p.column)).collect();
    assert_eq!(locations, [(1, 3), (2, 1)]);
    let first = &output.messages[0];
    assert_eq!(first.rule_id.as_deref(), Some("no-x"));
    assert_eq!(first.severity, Severity::Warning);
    assert_eq!(first.message, "Unexpected 'x'.");
    assert_eq!(first.node_type.as_deref(), Some("Identifier"));
    assert_eq!((first.end_line, first.end_column), (Some(1), Some(4)));
}

#[test]
fn invalid_selectors_abort_the_lint() {
    let log = log();
    let recorder = Recorder::new("recorder", &log).on("bad", "Identifier[");
    let linter = linter(vec![Box::new(recorder)]);
    let config = Config::new().rule("recorder", RuleSeverity::Error);

    let err = linter
        .verify("a", &config, &VerifyOptions::default())
        .unwrap_err();
    assert!(matches!(err, LintError::InvalidSelector { .. }));
}

#[test]
fn linters_are_shared_across_threads() {
    let linter = linter(vec![Box::new(NoWord {
        name: "no-x",
        word: "x",
    })]);
    let config = Config::new().rule("no-x", RuleSeverity::Error);

    let counts: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let (linter, config) = (&linter, &config);
                s.spawn(move || {
                    let text = vec!["x"; n].join("\n");
                    linter
                        .verify(&text, config, &VerifyOptions::default())
                        .unwrap()
                        .messages
                        .len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counts, [1, 2, 3, 4]);
}
