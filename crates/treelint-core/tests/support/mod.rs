//! A tiny word language and a few rules for integration tests.
//!
//! Every non-blank line becomes a `Statement` in the `body` of a `Program`;
//! every whitespace-separated word becomes an `Identifier` with a `name`
//! attribute. `//` and `/* */` comments are collected, not parsed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use treelint_core::{
    Comment, CommentKind, CreateContext, Descriptor, Fix, FixableKind, LineIndex, LintError,
    Linter, Listeners, ParseError, ParsedSource, Rule, RuleMeta, SourceLocation, SourceParser,
    TextRange, TreeBuilder,
};

pub struct WordParser;

impl SourceParser for WordParser {
    fn language(&self) -> &str {
        "words"
    }

    fn parse(&self, text: &str) -> Result<ParsedSource, ParseError> {
        let lines = LineIndex::new(text);
        let mut comments = Vec::new();
        let mut words: Vec<(usize, usize)> = Vec::new();

        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];
            if rest.starts_with("//") {
                let end = rest.find(['\n', '\r']).map_or(text.len(), |n| i + n);
                comments.push(comment(&lines, CommentKind::Line, &text[i + 2..end], i, end));
                i = end;
            } else if rest.starts_with("/*") {
                let Some(n) = rest[2..].find("*/") else {
                    return Err(ParseError::new(
                        "Unterminated comment",
                        lines.position(i),
                    ));
                };
                let end = i + 2 + n + 2;
                comments.push(comment(&lines, CommentKind::Block, &rest[2..2 + n], i, end));
                i = end;
            } else if rest.starts_with(char::is_whitespace) {
                i += rest.chars().next().map_or(1, char::len_utf8);
            } else {
                let start = i;
                while i < text.len() {
                    let rest = &text[i..];
                    if rest.starts_with(char::is_whitespace)
                        || rest.starts_with("//")
                        || rest.starts_with("/*")
                    {
                        break;
                    }
                    i += rest.chars().next().map_or(1, char::len_utf8);
                }
                words.push((start, i));
            }
        }

        let mut b = TreeBuilder::new(text);
        let root = b.node("Program", 0, text.len()).unwrap();
        let mut index = 0;
        while index < words.len() {
            let line = lines.position(words[index].0).line;
            let group: Vec<(usize, usize)> = words[index..]
                .iter()
                .take_while(|(s, _)| lines.position(*s).line == line)
                .copied()
                .collect();
            index += group.len();

            let start = group[0].0;
            let end = group[group.len() - 1].1;
            let statement = b.node("Statement", start, end).unwrap();
            for (s, e) in group {
                let word = b.node("Identifier", s, e).unwrap();
                b.set_attr(word, "name", &text[s..e]);
                b.push(statement, "words", word).unwrap();
            }
            b.push(root, "body", statement).unwrap();
        }

        Ok(ParsedSource {
            tree: b.finish(root).unwrap(),
            comments,
        })
    }
}

fn comment(lines: &LineIndex, kind: CommentKind, value: &str, start: usize, end: usize) -> Comment {
    Comment {
        kind,
        value: value.to_string(),
        range: TextRange::new(start, end),
        loc: SourceLocation::new(lines.position(start), lines.position(end)),
    }
}

/// Reports every occurrence of one word.
pub struct NoWord {
    pub name: &'static str,
    pub word: &'static str,
}

impl Rule for NoWord {
    fn name(&self) -> &'static str {
        self.name
    }

    fn code(&self) -> &'static str {
        "T001"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let selector = format!("Identifier[name='{}']", self.word);
        Ok(Listeners::new().on(selector, move |ctx, node| {
            ctx.report(Descriptor::message(format!("Unexpected '{}'.", self.word)).node(node))
        }))
    }
}

/// Rewrites one word into another.
pub struct Rewrite {
    pub name: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

impl Rule for Rewrite {
    fn name(&self) -> &'static str {
        self.name
    }

    fn code(&self) -> &'static str {
        "T002"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new()
            .fixable(FixableKind::Code)
            .message("rewrite", "Use '{{ to }}' instead of '{{ from }}'.")
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let selector = format!("Identifier[name='{}']", self.from);
        Ok(Listeners::new().on(selector, move |ctx, node| {
            ctx.report(
                Descriptor::message_id("rewrite")
                    .data("from", self.from)
                    .data("to", self.to)
                    .node(node)
                    .fix(Fix::replace_text(node, self.to)),
            )
        }))
    }
}

/// Records every listener call as `label:kind`.
pub struct Recorder {
    pub name: &'static str,
    pub selectors: Vec<(&'static str, &'static str)>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            selectors: Vec::new(),
            log: Arc::clone(log),
        }
    }

    pub fn on(mut self, label: &'static str, selector: &'static str) -> Self {
        self.selectors.push((label, selector));
        self
    }
}

impl Rule for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn code(&self) -> &'static str {
        "T003"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        let mut listeners = Listeners::new();
        for &(label, selector) in &self.selectors {
            let log = Arc::clone(&self.log);
            listeners = listeners.on(selector, move |_ctx, node| {
                log.lock().unwrap().push(format!("{label}:{}", node.kind()));
                Ok(())
            });
        }
        Ok(listeners)
    }
}

/// Reports a fix without declaring itself fixable.
pub struct SneakyFix;

impl Rule for SneakyFix {
    fn name(&self) -> &'static str {
        "sneaky-fix"
    }

    fn code(&self) -> &'static str {
        "T004"
    }

    fn create<'a>(&'a self, _ctx: &CreateContext<'a>) -> Result<Listeners<'a>, LintError> {
        Ok(Listeners::new().on("Identifier", |ctx, node| {
            ctx.report(
                Descriptor::message("sneaky")
                    .node(node)
                    .fix(Fix::remove(node)),
            )
        }))
    }
}

/// A linter over [`WordParser`] with the given rules.
pub fn linter(rules: Vec<Box<dyn Rule>>) -> Linter {
    Linter::builder()
        .parser(WordParser)
        .rules(rules)
        .build()
        .unwrap()
}
