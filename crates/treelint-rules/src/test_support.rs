//! A brace language for rule tests: words, `{ }` blocks and C-style comments.

use treelint_core::{
    Comment, CommentKind, Config, FixOptions, FixReport, LineIndex, LintOutput, Linter,
    ParseError, ParsedSource, Rule, RuleConfig, RuleSeverity, SourceLocation, SourceParser,
    TextRange, TreeBuilder, VerifyOptions,
};

pub(crate) struct BraceParser;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Word,
}

impl SourceParser for BraceParser {
    fn language(&self) -> &str {
        "braces"
    }

    fn parse(&self, text: &str) -> Result<ParsedSource, ParseError> {
        let lines = LineIndex::new(text);
        let mut tokens: Vec<(Token, usize, usize)> = Vec::new();
        let mut comments = Vec::new();

        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];
            if rest.starts_with("//") {
                let end = rest.find(['\n', '\r']).map_or(text.len(), |n| i + n);
                comments.push(comment(&lines, CommentKind::Line, &text[i + 2..end], i, end));
                i = end;
            } else if rest.starts_with("/*") {
                let Some(n) = rest[2..].find("*/") else {
                    return Err(ParseError::new("Unterminated comment", lines.position(i)));
                };
                let end = i + n + 4;
                comments.push(comment(&lines, CommentKind::Block, &rest[2..2 + n], i, end));
                i = end;
            } else if rest.starts_with('{') {
                tokens.push((Token::Open, i, i + 1));
                i += 1;
            } else if rest.starts_with('}') {
                tokens.push((Token::Close, i, i + 1));
                i += 1;
            } else if rest.starts_with(char::is_whitespace) {
                i += rest.chars().next().map_or(1, char::len_utf8);
            } else {
                let start = i;
                while i < text.len() {
                    let rest = &text[i..];
                    if rest.starts_with(char::is_whitespace)
                        || rest.starts_with(['{', '}'])
                        || rest.starts_with("//")
                        || rest.starts_with("/*")
                    {
                        break;
                    }
                    i += rest.chars().next().map_or(1, char::len_utf8);
                }
                tokens.push((Token::Word, start, i));
            }
        }

        // end offset of the block opened at each token index
        let mut block_end = vec![0; tokens.len()];
        let mut pending = Vec::new();
        for (index, &(token, start, end)) in tokens.iter().enumerate() {
            match token {
                Token::Open => pending.push(index),
                Token::Close => {
                    let Some(open) = pending.pop() else {
                        return Err(ParseError::new("Unexpected '}'", lines.position(start)));
                    };
                    block_end[open] = end;
                }
                Token::Word => {}
            }
        }
        if let Some(&open) = pending.last() {
            return Err(ParseError::new("Unclosed '{'", lines.position(tokens[open].1)));
        }

        let mut b = TreeBuilder::new(text);
        let root = b.node("Program", 0, text.len()).unwrap();
        let mut parents = vec![root];
        for (index, &(token, start, end)) in tokens.iter().enumerate() {
            let parent = *parents.last().unwrap();
            match token {
                Token::Open => {
                    let block = b.node("Block", start, block_end[index]).unwrap();
                    b.push(parent, "body", block).unwrap();
                    parents.push(block);
                }
                Token::Close => {
                    parents.pop();
                }
                Token::Word => {
                    let word = b.node("Word", start, end).unwrap();
                    b.set_attr(word, "name", &text[start..end]);
                    b.push(parent, "body", word).unwrap();
                }
            }
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

fn setup<R: Rule + 'static>(rule: R, options: Vec<toml::Value>) -> (Linter, Config) {
    let name = rule.name();
    let linter = Linter::builder()
        .parser(BraceParser)
        .rule(rule)
        .build()
        .unwrap();
    let mut config = RuleConfig::new(RuleSeverity::Error);
    config.options = options;
    (linter, Config::new().rule(name, config))
}

/// Lints `text` with one rule at error severity.
pub(crate) fn lint<R: Rule + 'static>(rule: R, options: Vec<toml::Value>, text: &str) -> LintOutput {
    let (linter, config) = setup(rule, options);
    linter
        .verify(text, &config, &VerifyOptions::default())
        .unwrap()
}

/// Runs the fix loop over `text` with one rule at error severity.
pub(crate) fn fix<R: Rule + 'static>(rule: R, options: Vec<toml::Value>, text: &str) -> FixReport {
    let (linter, config) = setup(rule, options);
    linter
        .verify_and_fix(text, &config, &FixOptions::default())
        .unwrap()
}

/// Parses a TOML inline value, e.g. `{ max = 2 }`.
pub(crate) fn option(source: &str) -> toml::Value {
    let table: toml::Table = toml::from_str(&format!("value = {source}")).unwrap();
    table["value"].clone()
}
