//! Recursive-descent parser for selector text.

use regex::{Regex, RegexBuilder};

/// Parsed selector syntax.
#[derive(Debug, Clone)]
pub enum SelectorAst {
    /// `*`
    Wildcard,
    /// `Kind`
    Identifier(String),
    /// `[path]` or `[path op value]`
    Attribute {
        /// Dotted lookup path.
        path: Vec<String>,
        /// Comparison, absent for presence checks.
        test: Option<AttributeTest>,
    },
    /// `.a.b`: reached from an ancestor through these field names.
    Field(Vec<String>),
    /// `:nth-child(n)`, `:first-child`
    NthChild(usize),
    /// `:nth-last-child(n)`, `:last-child`
    NthLastChild(usize),
    /// `:name`, resolved by the parser's class matcher.
    Class(String),
    /// `:not(a, b)`
    Not(Vec<SelectorAst>),
    /// `:matches(a, b)`, `:is(a, b)` and top-level `a, b`
    Matches(Vec<SelectorAst>),
    /// `a[b]:c`, every part must match.
    Compound(Vec<SelectorAst>),
    /// `a > b`
    Child(Box<SelectorAst>, Box<SelectorAst>),
    /// `a b`
    Descendant(Box<SelectorAst>, Box<SelectorAst>),
    /// `a ~ b`
    Sibling(Box<SelectorAst>, Box<SelectorAst>),
    /// `a + b`
    Adjacent(Box<SelectorAst>, Box<SelectorAst>),
}

/// Right-hand side of an attribute selector.
#[derive(Debug, Clone)]
pub struct AttributeTest {
    /// Comparison operator.
    pub op: AttributeOp,
    /// Value compared against.
    pub value: AttributeValue,
}

/// Attribute comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Attribute comparison operand.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// Compared as text, or as a number by the ordering operators.
    Literal(String),
    /// `/pattern/flags`
    Regex(Regex),
    /// `type(name)`
    Type(String),
}

/// Where and why parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub position: usize,
    pub message: String,
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses a full selector (no `:exit` suffix).
pub(crate) fn parse(src: &str) -> ParseResult<SelectorAst> {
    let mut parser = Parser { src, pos: 0 };
    parser.skip_ws();
    let ast = parser.selectors()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(ast),
        Some(c) => Err(parser.error(format!("Unexpected character '{c}'"))),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '$')
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn selectors(&mut self) -> ParseResult<SelectorAst> {
        let mut list = vec![self.selector()?];
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if self.eat(',') {
                self.skip_ws();
                list.push(self.selector()?);
            } else {
                self.pos = checkpoint;
                break;
            }
        }
        Ok(if list.len() == 1 {
            list.remove(0)
        } else {
            SelectorAst::Matches(list)
        })
    }

    fn selector(&mut self) -> ParseResult<SelectorAst> {
        let mut left = self.sequence()?;
        loop {
            let checkpoint = self.pos;
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some(c @ ('>' | '~' | '+')) => {
                    self.bump();
                    self.skip_ws();
                    c
                }
                Some(c) if had_ws && Self::starts_sequence(c) => ' ',
                _ => {
                    self.pos = checkpoint;
                    return Ok(left);
                }
            };
            let right = Box::new(self.sequence()?);
            let l = Box::new(left);
            left = match combinator {
                '>' => SelectorAst::Child(l, right),
                '~' => SelectorAst::Sibling(l, right),
                '+' => SelectorAst::Adjacent(l, right),
                _ => SelectorAst::Descendant(l, right),
            };
        }
    }

    fn starts_sequence(c: char) -> bool {
        is_name_char(c) || matches!(c, '*' | '#' | '[' | '.' | ':' | '!')
    }

    fn sequence(&mut self) -> ParseResult<SelectorAst> {
        self.eat('!');
        let mut atoms = Vec::new();
        while let Some(atom) = self.atom()? {
            atoms.push(atom);
        }
        match atoms.len() {
            0 => Err(self.error("Expected a selector")),
            1 => Ok(atoms.remove(0)),
            _ => Ok(SelectorAst::Compound(atoms)),
        }
    }

    fn atom(&mut self) -> ParseResult<Option<SelectorAst>> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let atom = match c {
            '*' => {
                self.bump();
                SelectorAst::Wildcard
            }
            '#' => {
                self.bump();
                SelectorAst::Identifier(self.name()?)
            }
            '[' => self.attribute()?,
            '.' => {
                self.bump();
                SelectorAst::Field(self.path()?)
            }
            ':' => self.pseudo()?,
            c if is_name_char(c) => SelectorAst::Identifier(self.name()?),
            _ => return Ok(None),
        };
        Ok(Some(atom))
    }

    fn name(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("Expected a name"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn path(&mut self) -> ParseResult<Vec<String>> {
        let mut path = vec![self.name()?];
        while self.eat('.') {
            path.push(self.name()?);
        }
        Ok(path)
    }

    fn attribute(&mut self) -> ParseResult<SelectorAst> {
        self.expect('[')?;
        self.skip_ws();
        let path = self.path()?;
        self.skip_ws();
        if self.eat(']') {
            return Ok(SelectorAst::Attribute { path, test: None });
        }
        let op = self.operator()?;
        self.skip_ws();
        let value = self.attribute_value()?;
        if !matches!(op, AttributeOp::Eq | AttributeOp::Ne)
            && !matches!(value, AttributeValue::Literal(_))
        {
            return Err(self.error("Ordering comparisons need a literal value"));
        }
        self.skip_ws();
        self.expect(']')?;
        Ok(SelectorAst::Attribute {
            path,
            test: Some(AttributeTest { op, value }),
        })
    }

    fn operator(&mut self) -> ParseResult<AttributeOp> {
        let rest = &self.src[self.pos..];
        let (op, width) = if rest.starts_with("!=") {
            (AttributeOp::Ne, 2)
        } else if rest.starts_with("<=") {
            (AttributeOp::Le, 2)
        } else if rest.starts_with(">=") {
            (AttributeOp::Ge, 2)
        } else if rest.starts_with('=') {
            (AttributeOp::Eq, 1)
        } else if rest.starts_with('<') {
            (AttributeOp::Lt, 1)
        } else if rest.starts_with('>') {
            (AttributeOp::Gt, 1)
        } else {
            return Err(self.error("Expected an attribute operator or ']'"));
        };
        self.pos += width;
        Ok(op)
    }

    fn attribute_value(&mut self) -> ParseResult<AttributeValue> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                Ok(AttributeValue::Literal(self.string(quote)?))
            }
            Some('/') => self.regex(),
            Some(_) if self.src[self.pos..].starts_with("type(") => {
                self.pos += "type(".len();
                self.skip_ws();
                let name = self.name()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(AttributeValue::Type(name))
            }
            Some(c) if is_name_char(c) || c == '.' => {
                let start = self.pos;
                while self.peek().is_some_and(|c| is_name_char(c) || c == '.') {
                    self.bump();
                }
                Ok(AttributeValue::Literal(self.src[start..self.pos].to_string()))
            }
            _ => Err(self.error("Expected an attribute value")),
        }
    }

    fn string(&mut self, quote: char) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("Unterminated string")),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("Unterminated string")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn regex(&mut self) -> ParseResult<AttributeValue> {
        self.expect('/')?;
        let start = self.pos;
        let mut pattern = String::new();
        loop {
            match self.bump() {
                None => {
                    self.pos = start;
                    return Err(self.error("Unterminated regular expression"));
                }
                Some('\\') => {
                    pattern.push('\\');
                    if let Some(c) = self.bump() {
                        pattern.push(c);
                    }
                }
                Some('/') => break,
                Some(c) => pattern.push(c),
            }
        }
        let mut builder = RegexBuilder::new(&pattern);
        while let Some(flag) = self.peek().filter(char::is_ascii_alphabetic) {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'u' => builder.unicode(true),
                other => return Err(self.error(format!("Unknown regular expression flag '{other}'"))),
            };
            self.bump();
        }
        builder
            .build()
            .map(AttributeValue::Regex)
            .map_err(|e| SyntaxError {
                position: start,
                message: e.to_string(),
            })
    }

    fn pseudo(&mut self) -> ParseResult<SelectorAst> {
        self.expect(':')?;
        let name_pos = self.pos;
        let name = self.name()?.to_ascii_lowercase();
        match name.as_str() {
            "not" | "matches" | "is" => {
                self.expect('(')?;
                self.skip_ws();
                let inner = match self.selectors()? {
                    SelectorAst::Matches(list) => list,
                    single => vec![single],
                };
                self.skip_ws();
                self.expect(')')?;
                Ok(if name == "not" {
                    SelectorAst::Not(inner)
                } else {
                    SelectorAst::Matches(inner)
                })
            }
            "first-child" => Ok(SelectorAst::NthChild(1)),
            "last-child" => Ok(SelectorAst::NthLastChild(1)),
            "nth-child" => Ok(SelectorAst::NthChild(self.nth_argument()?)),
            "nth-last-child" => Ok(SelectorAst::NthLastChild(self.nth_argument()?)),
            "has" | "exit" => Err(SyntaxError {
                position: name_pos,
                message: format!("Unsupported pseudo-class ':{name}'"),
            }),
            _ => Ok(SelectorAst::Class(name)),
        }
    }

    fn nth_argument(&mut self) -> ParseResult<usize> {
        self.expect('(')?;
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let n = self.src[start..self.pos]
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| SyntaxError {
                position: start,
                message: "Expected a positive integer".to_string(),
            })?;
        self.skip_ws();
        self.expect(')')?;
        Ok(n)
    }
}
