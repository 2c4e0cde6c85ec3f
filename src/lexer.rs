use tracing::trace;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, VmError},
    node::Node,
};

/// A token rule: the byte length of the match at the start of the input.
type Rule = fn(&str) -> Option<usize>;
type Build = fn(&str) -> std::result::Result<Node, Diagnostic>;

/// Checked top to bottom; the first rule that matches wins.
const RULES: [(&str, Rule, Build); 6] = [
    ("decimal point", decimal_point, Node::parse_float),
    ("exponent", exponent, Node::parse_float),
    ("hex", hex_literal, Node::parse_hex),
    ("bin", bin_literal, Node::parse_bin),
    ("integer", integer, Node::parse_integer),
    ("symbol", symbol, build_symbol),
];

/// Lazy stream of primitive nodes over a source text. A clone continues from
/// the same offset; build a new lexer to start over.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            failed: false,
        }
    }

    /// Line of the most recently scanned input.
    pub fn line(&self) -> usize {
        self.line
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn skip_ignored(&mut self) {
        loop {
            let rest = self.rest();
            let blank = rest
                .find(|ch: char| !matches!(ch, ' ' | '\t' | '\r'))
                .unwrap_or(rest.len());
            if blank > 0 {
                self.offset += blank;
                continue;
            }
            if rest.starts_with('#') {
                self.offset += rest.find('\n').unwrap_or(rest.len());
                continue;
            }
            if rest.starts_with('\n') {
                let newlines = rest.find(|ch: char| ch != '\n').unwrap_or(rest.len());
                self.line += newlines;
                self.offset += newlines;
                continue;
            }
            break;
        }
    }

    fn scan(&mut self) -> Result<Option<Node>> {
        self.skip_ignored();
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(None);
        }
        for (name, rule, build) in RULES {
            if let Some(len) = rule(rest) {
                let text = &rest[..len];
                let node = build(text).map_err(|diag| diag.with_line(self.line))?;
                trace!(line = self.line, rule = name, text, "token");
                self.offset += len;
                return Ok(Some(node));
            }
        }
        let bad = rest.chars().next().unwrap_or_default();
        Err(VmError::from(
            Diagnostic::new(
                DiagnosticKind::Lexer,
                format!("unrecognized character {bad:?}"),
            )
            .with_line(self.line),
        ))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scan() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => None,
            Err(err) => {
                // No resynchronization after a lexical failure.
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Tokenizes the whole source, stopping at the first failure.
pub fn tokenize(source: &str) -> Result<Vec<Node>> {
    Lexer::new(source).collect()
}

fn build_symbol(text: &str) -> std::result::Result<Node, Diagnostic> {
    Ok(Node::symbol(text))
}

fn sign(text: &str) -> usize {
    usize::from(text.starts_with(['+', '-']))
}

fn count(text: &str, accept: fn(&u8) -> bool) -> usize {
    text.bytes().take_while(|b| accept(b)).count()
}

fn is_digit(b: &u8) -> bool {
    b.is_ascii_digit()
}

/// `[+-]?[0-9]+\.[0-9]*`
fn decimal_point(text: &str) -> Option<usize> {
    let mut len = sign(text);
    let whole = count(&text[len..], is_digit);
    if whole == 0 {
        return None;
    }
    len += whole;
    if !text[len..].starts_with('.') {
        return None;
    }
    len += 1;
    Some(len + count(&text[len..], is_digit))
}

/// `[+-]?[0-9]+[eE][+-]?[0-9]+`
fn exponent(text: &str) -> Option<usize> {
    let mut len = sign(text);
    let whole = count(&text[len..], is_digit);
    if whole == 0 {
        return None;
    }
    len += whole;
    if !text[len..].starts_with(['e', 'E']) {
        return None;
    }
    len += 1;
    len += sign(&text[len..]);
    let power = count(&text[len..], is_digit);
    (power > 0).then_some(len + power)
}

fn prefixed(text: &str, prefix: &str, accept: fn(&u8) -> bool) -> Option<usize> {
    let digits = count(text.strip_prefix(prefix)?, accept);
    (digits > 0).then_some(prefix.len() + digits)
}

/// `0x[0-9A-Fa-f]+`
fn hex_literal(text: &str) -> Option<usize> {
    prefixed(text, "0x", u8::is_ascii_hexdigit)
}

/// `0b[01]+`
fn bin_literal(text: &str) -> Option<usize> {
    prefixed(text, "0b", |b| matches!(*b, b'0' | b'1'))
}

/// `[+-]?[0-9]+`
fn integer(text: &str) -> Option<usize> {
    let len = sign(text);
    let digits = count(&text[len..], is_digit);
    (digits > 0).then_some(len + digits)
}

/// Any maximal run of non-whitespace.
fn symbol(text: &str) -> Option<usize> {
    let len = text
        .find([' ', '\t', '\r', '\n'])
        .unwrap_or(text.len());
    (len > 0).then_some(len)
}
