use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, VmError},
    lexer::Lexer,
    node::Node,
};

/// Pulls expressions from a token stream one at a time.
///
/// The grammar has a single production: an expression is exactly one literal
/// or symbol token. Anything else from the lexer is a syntax condition.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    pub fn line(&self) -> usize {
        self.lexer.line()
    }

    pub fn next_expression(&mut self) -> Result<Option<Node>> {
        let token = match self.lexer.next() {
            Some(token) => token?,
            None => return Ok(None),
        };
        // The lexer's symbol rule takes any run of non-whitespace, so every
        // token is a primitive; this branch guards other token sources.
        if token.kind().is_primitive() {
            Ok(Some(token))
        } else {
            Err(VmError::from(
                Diagnostic::new(
                    DiagnosticKind::Syntax,
                    format!("unexpected {} where an expression was expected", token.head("")),
                )
                .with_line(self.line()),
            ))
        }
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_expression().transpose()
    }
}

/// Parses every expression in the source, stopping at the first failure.
pub fn parse_expressions(source: &str) -> Result<Vec<Node>> {
    Parser::new(source).collect()
}
