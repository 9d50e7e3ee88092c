use crate::{
    cst::node::{NodeKind, SyntaxNode},
    errors::errors::{Error, ErrorImpl},
    lexer::{
        scanner::{filter_trivia, tokenize, MAX_NESTING_DEPTH},
        tokens::{Token, TokenKind},
    },
    Span,
};

use super::stmt;

/// Token cursor shared by the expression and statement parsers.
///
/// The parser is best-effort: diagnostics are collected on the side, error
/// nodes stand in for constructs that could not be parsed, and parsing
/// always produces a module node covering the whole input.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<Error>,
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = filter_trivia(tokens);
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::empty(crate::Position::start()),
            });
        }
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Cursor position, used by block loops to check that a statement parse
    /// made progress.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn current_token(&self) -> &Token {
        // The scanner always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    pub fn current_span(&self) -> Span {
        self.current_token().span
    }

    /// The token after the current one, for the rare two-token decisions
    /// (keyword arguments, attribute access).
    pub fn peek_token(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    pub fn has_tokens(&self) -> bool {
        self.current_kind() != TokenKind::Eof
    }

    /// Consumes and returns the current token. At the end of the stream the
    /// cursor stays on Eof.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Whether the current token is an operator with exactly this spelling.
    pub fn at_operator(&self, spelling: &str) -> bool {
        self.current_token().is_operator(spelling)
    }

    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub fn eat_operator(&mut self, spelling: &str) -> Option<Token> {
        if self.at_operator(spelling) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes a token of the given kind, or records a diagnostic and
    /// leaves the cursor where it is.
    pub fn expect(&mut self, kind: TokenKind, expected: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.push_unexpected(expected);
            None
        }
    }

    pub fn expect_operator(&mut self, spelling: &str) -> Option<Token> {
        if self.at_operator(spelling) {
            Some(self.advance())
        } else {
            self.push_unexpected(&format!("`{}`", spelling));
            None
        }
    }

    pub fn push_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn push_unexpected(&mut self, expected: &str) {
        let found = self.describe_current();
        let span = self.current_span();
        self.push_error(Error::new(
            ErrorImpl::UnexpectedToken {
                expected: String::from(expected),
                found,
            },
            span,
        ));
    }

    /// A readable name for the current token in diagnostics. Synthetic
    /// tokens have no text, so fall back to the kind name.
    pub fn describe_current(&self) -> String {
        let token = self.current_token();
        if token.text.is_empty() {
            format!("{}", token.kind)
        } else {
            token.text.clone()
        }
    }

    /// Guards recursive descent against pathological nesting. Returns false
    /// once the depth limit is hit, after recording a diagnostic.
    pub fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            let span = self.current_span();
            self.push_error(Error::new(
                ErrorImpl::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                },
                span,
            ));
            false
        } else {
            true
        }
    }

    pub fn leave(&mut self) {
        self.depth -= 1;
    }

    /// An error node covering the given span.
    pub fn error_node(&self, span: Span) -> SyntaxNode {
        SyntaxNode::leaf(NodeKind::Error, "", span)
    }

    /// Skips to the next statement boundary: past a Newline, or up to (but
    /// not past) a Dedent or Eof, so the enclosing block loop can resume.
    /// Returns the span of everything skipped.
    pub fn recover_statement(&mut self, from: Span) -> Span {
        let mut span = from;
        loop {
            match self.current_kind() {
                TokenKind::Eof | TokenKind::Dedent => break,
                TokenKind::Newline => {
                    span = span.join(&self.advance().span);
                    break;
                }
                // Skip balanced indentation so recovery cannot desync the
                // block structure around the bad statement.
                TokenKind::Indent => {
                    span = span.join(&self.advance().span);
                    let mut depth = 1u32;
                    while depth > 0 && self.has_tokens() {
                        match self.current_kind() {
                            TokenKind::Indent => depth += 1,
                            TokenKind::Dedent => depth -= 1,
                            _ => {}
                        }
                        span = span.join(&self.advance().span);
                    }
                }
                _ => span = span.join(&self.advance().span),
            }
        }
        span
    }

    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}

/// Parses a token stream into a module tree plus structural diagnostics.
pub fn parse(tokens: Vec<Token>) -> (SyntaxNode, Vec<Error>) {
    let mut parser = Parser::new(tokens);
    let module = stmt::parse_module(&mut parser);
    let errors = parser.take_errors();
    (module, errors)
}

/// Scans and parses in one step, merging lexical and structural diagnostics
/// in that order.
pub fn parse_source(source: &str) -> (SyntaxNode, Vec<Error>) {
    let (tokens, mut errors) = tokenize(source);
    let (module, structural) = parse(tokens);
    errors.extend(structural);
    (module, errors)
}
