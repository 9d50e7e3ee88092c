use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("if", TokenKind::If);
        map.insert("elif", TokenKind::Elif);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("for", TokenKind::For);
        map.insert("proc", TokenKind::Proc);
        map.insert("func", TokenKind::Func);
        map.insert("var", TokenKind::Var);
        map.insert("let", TokenKind::Let);
        map.insert("const", TokenKind::Const);
        map.insert("return", TokenKind::Return);
        map.insert("pass", TokenKind::Pass);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("import", TokenKind::Import);
        map.insert("from", TokenKind::From);
        map.insert("as", TokenKind::As);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("nil", TokenKind::Nil);
        // Keyword operators carry their spelling; precedence is derived from
        // the text by the classifier, not from the token kind.
        for word in [
            "and", "or", "xor", "not", "in", "notin", "is", "isnot", "of", "div", "mod", "shl",
            "shr",
        ] {
            map.insert(word, TokenKind::Operator);
        }
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Eof,

    // Logical line structure
    Newline,
    Indent,
    Dedent,

    // Trivia (kept in the raw stream so token texts round-trip the source)
    Whitespace,
    Comment,

    Identifier,
    Integer,
    Float,
    /// Any operator spelling, symbolic or keyword. Precedence and
    /// associativity are computed from the text.
    Operator,

    // String scanning
    StringStart,
    StringContent,
    EscapeSequence,
    StringEnd,
    FormatSpec,
    TypeConversion,

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Semicolon,

    // Reserved
    If,
    Elif,
    Else,
    While,
    For,
    Proc,
    Func,
    Var,
    Let,
    Const,
    Return,
    Pass,
    Break,
    Continue,
    Import,
    From,
    As,
    True,
    False,
    Nil,

    /// Covers a span the scanner could not make sense of; a diagnostic with
    /// the same span is recorded alongside.
    Error,
}

impl TokenKind {
    /// Trivia tokens are skipped by the parser but kept in the raw stream.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\ntext: {}}}", self.kind, self.text)
    }
}

impl Token {
    /// Whether this token is an operator with exactly the given spelling.
    pub fn is_operator(&self, spelling: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == spelling
    }

    pub fn debug(&self) {
        if matches!(
            self.kind,
            TokenKind::Identifier
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::Operator
                | TokenKind::StringContent
        ) {
            println!("{} ({})", self.kind, self.text);
        } else {
            println!("{} ()", self.kind);
        }
    }
}
