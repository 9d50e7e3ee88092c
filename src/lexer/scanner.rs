use std::collections::VecDeque;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span,
};

use super::{
    strings::StringScanState,
    tokens::{Token, TokenKind, RESERVED_LOOKUP},
};

/// Hard cap on string/interpolation nesting, so pathological input cannot
/// grow the mode stack (and the parser's recursion) without bound.
pub const MAX_NESTING_DEPTH: u32 = 256;

/// Characters that may form an operator spelling.
pub const OPERATOR_CHARS: &str = "=+-*/<>@$~&%|!?^.:\\";

lazy_static! {
    static ref FLOAT_RE: Regex = Regex::new(
        "^(?:[0-9](?:_?[0-9])*\\.(?:[0-9](?:_?[0-9])*)?(?:[eE][+-]?[0-9](?:_?[0-9])*)?\
         |[0-9](?:_?[0-9])*[eE][+-]?[0-9](?:_?[0-9])*)[LljJ]?"
    )
    .unwrap();
    static ref INTEGER_RE: Regex = Regex::new(
        "^(?:0[xX](?:_?[0-9a-fA-F]+)+|0[oO](?:_?[0-7]+)+|0[bB](?:_?[01]+)+\
         |[0-9](?:_?[0-9])*)[LljJ]?"
    )
    .unwrap();
}

/// The scanner's current sub-mode. The stack starts empty (plain code);
/// string literals, interpolation spans, and format specifiers each push an
/// entry and pop it at their terminator.
#[derive(Debug, Clone)]
pub(super) enum Mode {
    Str(StringScanState),
    /// Inside an unescaped `{ ... }` span of a string. The bracket counters
    /// track nesting opened *inside* the span, so a `}` closing a nested
    /// dictionary is not mistaken for the interpolation terminator.
    Interp {
        braces: u32,
        rounds: u32,
        squares: u32,
    },
    /// Inside the `:`-suffix of an interpolation span.
    Format,
}

/// Pull-based scanner over a complete source text.
///
/// Produces the raw token stream: real tokens, synthetic
/// `Newline`/`Indent`/`Dedent` markers, and whitespace/comment trivia.
/// Concatenating the `text` of every produced token reproduces the source
/// exactly. Lexical errors become `Error` tokens plus diagnostics; the scan
/// always runs to the end of input.
///
/// Indentation width uses a fixed column-advance rule so comparisons are
/// deterministic: a space or form feed advances one column, a tab advances to
/// the next multiple of 8.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    offset: u32,
    line: u32,
    column: u32,
    pending: VecDeque<Token>,
    pub(super) modes: Vec<Mode>,
    indent_stack: Vec<u32>,
    open_brackets: Vec<(char, Span)>,
    at_line_start: bool,
    line_has_tokens: bool,
    pub(super) errors: Vec<Error>,
    done: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Scanner {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            pending: VecDeque::new(),
            modes: Vec::new(),
            indent_stack: vec![0],
            open_brackets: Vec::new(),
            at_line_start: true,
            line_has_tokens: false,
            errors: Vec::new(),
            done: false,
        }
    }

    pub(super) fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(super) fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    pub(super) fn here(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    pub(super) fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        self.offset += ch.len_utf8() as u32;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => {
                self.column = ((self.column - 1) / 8 + 1) * 8 + 1;
            }
            _ => {
                self.column += 1;
            }
        }
        Some(ch)
    }

    /// Consumes characters while `pred` holds, returning the consumed text.
    pub(super) fn consume_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if !pred(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    pub(super) fn push_token(&mut self, kind: TokenKind, text: String, span: Span) {
        if !kind.is_trivia()
            && !matches!(
                kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof
            )
        {
            self.line_has_tokens = true;
        }
        self.pending.push_back(Token { kind, text, span });
    }

    pub(super) fn push_error(&mut self, kind: ErrorImpl, span: Span) {
        self.errors.push(Error::new(kind, span));
    }

    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    /// Refuses to push past the nesting cap; the caller emits the consumed
    /// text as an `Error` token so the stream still round-trips.
    pub(super) fn try_push_mode(&mut self, mode: Mode, at: Span) -> bool {
        if self.modes.len() as u32 >= MAX_NESTING_DEPTH {
            self.push_error(
                ErrorImpl::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                },
                at,
            );
            return false;
        }
        self.modes.push(mode);
        true
    }

    fn scan_some(&mut self) {
        match self.modes.last() {
            Some(Mode::Str(_)) => self.scan_string_mode(),
            Some(Mode::Format) => self.scan_format_mode(),
            _ => self.scan_normal(),
        }
    }

    fn scan_normal(&mut self) {
        if self.current().is_none() {
            self.finish();
            return;
        }

        if self.at_line_start && self.modes.is_empty() && self.open_brackets.is_empty() {
            self.scan_line_start();
            return;
        }

        let start = self.here();
        let ch = match self.current() {
            Some(ch) => ch,
            None => return,
        };

        // Explicit continuation: a backslash immediately before a line break
        // splices the next physical line onto this logical line.
        if ch == '\\' && matches!(self.peek(1), Some('\n')) {
            let mut text = String::new();
            text.push(self.advance().unwrap_or_default());
            text.push(self.advance().unwrap_or_default());
            self.push_token(TokenKind::Whitespace, text, Span::new(start, self.here()));
            return;
        }
        if ch == '\\' && matches!(self.peek(1), Some('\r')) && matches!(self.peek(2), Some('\n')) {
            let mut text = String::new();
            for _ in 0..3 {
                text.push(self.advance().unwrap_or_default());
            }
            self.push_token(TokenKind::Whitespace, text, Span::new(start, self.here()));
            return;
        }

        match ch {
            '\n' | '\r' => self.scan_line_break(),
            ' ' | '\t' | '\u{c}' | '\u{feff}' | '\u{2060}' | '\u{200b}' => {
                let text = self.consume_while(is_inline_whitespace);
                self.push_token(TokenKind::Whitespace, text, Span::new(start, self.here()));
            }
            '#' => self.scan_comment(),
            '"' => self.scan_string_start(),
            '(' | '[' | '{' => self.scan_open_bracket(ch),
            ')' | ']' | '}' => self.scan_close_bracket(ch),
            ',' => {
                self.advance();
                self.push_token(
                    TokenKind::Comma,
                    String::from(","),
                    Span::new(start, self.here()),
                );
            }
            ';' => {
                self.advance();
                self.push_token(
                    TokenKind::Semicolon,
                    String::from(";"),
                    Span::new(start, self.here()),
                );
            }
            _ if ch.is_ascii_digit() => self.scan_number(),
            _ if is_identifier_start(ch) => self.scan_identifier(),
            _ if OPERATOR_CHARS.contains(ch) => self.scan_operator(),
            _ => {
                self.advance();
                let span = Span::new(start, self.here());
                self.push_error(ErrorImpl::UnrecognisedCharacter { character: ch }, span);
                self.push_token(TokenKind::Error, ch.to_string(), span);
            }
        }
    }

    /// Measures the indentation of a fresh physical line and resolves it
    /// against the indentation stack. Blank and comment-only lines are
    /// transparent: they produce trivia and no structural tokens.
    fn scan_line_start(&mut self) {
        let start = self.here();
        let text = self.consume_while(is_inline_whitespace);
        // The width is fixed here; a block comment between the indentation
        // and the first token advances the column well past it.
        let width = self.column - 1;
        if !text.is_empty() {
            self.push_token(TokenKind::Whitespace, text, Span::new(start, self.here()));
        }

        loop {
            match self.current() {
                None => return,
                Some('\n') | Some('\r') => {
                    // Blank line: consume the break as trivia, stay at line
                    // start.
                    let break_start = self.here();
                    let mut text = String::new();
                    if self.current() == Some('\r') {
                        text.push(self.advance().unwrap_or_default());
                    }
                    if self.current() == Some('\n') {
                        text.push(self.advance().unwrap_or_default());
                    }
                    self.push_token(
                        TokenKind::Whitespace,
                        text,
                        Span::new(break_start, self.here()),
                    );
                    return;
                }
                Some('#') => {
                    self.scan_comment();
                    let gap_start = self.here();
                    let gap = self.consume_while(is_inline_whitespace);
                    if !gap.is_empty() {
                        self.push_token(
                            TokenKind::Whitespace,
                            gap,
                            Span::new(gap_start, self.here()),
                        );
                    }
                }
                Some(_) => {
                    self.resolve_indentation(width);
                    self.at_line_start = false;
                    return;
                }
            }
        }
    }

    fn resolve_indentation(&mut self, width: u32) {
        let marker = Span::empty(self.here());
        let top = *self.indent_stack.last().unwrap_or(&0);

        if width > top {
            self.indent_stack.push(width);
            self.push_token(TokenKind::Indent, String::new(), marker);
        } else if width < top {
            while self
                .indent_stack
                .last()
                .is_some_and(|&top| top > width && self.indent_stack.len() > 1)
            {
                self.indent_stack.pop();
                self.push_token(TokenKind::Dedent, String::new(), marker);
            }
            if *self.indent_stack.last().unwrap_or(&0) != width {
                // No exact match in the stack: report, then carry on at the
                // nearest enclosing level so the scan can continue.
                self.push_error(ErrorImpl::InconsistentDedent { width }, marker);
                self.push_token(TokenKind::Error, String::new(), marker);
            }
        }
    }

    fn scan_line_break(&mut self) {
        // A raw line break while inside an interpolation span is legal in
        // multiline strings, fatal in single-line ones.
        while !self.modes.is_empty() && !self.enclosing_string_is_triple() {
            self.fail_unterminated_string();
        }

        let start = self.here();
        let mut text = String::new();
        if self.current() == Some('\r') {
            text.push(self.advance().unwrap_or_default());
        }
        if self.current() == Some('\n') {
            text.push(self.advance().unwrap_or_default());
        }
        let span = Span::new(start, self.here());

        if !self.modes.is_empty() {
            self.push_token(TokenKind::Whitespace, text, span);
            return;
        }

        if !self.open_brackets.is_empty() {
            // Implicit line joining: breaks inside brackets are trivia.
            self.push_token(TokenKind::Whitespace, text, span);
            return;
        }

        if self.line_has_tokens {
            self.push_token(TokenKind::Newline, text, span);
        } else {
            self.push_token(TokenKind::Whitespace, text, span);
        }
        self.line_has_tokens = false;
        self.at_line_start = true;
    }

    fn scan_comment(&mut self) {
        let start = self.here();
        let mut text = String::new();

        if self.peek(1) == Some('[') {
            // Block comment `#[ ... ]#`; may span lines, not nested.
            text.push(self.advance().unwrap_or_default());
            text.push(self.advance().unwrap_or_default());
            while let Some(ch) = self.current() {
                if ch == ']' && self.peek(1) == Some('#') {
                    text.push(self.advance().unwrap_or_default());
                    text.push(self.advance().unwrap_or_default());
                    break;
                }
                text.push(self.advance().unwrap_or_default());
            }
        } else {
            text.push_str(&self.consume_while(|ch| ch != '\n'));
            if text.ends_with('\r') {
                // Leave the carriage return to the line-break scan.
                text.pop();
                self.pos -= 1;
                self.offset -= 1;
                self.column -= 1;
            }
        }

        self.push_token(TokenKind::Comment, text, Span::new(start, self.here()));
    }

    fn scan_string_start(&mut self) {
        let start = self.here();
        let triple = self.peek(1) == Some('"') && self.peek(2) == Some('"');
        let mut text = String::new();
        let quotes = if triple { 3 } else { 1 };
        for _ in 0..quotes {
            text.push(self.advance().unwrap_or_default());
        }
        let span = Span::new(start, self.here());

        if self.try_push_mode(Mode::Str(StringScanState::new(triple, span)), span) {
            self.push_token(TokenKind::StringStart, text, span);
        } else {
            self.push_token(TokenKind::Error, text, span);
        }
    }

    fn scan_open_bracket(&mut self, ch: char) {
        let start = self.here();
        self.advance();
        let span = Span::new(start, self.here());
        let kind = match ch {
            '(' => TokenKind::OpenParen,
            '[' => TokenKind::OpenBracket,
            _ => TokenKind::OpenBrace,
        };

        if let Some(Mode::Interp {
            braces,
            rounds,
            squares,
        }) = self.modes.last_mut()
        {
            match ch {
                '(' => *rounds += 1,
                '[' => *squares += 1,
                _ => *braces += 1,
            }
        } else {
            self.open_brackets.push((ch, span));
        }

        self.push_token(kind, ch.to_string(), span);
    }

    fn scan_close_bracket(&mut self, ch: char) {
        let start = self.here();
        self.advance();
        let span = Span::new(start, self.here());
        let kind = match ch {
            ')' => TokenKind::CloseParen,
            ']' => TokenKind::CloseBracket,
            _ => TokenKind::CloseBrace,
        };

        if self.in_interpolation() {
            let terminates = if let Some(Mode::Interp {
                braces,
                rounds,
                squares,
            }) = self.modes.last_mut()
            {
                match ch {
                    ')' => {
                        *rounds = rounds.saturating_sub(1);
                        false
                    }
                    ']' => {
                        *squares = squares.saturating_sub(1);
                        false
                    }
                    _ => {
                        if *braces == 0 {
                            true
                        } else {
                            *braces -= 1;
                            false
                        }
                    }
                }
            } else {
                false
            };
            if terminates {
                // This `}` closes the interpolation span itself.
                self.modes.pop();
            }
            self.push_token(kind, ch.to_string(), span);
            return;
        }

        match self.open_brackets.last() {
            Some(&(open, _)) if pairs_with(open, ch) => {
                self.open_brackets.pop();
            }
            Some(_) => {
                self.open_brackets.pop();
                self.push_error(ErrorImpl::UnmatchedBracket { bracket: ch }, span);
            }
            None => {
                self.push_error(ErrorImpl::UnmatchedBracket { bracket: ch }, span);
            }
        }
        self.push_token(kind, ch.to_string(), span);
    }

    fn scan_number(&mut self) {
        let start = self.here();
        let remainder: String = self.chars[self.pos..].iter().collect();

        let (kind, matched) = if let Some(found) = FLOAT_RE.find(&remainder) {
            (TokenKind::Float, found.as_str().to_string())
        } else if let Some(found) = INTEGER_RE.find(&remainder) {
            (TokenKind::Integer, found.as_str().to_string())
        } else {
            // Dispatch guarantees a leading digit, so one of the patterns
            // always matches; keep a defined fallback regardless.
            (TokenKind::Integer, String::new())
        };

        let mut text = String::new();
        for _ in 0..matched.chars().count() {
            if let Some(ch) = self.advance() {
                text.push(ch);
            }
        }

        // A stray identifier tail (`3.14q`, `0x1fgh`) makes the whole run an
        // invalid literal rather than two adjacent tokens.
        if self.current().is_some_and(is_identifier_continue) {
            text.push_str(&self.consume_while(is_identifier_continue));
            let span = Span::new(start, self.here());
            self.push_error(ErrorImpl::InvalidNumericLiteral { text: text.clone() }, span);
            self.push_token(TokenKind::Error, text, span);
            return;
        }

        self.push_token(kind, text, Span::new(start, self.here()));
    }

    fn scan_identifier(&mut self) {
        let start = self.here();
        let text = self.consume_while(is_identifier_continue);
        let span = Span::new(start, self.here());

        let kind = RESERVED_LOOKUP
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.push_token(kind, text, span);
    }

    fn scan_operator(&mut self) {
        let start = self.here();

        // Inside an interpolation span, `!s` directly before `}` or `:` is a
        // type-conversion marker, not the start of an operator.
        if self.in_interpolation()
            && self.current() == Some('!')
            && self.peek(1).is_some_and(|ch| ch.is_ascii_lowercase())
            && matches!(self.peek(2), Some('}') | Some(':'))
        {
            let mut text = String::new();
            text.push(self.advance().unwrap_or_default());
            text.push(self.advance().unwrap_or_default());
            self.push_token(
                TokenKind::TypeConversion,
                text,
                Span::new(start, self.here()),
            );
            return;
        }

        // A `:` at interpolation depth zero introduces the format specifier
        // of the enclosing span; it must not be folded into an operator run
        // (`:>8` is a colon followed by spec text, not a `:>` operator).
        if self.current() == Some(':') && self.at_interpolation_top() {
            self.advance();
            let span = Span::new(start, self.here());
            if let Some(last) = self.modes.last_mut() {
                *last = Mode::Format;
            }
            self.push_token(TokenKind::Operator, String::from(":"), span);
            return;
        }

        let mut text = String::new();
        while let Some(ch) = self.current() {
            if !OPERATOR_CHARS.contains(ch) {
                break;
            }
            // Never swallow a continuation backslash into an operator run.
            if ch == '\\'
                && (matches!(self.peek(1), Some('\n'))
                    || (matches!(self.peek(1), Some('\r')) && matches!(self.peek(2), Some('\n'))))
            {
                break;
            }
            text.push(ch);
            self.advance();
        }
        let span = Span::new(start, self.here());

        self.push_token(TokenKind::Operator, text, span);
    }

    pub(super) fn in_interpolation(&self) -> bool {
        matches!(self.modes.last(), Some(Mode::Interp { .. }))
    }

    fn at_interpolation_top(&self) -> bool {
        matches!(
            self.modes.last(),
            Some(Mode::Interp {
                braces: 0,
                rounds: 0,
                squares: 0
            })
        )
    }

    /// Whether the innermost open string literal is a multiline (`"""`) one.
    fn enclosing_string_is_triple(&self) -> bool {
        self.modes
            .iter()
            .rev()
            .find_map(|mode| match mode {
                Mode::Str(state) => Some(state.triple),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Reports the innermost open string as unterminated and unwinds the mode
    /// stack through it, so scanning resynchronizes at the line boundary.
    pub(super) fn fail_unterminated_string(&mut self) {
        while let Some(mode) = self.modes.pop() {
            if let Mode::Str(state) = mode {
                self.push_error(ErrorImpl::UnterminatedString, state.start);
                self.push_token(TokenKind::Error, String::new(), Span::empty(self.here()));
                break;
            }
        }
    }

    /// End of input: close out open constructs, terminate the last logical
    /// line, drain the indentation stack, and emit `Eof`.
    fn finish(&mut self) {
        while !self.modes.is_empty() {
            self.fail_unterminated_string();
        }

        let open_brackets = std::mem::take(&mut self.open_brackets);
        for (bracket, span) in open_brackets {
            self.push_error(ErrorImpl::UnclosedBracket { bracket }, span);
        }

        let marker = Span::empty(self.here());
        if self.line_has_tokens {
            self.push_token(TokenKind::Newline, String::new(), marker);
            self.line_has_tokens = false;
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_token(TokenKind::Dedent, String::new(), marker);
        }

        self.push_token(TokenKind::Eof, String::new(), marker);
        self.done = true;
    }
}

impl Iterator for Scanner {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            self.scan_some();
        }
    }
}

fn is_inline_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{c}' | '\u{feff}' | '\u{2060}' | '\u{200b}')
}

pub(super) fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(super) fn is_identifier_continue(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

fn pairs_with(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// Scans the whole source, returning the raw token stream (trivia included)
/// and every lexical diagnostic. The stream is best-effort: errors become
/// `Error` tokens and the scan continues at the next clear boundary.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Error>) {
    let mut scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.by_ref().collect();
    let errors = scanner.take_errors();
    (tokens, errors)
}

/// Drops whitespace and comment trivia, leaving the stream the parser
/// consumes.
pub fn filter_trivia(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect()
}
