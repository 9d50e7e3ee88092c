//! String-literal scanning: content runs, escape sequences, interpolation
//! spans, and format specifiers.
//!
//! These are sub-modes of the scanner. A string pushes a `Mode::Str` entry;
//! an unescaped `{` inside it pushes `Mode::Interp`, under which the scanner
//! tokenizes ordinary code again (the parser re-enters the expression parser
//! there). A bare `:` at interpolation depth zero switches the span into
//! `Mode::Format`, whose literal runs become `FormatSpec` tokens.

use crate::{
    errors::errors::ErrorImpl,
    Span,
};

use super::{
    scanner::{Mode, Scanner},
    tokens::TokenKind,
};

/// State for one open string literal.
#[derive(Debug, Clone)]
pub struct StringScanState {
    /// `"""` strings may span physical lines; `"` strings may not.
    pub triple: bool,
    /// Span of the opening quote, used to anchor unterminated-string
    /// diagnostics.
    pub start: Span,
}

impl StringScanState {
    pub fn new(triple: bool, start: Span) -> Self {
        StringScanState { triple, start }
    }
}

impl Scanner {
    pub(super) fn scan_string_mode(&mut self) {
        let triple = match self.modes.last() {
            Some(Mode::Str(state)) => state.triple,
            _ => return,
        };

        let ch = match self.current() {
            Some(ch) => ch,
            None => {
                self.fail_unterminated_string();
                return;
            }
        };

        if (ch == '\n' || ch == '\r') && !triple {
            // The line break itself is re-scanned in normal mode after the
            // string state unwinds.
            self.fail_unterminated_string();
            return;
        }

        if ch == '"' {
            let start = self.here();
            if !triple {
                self.advance();
                self.modes.pop();
                self.push_token(
                    TokenKind::StringEnd,
                    String::from("\""),
                    Span::new(start, self.here()),
                );
                return;
            }
            if self.peek(1) == Some('"') && self.peek(2) == Some('"') {
                let mut text = String::new();
                for _ in 0..3 {
                    text.push(self.advance().unwrap_or_default());
                }
                self.modes.pop();
                self.push_token(TokenKind::StringEnd, text, Span::new(start, self.here()));
                return;
            }
            // A lone quote inside a multiline string is plain content.
        } else if ch == '\\' {
            self.scan_escape_sequence();
            return;
        } else if ch == '{' {
            let start = self.here();
            self.advance();
            let span = Span::new(start, self.here());
            if self.try_push_mode(
                Mode::Interp {
                    braces: 0,
                    rounds: 0,
                    squares: 0,
                },
                span,
            ) {
                self.push_token(TokenKind::OpenBrace, String::from("{"), span);
            } else {
                self.push_token(TokenKind::Error, String::from("{"), span);
            }
            return;
        }

        let start = self.here();
        let text = self.consume_while(|c| {
            c != '\\' && c != '{' && c != '"' && (triple || (c != '\n' && c != '\r'))
        });
        // A lone `"` inside a multiline string stalls consume_while; take it
        // as content one character at a time.
        let text = if text.is_empty() && triple && self.current() == Some('"') {
            self.advance();
            String::from("\"")
        } else {
            text
        };
        if !text.is_empty() {
            self.push_token(
                TokenKind::StringContent,
                text,
                Span::new(start, self.here()),
            );
        }
    }

    /// Backslash plus one of the fixed letter/hex/octal/unicode forms, or an
    /// escaped line break. Anything else is an invalid-escape diagnostic.
    fn scan_escape_sequence(&mut self) {
        let start = self.here();
        let mut text = String::new();
        text.push(self.advance().unwrap_or_default()); // backslash

        let valid = match self.current() {
            Some('u') => {
                text.push(self.advance().unwrap_or_default());
                self.consume_hex_digits(&mut text, 4)
            }
            Some('U') => {
                text.push(self.advance().unwrap_or_default());
                self.consume_hex_digits(&mut text, 8)
            }
            Some('x') => {
                text.push(self.advance().unwrap_or_default());
                self.consume_hex_digits(&mut text, 2)
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut ok = true;
                for _ in 0..3 {
                    match self.current() {
                        Some(digit) if digit.is_ascii_digit() => {
                            text.push(self.advance().unwrap_or_default());
                        }
                        _ => {
                            ok = false;
                            break;
                        }
                    }
                }
                ok
            }
            Some('\r') => {
                text.push(self.advance().unwrap_or_default());
                if self.current() == Some('\n') {
                    text.push(self.advance().unwrap_or_default());
                }
                true
            }
            Some('\n') => {
                text.push(self.advance().unwrap_or_default());
                true
            }
            Some(ch) if "'\"abfrntv\\".contains(ch) => {
                text.push(self.advance().unwrap_or_default());
                true
            }
            Some(ch) => {
                text.push(self.advance().unwrap_or_default());
                let _ = ch;
                false
            }
            None => false,
        };

        let span = Span::new(start, self.here());
        if valid {
            self.push_token(TokenKind::EscapeSequence, text, span);
        } else {
            self.push_error(ErrorImpl::InvalidEscapeSequence { text: text.clone() }, span);
            self.push_token(TokenKind::Error, text, span);
        }
    }

    fn consume_hex_digits(&mut self, text: &mut String, count: usize) -> bool {
        for _ in 0..count {
            match self.current() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    text.push(self.advance().unwrap_or_default());
                }
                _ => return false,
            }
        }
        true
    }

    pub(super) fn scan_format_mode(&mut self) {
        let ch = match self.current() {
            Some(ch) => ch,
            None => {
                // Unwind to the string state, which reports the
                // unterminated literal.
                self.modes.pop();
                return;
            }
        };

        match ch {
            '\n' | '\r' => {
                if self.format_string_is_triple() {
                    let start = self.here();
                    let mut text = String::new();
                    if self.current() == Some('\r') {
                        text.push(self.advance().unwrap_or_default());
                    }
                    if self.current() == Some('\n') {
                        text.push(self.advance().unwrap_or_default());
                    }
                    self.push_token(TokenKind::Whitespace, text, Span::new(start, self.here()));
                } else {
                    self.modes.pop();
                }
            }
            '{' => {
                let start = self.here();
                self.advance();
                let span = Span::new(start, self.here());
                if self.try_push_mode(
                    Mode::Interp {
                        braces: 0,
                        rounds: 0,
                        squares: 0,
                    },
                    span,
                ) {
                    self.push_token(TokenKind::OpenBrace, String::from("{"), span);
                } else {
                    self.push_token(TokenKind::Error, String::from("{"), span);
                }
            }
            '}' => {
                let start = self.here();
                self.advance();
                self.modes.pop();
                self.push_token(
                    TokenKind::CloseBrace,
                    String::from("}"),
                    Span::new(start, self.here()),
                );
            }
            _ => {
                let start = self.here();
                let text = self.consume_while(|c| c != '{' && c != '}' && c != '\n' && c != '\r');
                self.push_token(TokenKind::FormatSpec, text, Span::new(start, self.here()));
            }
        }
    }

    fn format_string_is_triple(&self) -> bool {
        self.modes
            .iter()
            .rev()
            .find_map(|mode| match mode {
                Mode::Str(state) => Some(state.triple),
                _ => None,
            })
            .unwrap_or(false)
    }
}
