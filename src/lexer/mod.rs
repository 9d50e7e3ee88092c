//! Lexical analysis module for the front end.
//!
//! This module contains the scanner that converts source code into a stream
//! of tokens for parsing. It handles:
//!
//! - Indentation tracking with synthetic `Newline`/`Indent`/`Dedent` tokens
//! - Implicit line joining inside brackets and explicit `\` continuations
//! - String literals with escape sequences and `{expr}` interpolation spans
//! - Recognition of keywords, identifiers, literals, and operator spellings
//! - Token position tracking for error reporting
//! - Comments and whitespace as trivia tokens (the stream round-trips)

pub mod scanner;
pub mod strings;
pub mod tokens;

#[cfg(test)]
mod tests;
