use std::fmt::Display;

use thiserror::Error as ThisError;

use crate::Span;

/// A diagnostic produced by the scanner or the parser.
///
/// Lexical errors come out of the scanner alongside the token stream;
/// structural errors come out of the parser alongside the tree. Both carry
/// the span of the offending source and are never silently swallowed.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Whether this diagnostic came out of the scanner rather than the parser.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::UnrecognisedCharacter { .. }
                | ErrorImpl::UnterminatedString
                | ErrorImpl::InconsistentDedent { .. }
                | ErrorImpl::UnclosedBracket { .. }
                | ErrorImpl::UnmatchedBracket { .. }
                | ErrorImpl::InvalidEscapeSequence { .. }
                | ErrorImpl::InvalidNumericLiteral { .. }
        )
    }

    pub fn name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => "UnrecognisedCharacter",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::InconsistentDedent { .. } => "InconsistentDedent",
            ErrorImpl::UnclosedBracket { .. } => "UnclosedBracket",
            ErrorImpl::UnmatchedBracket { .. } => "UnmatchedBracket",
            ErrorImpl::InvalidEscapeSequence { .. } => "InvalidEscapeSequence",
            ErrorImpl::InvalidNumericLiteral { .. } => "InvalidNumericLiteral",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::ExpectedExpression { .. } => "ExpectedExpression",
            ErrorImpl::ExpectedIndentedBlock => "ExpectedIndentedBlock",
            ErrorImpl::MismatchedBlock { .. } => "MismatchedBlock",
            ErrorImpl::NestingTooDeep { .. } => "NestingTooDeep",
        }
    }

    pub fn tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => ErrorTip::None,
            ErrorImpl::UnterminatedString => ErrorTip::Suggestion(String::from(
                "string is missing its closing quote before the end of the line",
            )),
            ErrorImpl::InconsistentDedent { width } => ErrorTip::Suggestion(format!(
                "dedent to column {} does not match any enclosing indentation level",
                width + 1
            )),
            ErrorImpl::UnclosedBracket { bracket } => {
                ErrorTip::Suggestion(format!("`{}` was never closed", bracket))
            }
            ErrorImpl::UnmatchedBracket { bracket } => {
                ErrorTip::Suggestion(format!("`{}` has no matching opening bracket", bracket))
            }
            ErrorImpl::InvalidEscapeSequence { text } => {
                ErrorTip::Suggestion(format!("`{}` is not a recognised escape sequence", text))
            }
            ErrorImpl::InvalidNumericLiteral { text } => {
                ErrorTip::Suggestion(format!("`{}` is not a valid numeric literal", text))
            }
            ErrorImpl::UnexpectedToken { expected, found } => ErrorTip::Suggestion(format!(
                "expected {}, found `{}`",
                expected, found
            )),
            ErrorImpl::ExpectedExpression { found } => ErrorTip::Suggestion(format!(
                "expected an expression, found `{}`",
                found
            )),
            ErrorImpl::ExpectedIndentedBlock => ErrorTip::Suggestion(String::from(
                "the body of this statement must be on the same line or indented below it",
            )),
            ErrorImpl::MismatchedBlock { found } => ErrorTip::Suggestion(format!(
                "block ended unexpectedly at `{}`",
                found
            )),
            ErrorImpl::NestingTooDeep { limit } => ErrorTip::Suggestion(format!(
                "constructs may nest at most {} levels deep",
                limit
            )),
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(ThisError, Debug, Clone)]
pub enum ErrorImpl {
    // Lexical
    #[error("unrecognised character: {character:?}")]
    UnrecognisedCharacter { character: char },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("inconsistent indentation: width {width} matches no open block")]
    InconsistentDedent { width: u32 },
    #[error("unclosed bracket: {bracket:?}")]
    UnclosedBracket { bracket: char },
    #[error("unmatched closing bracket: {bracket:?}")]
    UnmatchedBracket { bracket: char },
    #[error("invalid escape sequence: {text:?}")]
    InvalidEscapeSequence { text: String },
    #[error("invalid numeric literal: {text:?}")]
    InvalidNumericLiteral { text: String },

    // Structural
    #[error("unexpected token: expected {expected}, found {found:?}")]
    UnexpectedToken { expected: String, found: String },
    #[error("expected an expression, found {found:?}")]
    ExpectedExpression { found: String },
    #[error("expected an indented block")]
    ExpectedIndentedBlock,
    #[error("mismatched block structure at {found:?}")]
    MismatchedBlock { found: String },
    #[error("nesting exceeds the maximum depth of {limit}")]
    NestingTooDeep { limit: u32 },
}
