//! Unit tests for the lexer module.
//!
//! This module contains tests for the scanner including:
//! - Keywords, identifiers and numeric literals
//! - Indentation structure (Indent/Dedent/Newline synthesis)
//! - Implicit line joining inside brackets and explicit continuations
//! - String literals, interpolation spans and format specifiers
//! - Round-tripping the raw token stream back to the source
//! - Error cases

use crate::errors::errors::ErrorImpl;

use super::{
    scanner::{filter_trivia, tokenize},
    tokens::TokenKind,
};

fn kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, _) = tokenize(source);
    filter_trivia(tokens)
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "if elif else while for proc func var let const return pass break continue import from true false nil";
    let (tokens, errors) = tokenize(source);
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::If);
    assert_eq!(tokens[1].kind, TokenKind::Elif);
    assert_eq!(tokens[2].kind, TokenKind::Else);
    assert_eq!(tokens[3].kind, TokenKind::While);
    assert_eq!(tokens[4].kind, TokenKind::For);
    assert_eq!(tokens[5].kind, TokenKind::Proc);
    assert_eq!(tokens[6].kind, TokenKind::Func);
    assert_eq!(tokens[7].kind, TokenKind::Var);
    assert_eq!(tokens[8].kind, TokenKind::Let);
    assert_eq!(tokens[9].kind, TokenKind::Const);
    assert_eq!(tokens[10].kind, TokenKind::Return);
    assert_eq!(tokens[11].kind, TokenKind::Pass);
    assert_eq!(tokens[12].kind, TokenKind::Break);
    assert_eq!(tokens[13].kind, TokenKind::Continue);
    assert_eq!(tokens[14].kind, TokenKind::Import);
    assert_eq!(tokens[15].kind, TokenKind::From);
    assert_eq!(tokens[16].kind, TokenKind::True);
    assert_eq!(tokens[17].kind, TokenKind::False);
    assert_eq!(tokens[18].kind, TokenKind::Nil);
    assert_eq!(tokens[19].kind, TokenKind::Newline);
    assert_eq!(tokens[20].kind, TokenKind::Eof);
}

#[test]
fn test_keyword_operators_carry_their_spelling() {
    let (tokens, errors) = tokenize("a and b or not c");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Operator);
    assert_eq!(tokens[1].text, "and");
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::Operator);
    assert_eq!(tokens[3].text, "or");
    assert_eq!(tokens[4].kind, TokenKind::Operator);
    assert_eq!(tokens[4].text, "not");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
}

#[test]
fn test_tokenize_numbers() {
    let (tokens, errors) = tokenize("42 3.14 0xFF 0b1010 1_000 2e10 5L");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].text, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].text, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
    assert_eq!(tokens[2].text, "0xFF");
    assert_eq!(tokens[3].kind, TokenKind::Integer);
    assert_eq!(tokens[3].text, "0b1010");
    assert_eq!(tokens[4].kind, TokenKind::Integer);
    assert_eq!(tokens[4].text, "1_000");
    assert_eq!(tokens[5].kind, TokenKind::Float);
    assert_eq!(tokens[5].text, "2e10");
    assert_eq!(tokens[6].kind, TokenKind::Integer);
    assert_eq!(tokens[6].text, "5L");
}

#[test]
fn test_invalid_numeric_literal() {
    let (tokens, errors) = tokenize("3.14q");
    let tokens = filter_trivia(tokens);

    assert_eq!(tokens[0].kind, TokenKind::Error);
    assert_eq!(tokens[0].text, "3.14q");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::InvalidNumericLiteral { .. }
    ));
}

#[test]
fn test_operator_runs_are_single_tokens() {
    let (tokens, _) = tokenize("a <=> b .+ c");
    let tokens = filter_trivia(tokens);

    assert_eq!(tokens[1].kind, TokenKind::Operator);
    assert_eq!(tokens[1].text, "<=>");
    assert_eq!(tokens[3].kind, TokenKind::Operator);
    assert_eq!(tokens[3].text, ".+");
}

#[test]
fn test_indentation_structure() {
    let source = "if x:\n    a\n    b\nc\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_indents_and_dedents_balance_at_eof() {
    // No trailing newline: the scanner still closes every open block.
    let source = "if a:\n  if b:\n    c";
    let produced = kinds(source);
    let indents = produced
        .iter()
        .filter(|kind| **kind == TokenKind::Indent)
        .count();
    let dedents = produced
        .iter()
        .filter(|kind| **kind == TokenKind::Dedent)
        .count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
    assert_eq!(produced.last(), Some(&TokenKind::Eof));
}

#[test]
fn test_blank_and_comment_lines_are_transparent() {
    let source = "if x:\n    a\n\n    # note\n    b\n";
    let produced = kinds(source);
    let indents = produced
        .iter()
        .filter(|kind| **kind == TokenKind::Indent)
        .count();
    let dedents = produced
        .iter()
        .filter(|kind| **kind == TokenKind::Dedent)
        .count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn test_block_comment_before_code_keeps_the_line_width() {
    // The indentation width is measured before the comment; the comment's
    // columns must not count into it.
    let source = "if x:\n    a\n    #[ note ]# b\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Eof,
        ]
    );

    let (tokens, _) = tokenize(source);
    let rebuilt: String = tokens.iter().map(|token| token.text.as_str()).collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn test_brackets_suppress_newlines() {
    let source = "f(a,\n  b)\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::CloseParen,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_backslash_continuation() {
    let source = "a + \\\nb\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_round_trip() {
    let source = "var x = 1  # count\nif x > 0:\n    f(\"hi {x:>3}\",\n      2)\n";
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty());

    let rebuilt: String = tokens.iter().map(|token| token.text.as_str()).collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn test_string_tokens() {
    let (tokens, errors) = tokenize("\"a\\n\\x41b\"");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::StringStart);
    assert_eq!(tokens[1].kind, TokenKind::StringContent);
    assert_eq!(tokens[1].text, "a");
    assert_eq!(tokens[2].kind, TokenKind::EscapeSequence);
    assert_eq!(tokens[2].text, "\\n");
    assert_eq!(tokens[3].kind, TokenKind::EscapeSequence);
    assert_eq!(tokens[3].text, "\\x41");
    assert_eq!(tokens[4].kind, TokenKind::StringContent);
    assert_eq!(tokens[4].text, "b");
    assert_eq!(tokens[5].kind, TokenKind::StringEnd);
}

#[test]
fn test_invalid_escape_sequence() {
    let (tokens, errors) = tokenize("\"a\\qb\"");
    let tokens = filter_trivia(tokens);

    assert_eq!(tokens[2].kind, TokenKind::Error);
    assert_eq!(tokens[2].text, "\\q");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::InvalidEscapeSequence { .. }
    ));
}

#[test]
fn test_interpolation_tokens() {
    let (tokens, errors) = tokenize("\"x {a + b} y\"");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::StringStart);
    assert_eq!(tokens[1].kind, TokenKind::StringContent);
    assert_eq!(tokens[1].text, "x ");
    assert_eq!(tokens[2].kind, TokenKind::OpenBrace);
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].kind, TokenKind::Operator);
    assert_eq!(tokens[4].text, "+");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[6].kind, TokenKind::CloseBrace);
    assert_eq!(tokens[7].kind, TokenKind::StringContent);
    assert_eq!(tokens[7].text, " y");
    assert_eq!(tokens[8].kind, TokenKind::StringEnd);
}

#[test]
fn test_nested_braces_inside_interpolation() {
    // The dictionary's `}` must not terminate the interpolation span.
    let (tokens, errors) = tokenize("\"{ {1: 2} }\"");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    let braces: Vec<TokenKind> = tokens
        .iter()
        .filter(|token| {
            matches!(token.kind, TokenKind::OpenBrace | TokenKind::CloseBrace)
        })
        .map(|token| token.kind)
        .collect();
    assert_eq!(
        braces,
        vec![
            TokenKind::OpenBrace,
            TokenKind::OpenBrace,
            TokenKind::CloseBrace,
            TokenKind::CloseBrace,
        ]
    );
    assert_eq!(tokens[tokens.len() - 3].kind, TokenKind::StringEnd);
}

#[test]
fn test_format_specifier() {
    let (tokens, errors) = tokenize("\"{a:>8}\"");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::StringStart);
    assert_eq!(tokens[1].kind, TokenKind::OpenBrace);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::Operator);
    assert_eq!(tokens[3].text, ":");
    assert_eq!(tokens[4].kind, TokenKind::FormatSpec);
    assert_eq!(tokens[4].text, ">8");
    assert_eq!(tokens[5].kind, TokenKind::CloseBrace);
    assert_eq!(tokens[6].kind, TokenKind::StringEnd);
}

#[test]
fn test_type_conversion() {
    let (tokens, errors) = tokenize("\"{a!r}\"");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::TypeConversion);
    assert_eq!(tokens[3].text, "!r");
    assert_eq!(tokens[4].kind, TokenKind::CloseBrace);
}

#[test]
fn test_triple_string_spans_lines() {
    let (tokens, errors) = tokenize("\"\"\"a\nb\"\"\"\n");
    let tokens = filter_trivia(tokens);
    assert!(errors.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::StringStart);
    assert_eq!(tokens[0].text, "\"\"\"");
    assert_eq!(tokens[1].kind, TokenKind::StringContent);
    assert_eq!(tokens[1].text, "a\nb");
    assert_eq!(tokens[2].kind, TokenKind::StringEnd);
    assert_eq!(tokens[2].text, "\"\"\"");
}

#[test]
fn test_unterminated_string() {
    let (tokens, errors) = tokenize("\"abc\nd\n");
    let tokens = filter_trivia(tokens);

    assert_eq!(tokens[0].kind, TokenKind::StringStart);
    assert_eq!(tokens[1].kind, TokenKind::StringContent);
    assert_eq!(tokens[2].kind, TokenKind::Error);
    assert_eq!(tokens[3].kind, TokenKind::Newline);
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind(), ErrorImpl::UnterminatedString));
}

#[test]
fn test_bracket_errors() {
    let (_, errors) = tokenize("a)\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::UnmatchedBracket { bracket: ')' }
    ));

    let (_, errors) = tokenize("(a\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::UnclosedBracket { bracket: '(' }
    ));
}

#[test]
fn test_inconsistent_dedent() {
    let (tokens, errors) = tokenize("if a:\n        b\n    c\n");
    let tokens = filter_trivia(tokens);

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::InconsistentDedent { width: 4 }
    ));
    // Recovery continues at the nearest enclosing level.
    let dedents = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Dedent)
        .count();
    assert_eq!(dedents, 1);
}

#[test]
fn test_tab_advances_to_next_multiple_of_eight() {
    let (tokens, _) = tokenize("if a:\n\tb\n");
    let tokens = filter_trivia(tokens);
    let indent = tokens
        .iter()
        .position(|token| token.kind == TokenKind::Indent);
    assert!(indent.is_some());

    // A tab then a space on the continuation line widens the indent.
    let (tokens, _) = tokenize("if a:\n\tb\n\t c\n");
    let tokens = filter_trivia(tokens);
    let indents = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Indent)
        .count();
    assert_eq!(indents, 2);
}
