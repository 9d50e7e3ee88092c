use crate::{
    cst::node::{FieldName, NodeKind, SyntaxNode},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    parser::Parser,
    precedence::{self, Arity, Assoc, Tier},
};

/// Lowest binding power; parse a whole expression from here.
pub const LOWEST: u8 = 0;

/// Precedence climbing. Parses an operand, then folds in binary operators
/// whose tier is at least `min`. Left-associative operators take their right
/// operand one tier tighter; right-associative operators take it at the same
/// tier, so `a ^ b ^ c` groups to the right.
pub fn parse_expr(parser: &mut Parser, min: u8) -> SyntaxNode {
    parse_expr_inner(parser, min, false)
}

/// An expression in statement position. The climb refuses to fold an
/// assignment-tier spelling, so `=` and the augmented operators stay visible
/// to the statement layer; every other tier, arrows included, parses as
/// usual.
pub fn parse_statement_expr(parser: &mut Parser) -> SyntaxNode {
    parse_expr_inner(parser, LOWEST, true)
}

fn parse_expr_inner(parser: &mut Parser, min: u8, in_statement: bool) -> SyntaxNode {
    if !parser.enter() {
        parser.leave();
        return parser.error_node(parser.current_span());
    }

    let mut left = parse_operand(parser);

    while parser.at(TokenKind::Operator) {
        let spelling = parser.current_token().text.clone();
        // Bare `=` and `:` are structural; statements and primaries consume
        // them, the expression grammar never does.
        if spelling == "=" || spelling == ":" {
            break;
        }
        let spec = match precedence::classify(&spelling) {
            Some(spec) => spec,
            None => break,
        };
        if spec.arity == Arity::UnaryOnly {
            break;
        }
        if in_statement && spec.tier == Tier::Assignment {
            break;
        }
        let tier = spec.tier.power();
        if tier < min {
            break;
        }

        let operator = parser.advance();
        let operator = SyntaxNode::leaf(NodeKind::OperatorToken, operator.text, operator.span);
        let next_min = match spec.assoc {
            Assoc::Left => tier + 1,
            Assoc::Right => tier,
        };
        let right = parse_expr(parser, next_min);
        let span = left.span().join(right.span());
        left = SyntaxNode::new(
            NodeKind::BinaryOperator,
            span,
            vec![
                (Some(FieldName::Left), left),
                (Some(FieldName::Operator), operator),
                (Some(FieldName::Right), right),
            ],
        );
    }

    parser.leave();
    left
}

/// A prefix-operator chain applied to a primary. The operand of a prefix
/// operator is parsed one tier tighter than the operator itself, which keeps
/// `not a in b` grouped as `(not a) in b`.
fn parse_operand(parser: &mut Parser) -> SyntaxNode {
    if parser.at(TokenKind::Operator) {
        let spelling = parser.current_token().text.clone();
        if spelling != "=" && spelling != ":" {
            if let Some(spec) = precedence::classify(&spelling) {
                let operator = parser.advance();
                let operator =
                    SyntaxNode::leaf(NodeKind::OperatorToken, operator.text, operator.span);
                let operand = parse_expr(parser, spec.tier.power() + 1);
                let span = operator.span().join(operand.span());
                return SyntaxNode::new(
                    NodeKind::UnaryOperator,
                    span,
                    vec![
                        (Some(FieldName::Operator), operator),
                        (Some(FieldName::Right), operand),
                    ],
                );
            }
        }
    }

    let primary = parse_primary(parser);
    parse_postfix(parser, primary)
}

fn parse_primary(parser: &mut Parser) -> SyntaxNode {
    match parser.current_kind() {
        TokenKind::Identifier => leaf(parser, NodeKind::Identifier),
        TokenKind::Integer => leaf(parser, NodeKind::Integer),
        TokenKind::Float => leaf(parser, NodeKind::Float),
        TokenKind::True => leaf(parser, NodeKind::True),
        TokenKind::False => leaf(parser, NodeKind::False),
        TokenKind::Nil => leaf(parser, NodeKind::Nil),
        TokenKind::StringStart => parse_string(parser),
        TokenKind::OpenParen => parse_paren(parser),
        TokenKind::OpenBracket => parse_list(parser),
        TokenKind::OpenBrace => parse_brace(parser),
        TokenKind::Error => {
            // The scanner already recorded a diagnostic for this span.
            let token = parser.advance();
            parser.error_node(token.span)
        }
        _ => {
            let found = parser.describe_current();
            let span = parser.current_span();
            parser.push_error(Error::new(ErrorImpl::ExpectedExpression { found }, span));
            parser.error_node(span)
        }
    }
}

fn leaf(parser: &mut Parser, kind: NodeKind) -> SyntaxNode {
    let token = parser.advance();
    SyntaxNode::leaf(kind, token.text, token.span)
}

/// Calls, subscripts and attribute access bind tighter than every operator
/// tier, so they are folded in before climbing starts.
fn parse_postfix(parser: &mut Parser, mut node: SyntaxNode) -> SyntaxNode {
    loop {
        match parser.current_kind() {
            TokenKind::OpenParen => {
                let arguments = parse_argument_list(parser);
                let span = node.span().join(arguments.span());
                node = SyntaxNode::new(
                    NodeKind::Call,
                    span,
                    vec![
                        (Some(FieldName::Function), node),
                        (Some(FieldName::Arguments), arguments),
                    ],
                );
            }
            TokenKind::OpenBracket => {
                let subscript = parse_subscript(parser);
                let span = node.span().join(subscript.span());
                node = SyntaxNode::new(
                    NodeKind::Subscript,
                    span,
                    vec![
                        (Some(FieldName::Object), node),
                        (Some(FieldName::Subscript), subscript),
                    ],
                );
            }
            TokenKind::Operator
                if parser.at_operator(".") && parser.peek_token().kind == TokenKind::Identifier =>
            {
                parser.advance();
                let name = leaf(parser, NodeKind::Identifier);
                let span = node.span().join(name.span());
                node = SyntaxNode::new(
                    NodeKind::Attribute,
                    span,
                    vec![
                        (Some(FieldName::Object), node),
                        (Some(FieldName::Attribute), name),
                    ],
                );
            }
            _ => break,
        }
    }
    node
}

fn parse_argument_list(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;
    let mut children = Vec::new();

    while parser.has_tokens() && !parser.at(TokenKind::CloseParen) {
        let argument = parse_argument(parser);
        span = span.join(argument.span());
        children.push((None, argument));
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    if let Some(close) = parser.expect(TokenKind::CloseParen, "`)`") {
        span = span.join(&close.span);
    }
    SyntaxNode::new(NodeKind::ArgumentList, span, children)
}

fn parse_argument(parser: &mut Parser) -> SyntaxNode {
    if parser.at(TokenKind::Identifier) && parser.peek_token().is_operator("=") {
        let name = leaf(parser, NodeKind::Identifier);
        parser.advance();
        let value = parse_expr(parser, LOWEST);
        let span = name.span().join(value.span());
        return SyntaxNode::new(
            NodeKind::KeywordArgument,
            span,
            vec![
                (Some(FieldName::Name), name),
                (Some(FieldName::Value), value),
            ],
        );
    }
    parse_expr(parser, LOWEST)
}

fn parse_subscript(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;
    let mut children: Vec<(Option<FieldName>, SyntaxNode)> = Vec::new();
    let mut is_slice = false;

    // `a[x]`, `a[x:y]`, `a[:y:z]` and friends; absent slice parts stay
    // absent rather than becoming error nodes.
    loop {
        if !parser.at_operator(":")
            && !parser.at(TokenKind::CloseBracket)
            && parser.has_tokens()
        {
            let part = parse_expr(parser, LOWEST);
            span = span.join(part.span());
            children.push((None, part));
        }
        if let Some(colon) = parser.eat_operator(":") {
            span = span.join(&colon.span);
            is_slice = true;
        } else {
            break;
        }
    }

    if let Some(close) = parser.expect(TokenKind::CloseBracket, "`]`") {
        span = span.join(&close.span);
    }
    if is_slice {
        SyntaxNode::new(NodeKind::Slice, span, children)
    } else if children.len() == 1 {
        let (_, only) = children.remove(0);
        only
    } else {
        SyntaxNode::new(NodeKind::ExpressionList, span, children)
    }
}

fn parse_paren(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;

    if parser.at(TokenKind::CloseParen) {
        let close = parser.advance();
        return SyntaxNode::new(NodeKind::Tuple, span.join(&close.span), Vec::new());
    }

    let first = parse_expr(parser, LOWEST);
    span = span.join(first.span());

    if parser.at(TokenKind::Comma) {
        let mut children = vec![(None, first)];
        while let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
            if parser.at(TokenKind::CloseParen) {
                break;
            }
            let element = parse_expr(parser, LOWEST);
            span = span.join(element.span());
            children.push((None, element));
        }
        if let Some(close) = parser.expect(TokenKind::CloseParen, "`)`") {
            span = span.join(&close.span);
        }
        return SyntaxNode::new(NodeKind::Tuple, span, children);
    }

    if let Some(close) = parser.expect(TokenKind::CloseParen, "`)`") {
        span = span.join(&close.span);
    }
    SyntaxNode::new(NodeKind::ParenthesizedExpression, span, vec![(None, first)])
}

fn parse_list(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;
    let mut children = Vec::new();

    while parser.has_tokens() && !parser.at(TokenKind::CloseBracket) {
        let element = parse_expr(parser, LOWEST);
        span = span.join(element.span());
        children.push((None, element));
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    if let Some(close) = parser.expect(TokenKind::CloseBracket, "`]`") {
        span = span.join(&close.span);
    }
    SyntaxNode::new(NodeKind::List, span, children)
}

/// `{}` is an empty dictionary; the first element decides between a
/// dictionary (key-value pairs) and a set.
fn parse_brace(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;

    if parser.at(TokenKind::CloseBrace) {
        let close = parser.advance();
        return SyntaxNode::new(NodeKind::Dictionary, span.join(&close.span), Vec::new());
    }

    let first = parse_expr(parser, LOWEST);
    span = span.join(first.span());
    let is_dictionary = parser.at_operator(":");

    let mut children = Vec::new();
    if is_dictionary {
        parser.advance();
        let value = parse_expr(parser, LOWEST);
        span = span.join(value.span());
        let pair_span = first.span().join(value.span());
        children.push((
            None,
            SyntaxNode::new(
                NodeKind::Pair,
                pair_span,
                vec![
                    (Some(FieldName::Key), first),
                    (Some(FieldName::Value), value),
                ],
            ),
        ));
    } else {
        children.push((None, first));
    }

    while let Some(comma) = parser.eat(TokenKind::Comma) {
        span = span.join(&comma.span);
        if parser.at(TokenKind::CloseBrace) {
            break;
        }
        let element = parse_expr(parser, LOWEST);
        span = span.join(element.span());
        if is_dictionary {
            parser.expect_operator(":");
            let value = parse_expr(parser, LOWEST);
            span = span.join(value.span());
            let pair_span = element.span().join(value.span());
            children.push((
                None,
                SyntaxNode::new(
                    NodeKind::Pair,
                    pair_span,
                    vec![
                        (Some(FieldName::Key), element),
                        (Some(FieldName::Value), value),
                    ],
                ),
            ));
        } else {
            children.push((None, element));
        }
    }

    if let Some(close) = parser.expect(TokenKind::CloseBrace, "`}`") {
        span = span.join(&close.span);
    }
    let kind = if is_dictionary {
        NodeKind::Dictionary
    } else {
        NodeKind::Set
    };
    SyntaxNode::new(kind, span, children)
}

/// A string literal, including its interpolations. The scanner has already
/// split the literal into content runs, escape sequences and brace-delimited
/// expression token streams; here the expression parser is re-entered for
/// each interpolation.
pub fn parse_string(parser: &mut Parser) -> SyntaxNode {
    let start = parser.advance();
    let mut span = start.span;
    let mut children = Vec::new();

    loop {
        match parser.current_kind() {
            TokenKind::StringContent => {
                let content = leaf(parser, NodeKind::StringContent);
                span = span.join(content.span());
                children.push((None, content));
            }
            TokenKind::EscapeSequence => {
                let escape = leaf(parser, NodeKind::EscapeSequence);
                span = span.join(escape.span());
                children.push((None, escape));
            }
            TokenKind::OpenBrace => {
                let interpolation = parse_interpolation(parser);
                span = span.join(interpolation.span());
                children.push((None, interpolation));
            }
            TokenKind::StringEnd => {
                let end = parser.advance();
                span = span.join(&end.span);
                break;
            }
            TokenKind::Error => {
                // Unterminated string; the scanner recorded the diagnostic.
                let token = parser.advance();
                span = span.join(&token.span);
                children.push((None, parser.error_node(token.span)));
                break;
            }
            _ => break,
        }
    }

    SyntaxNode::new(NodeKind::String, span, children)
}

/// `{expr}`, `{expr!conversion}`, `{expr:format}` or both suffixes at once.
fn parse_interpolation(parser: &mut Parser) -> SyntaxNode {
    let open = parser.advance();
    let mut span = open.span;
    let mut children = Vec::new();

    let expression = parse_expr(parser, LOWEST);
    span = span.join(expression.span());
    children.push((Some(FieldName::Expression), expression));

    if parser.at(TokenKind::TypeConversion) {
        let conversion = leaf(parser, NodeKind::TypeConversion);
        span = span.join(conversion.span());
        children.push((None, conversion));
    }

    if let Some(colon) = parser.eat_operator(":") {
        span = span.join(&colon.span);
        let specifier = parse_format_specifier(parser);
        span = span.join(specifier.span());
        children.push((None, specifier));
    }

    if let Some(close) = parser.expect(TokenKind::CloseBrace, "`}`") {
        span = span.join(&close.span);
    }
    SyntaxNode::new(NodeKind::Interpolation, span, children)
}

/// The text after the `:` of an interpolation, itself allowing nested
/// `{expr}` holes (`{value:{width}d}`).
fn parse_format_specifier(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    loop {
        match parser.current_kind() {
            TokenKind::FormatSpec => {
                let text = leaf(parser, NodeKind::StringContent);
                span = span.join(text.span());
                children.push((None, text));
            }
            TokenKind::OpenBrace => {
                let open = parser.advance();
                let expression = parse_expr(parser, LOWEST);
                let mut inner_span = open.span.join(expression.span());
                if let Some(close) = parser.expect(TokenKind::CloseBrace, "`}`") {
                    inner_span = inner_span.join(&close.span);
                }
                span = span.join(&inner_span);
                children.push((
                    None,
                    SyntaxNode::new(
                        NodeKind::FormatExpression,
                        inner_span,
                        vec![(Some(FieldName::Expression), expression)],
                    ),
                ));
            }
            _ => break,
        }
    }

    SyntaxNode::new(NodeKind::FormatSpecifier, span, children)
}
