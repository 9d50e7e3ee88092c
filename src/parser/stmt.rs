use crate::{
    cst::node::{FieldName, NodeKind, SyntaxNode},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    expr::{self, LOWEST},
    parser::Parser,
    precedence::{self, Tier},
};

/// Parses every statement in the stream into a module node.
pub fn parse_module(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    while parser.has_tokens() {
        match parser.current_kind() {
            TokenKind::Newline => {
                parser.advance();
            }
            TokenKind::Indent | TokenKind::Dedent => {
                let found = parser.describe_current();
                let at = parser.current_span();
                parser.push_error(Error::new(ErrorImpl::MismatchedBlock { found }, at));
                parser.advance();
            }
            _ => {
                for statement in parse_statement(parser) {
                    span = span.join(statement.span());
                    children.push((None, statement));
                }
            }
        }
    }

    SyntaxNode::new(NodeKind::Module, span, children)
}

/// One source statement. Simple lines may hold several `;`-separated
/// statements, hence the vector.
pub fn parse_statement(parser: &mut Parser) -> Vec<SyntaxNode> {
    match parser.current_kind() {
        TokenKind::If => vec![parse_if(parser)],
        TokenKind::While => vec![parse_while(parser)],
        TokenKind::For => vec![parse_for(parser)],
        TokenKind::Proc | TokenKind::Func => vec![parse_function_definition(parser)],
        TokenKind::Var | TokenKind::Let | TokenKind::Const => vec![parse_declaration(parser)],
        TokenKind::Import => vec![parse_import(parser)],
        TokenKind::From => vec![parse_import_from(parser)],
        _ => parse_simple_line(parser),
    }
}

/// `a = 1; b = 2` up to and including the logical newline.
fn parse_simple_line(parser: &mut Parser) -> Vec<SyntaxNode> {
    let mut statements = Vec::new();

    loop {
        statements.push(parse_simple_statement(parser));
        if parser.eat(TokenKind::Semicolon).is_none() {
            break;
        }
        if matches!(
            parser.current_kind(),
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            break;
        }
    }

    if let Some(error) = end_line(parser) {
        statements.push(error);
    }
    statements
}

fn parse_simple_statement(parser: &mut Parser) -> SyntaxNode {
    match parser.current_kind() {
        TokenKind::Return => parse_return(parser),
        TokenKind::Pass => keyword_statement(parser, NodeKind::PassStatement),
        TokenKind::Break => keyword_statement(parser, NodeKind::BreakStatement),
        TokenKind::Continue => keyword_statement(parser, NodeKind::ContinueStatement),
        _ => parse_expression_statement(parser),
    }
}

fn keyword_statement(parser: &mut Parser, kind: NodeKind) -> SyntaxNode {
    let token = parser.advance();
    SyntaxNode::leaf(kind, token.text, token.span)
}

fn parse_return(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    if !matches!(
        parser.current_kind(),
        TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent | TokenKind::Eof
    ) {
        let value = parse_expression_list(parser, LOWEST);
        span = span.join(value.span());
        children.push((Some(FieldName::Value), value));
    }

    SyntaxNode::new(NodeKind::ReturnStatement, span, children)
}

/// Expression statement, assignment, or augmented assignment.
fn parse_expression_statement(parser: &mut Parser) -> SyntaxNode {
    let node = parse_right_hand_side(parser);
    match node.kind() {
        NodeKind::Assignment | NodeKind::AugmentedAssignment => node,
        _ => {
            let span = *node.span();
            SyntaxNode::new(NodeKind::ExpressionStatement, span, vec![(None, node)])
        }
    }
}

/// An expression list, optionally followed by an assignment tail. The tail
/// re-enters this function, so chained assignments nest to the right:
/// `x = y = z` reads as `x = (y = z)`.
fn parse_right_hand_side(parser: &mut Parser) -> SyntaxNode {
    if !parser.enter() {
        parser.leave();
        return parser.error_node(parser.current_span());
    }

    let left = parse_statement_expression_list(parser);

    let node = if parser.eat_operator("=").is_some() {
        let right = parse_right_hand_side(parser);
        let span = left.span().join(right.span());
        SyntaxNode::new(
            NodeKind::Assignment,
            span,
            vec![
                (Some(FieldName::Left), left),
                (Some(FieldName::Right), right),
            ],
        )
    } else if at_augmented_operator(parser) {
        let operator = parser.advance();
        let operator = SyntaxNode::leaf(NodeKind::OperatorToken, operator.text, operator.span);
        let right = parse_right_hand_side(parser);
        let span = left.span().join(right.span());
        SyntaxNode::new(
            NodeKind::AugmentedAssignment,
            span,
            vec![
                (Some(FieldName::Left), left),
                (Some(FieldName::Operator), operator),
                (Some(FieldName::Right), right),
            ],
        )
    } else {
        left
    };

    parser.leave();
    node
}

fn at_augmented_operator(parser: &Parser) -> bool {
    if !parser.at(TokenKind::Operator) {
        return false;
    }
    precedence::classify(&parser.current_token().text)
        .map(|spec| spec.tier == Tier::Assignment)
        .unwrap_or(false)
}

/// Comma-separated expressions collapse to the single expression when there
/// is no comma.
fn parse_expression_list(parser: &mut Parser, min: u8) -> SyntaxNode {
    parse_comma_separated(parser, |parser| expr::parse_expr(parser, min))
}

fn parse_statement_expression_list(parser: &mut Parser) -> SyntaxNode {
    parse_comma_separated(parser, expr::parse_statement_expr)
}

fn parse_comma_separated(
    parser: &mut Parser,
    mut element: impl FnMut(&mut Parser) -> SyntaxNode,
) -> SyntaxNode {
    let first = element(parser);
    if !parser.at(TokenKind::Comma) {
        return first;
    }

    let mut span = *first.span();
    let mut children = vec![(None, first)];
    while let Some(comma) = parser.eat(TokenKind::Comma) {
        span = span.join(&comma.span);
        if matches!(
            parser.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent | TokenKind::Eof
        ) {
            break;
        }
        let item = element(parser);
        span = span.join(item.span());
        children.push((None, item));
    }
    SyntaxNode::new(NodeKind::ExpressionList, span, children)
}

fn parse_if(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    let condition = expr::parse_expr(parser, LOWEST);
    span = span.join(condition.span());
    children.push((Some(FieldName::Condition), condition));
    parser.expect_operator(":");
    let consequence = parse_suite(parser);
    span = span.join(consequence.span());
    children.push((Some(FieldName::Consequence), consequence));

    while parser.at(TokenKind::Elif) {
        let elif_keyword = parser.advance();
        let condition = expr::parse_expr(parser, LOWEST);
        parser.expect_operator(":");
        let body = parse_suite(parser);
        let clause_span = elif_keyword.span.join(body.span());
        span = span.join(&clause_span);
        children.push((
            Some(FieldName::Alternative),
            SyntaxNode::new(
                NodeKind::ElifClause,
                clause_span,
                vec![
                    (Some(FieldName::Condition), condition),
                    (Some(FieldName::Consequence), body),
                ],
            ),
        ));
    }

    if parser.at(TokenKind::Else) {
        let clause = parse_else_clause(parser);
        span = span.join(clause.span());
        children.push((Some(FieldName::Alternative), clause));
    }

    SyntaxNode::new(NodeKind::IfStatement, span, children)
}

fn parse_else_clause(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    parser.expect_operator(":");
    let body = parse_suite(parser);
    let span = keyword.span.join(body.span());
    SyntaxNode::new(
        NodeKind::ElseClause,
        span,
        vec![(Some(FieldName::Body), body)],
    )
}

fn parse_while(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    let condition = expr::parse_expr(parser, LOWEST);
    span = span.join(condition.span());
    children.push((Some(FieldName::Condition), condition));
    parser.expect_operator(":");
    let body = parse_suite(parser);
    span = span.join(body.span());
    children.push((Some(FieldName::Body), body));

    if parser.at(TokenKind::Else) {
        let clause = parse_else_clause(parser);
        span = span.join(clause.span());
        children.push((Some(FieldName::Alternative), clause));
    }

    SyntaxNode::new(NodeKind::WhileStatement, span, children)
}

fn parse_for(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    let variables = parse_for_variables(parser);
    span = span.join(variables.span());
    children.push((Some(FieldName::Left), variables));

    parser.expect_operator("in");
    let iterable = parse_expression_list(parser, LOWEST);
    span = span.join(iterable.span());
    children.push((Some(FieldName::Right), iterable));

    parser.expect_operator(":");
    let body = parse_suite(parser);
    span = span.join(body.span());
    children.push((Some(FieldName::Body), body));

    SyntaxNode::new(NodeKind::ForStatement, span, children)
}

/// Loop variables are plain identifiers; parsing them as expressions would
/// swallow the `in` keyword as a comparison.
fn parse_for_variables(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    loop {
        match parser.expect(TokenKind::Identifier, "a loop variable") {
            Some(name) => {
                span = span.join(&name.span);
                children.push((
                    None,
                    SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span),
                ));
            }
            None => break,
        }
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    SyntaxNode::new(NodeKind::Variables, span, children)
}

fn parse_function_definition(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = vec![(
        None,
        SyntaxNode::leaf(NodeKind::Keyword, keyword.text, keyword.span),
    )];

    if let Some(name) = parser.expect(TokenKind::Identifier, "a function name") {
        span = span.join(&name.span);
        children.push((
            Some(FieldName::Name),
            SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span),
        ));
    }

    // A `*` directly after the name exports the symbol; only in this
    // position is the spelling an export marker rather than an operator.
    if parser.at_operator("*") {
        let star = parser.advance();
        span = span.join(&star.span);
        children.push((
            None,
            SyntaxNode::leaf(NodeKind::ExportMarker, star.text, star.span),
        ));
    }

    let parameters = parse_parameters(parser);
    span = span.join(parameters.span());
    children.push((Some(FieldName::Parameters), parameters));

    if parser.eat_operator(":").is_some() {
        let return_type = expr::parse_expr(parser, LOWEST);
        span = span.join(return_type.span());
        children.push((Some(FieldName::ReturnType), return_type));
    }

    parser.expect_operator("=");
    let body = parse_suite(parser);
    span = span.join(body.span());
    children.push((Some(FieldName::Body), body));

    SyntaxNode::new(NodeKind::FunctionDefinition, span, children)
}

fn parse_parameters(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    if parser.expect(TokenKind::OpenParen, "`(`").is_none() {
        return SyntaxNode::new(NodeKind::Parameters, span, children);
    }

    while parser.has_tokens() && !parser.at(TokenKind::CloseParen) {
        let parameter = parse_parameter(parser);
        span = span.join(parameter.span());
        children.push((None, parameter));
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    if let Some(close) = parser.expect(TokenKind::CloseParen, "`)`") {
        span = span.join(&close.span);
    }
    SyntaxNode::new(NodeKind::Parameters, span, children)
}

fn parse_parameter(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    if let Some(name) = parser.expect(TokenKind::Identifier, "a parameter name") {
        span = span.join(&name.span);
        children.push((
            Some(FieldName::Name),
            SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span),
        ));
    } else {
        // Cannot make sense of this parameter; let the list loop resync on
        // the next comma or the closing paren.
        let error = parser.error_node(span);
        return error;
    }

    if parser.eat_operator(":").is_some() {
        let parameter_type = expr::parse_expr(parser, LOWEST);
        span = span.join(parameter_type.span());
        children.push((Some(FieldName::Type), parameter_type));
    }
    if parser.eat_operator("=").is_some() {
        let default = expr::parse_expr(parser, LOWEST);
        span = span.join(default.span());
        children.push((Some(FieldName::Value), default));
    }

    SyntaxNode::new(NodeKind::Parameter, span, children)
}

/// `var`, `let` and `const` declarations in both spellings:
///
/// ```text
/// var x = 1
/// var
///     x = 1
///     y: int
/// ```
fn parse_declaration(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let requires_value = keyword.kind == TokenKind::Const;
    let mut span = keyword.span;
    let mut children = vec![(
        None,
        SyntaxNode::leaf(NodeKind::Keyword, keyword.text, keyword.span),
    )];

    if parser.at(TokenKind::Newline) && parser.peek_token().kind == TokenKind::Indent {
        parser.advance();
        parser.advance();
        while parser.has_tokens() && !parser.at(TokenKind::Dedent) {
            if parser.at(TokenKind::Newline) {
                parser.advance();
                continue;
            }
            let before = parser.position();
            let entry = parse_declaration_entry(parser, requires_value);
            span = span.join(entry.span());
            children.push((None, entry));
            if let Some(error) = end_line(parser) {
                span = span.join(error.span());
                children.push((None, error));
            }
            if parser.position() == before {
                // No progress; bail out of the section entirely.
                let skipped = parser.recover_statement(parser.current_span());
                span = span.join(&skipped);
                children.push((None, parser.error_node(skipped)));
            }
        }
        if let Some(dedent) = parser.expect(TokenKind::Dedent, "the end of the declaration block")
        {
            span = span.join(&dedent.span);
        }
    } else {
        let entry = parse_declaration_entry(parser, requires_value);
        span = span.join(entry.span());
        children.push((None, entry));
        if let Some(error) = end_line(parser) {
            span = span.join(error.span());
            children.push((None, error));
        }
    }

    SyntaxNode::new(NodeKind::Declaration, span, children)
}

fn parse_declaration_entry(parser: &mut Parser, requires_value: bool) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    loop {
        match parser.expect(TokenKind::Identifier, "a name to declare") {
            Some(name) => {
                span = span.join(&name.span);
                children.push((
                    Some(FieldName::Name),
                    SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span),
                ));
            }
            None => break,
        }
        if parser.at_operator("*") {
            let star = parser.advance();
            span = span.join(&star.span);
            children.push((
                None,
                SyntaxNode::leaf(NodeKind::ExportMarker, star.text, star.span),
            ));
        }
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    if parser.eat_operator(":").is_some() {
        let entry_type = expr::parse_expr(parser, LOWEST);
        span = span.join(entry_type.span());
        children.push((Some(FieldName::Type), entry_type));
    }

    if parser.eat_operator("=").is_some() {
        let value = parse_expression_list(parser, LOWEST);
        span = span.join(value.span());
        children.push((Some(FieldName::Value), value));
    } else if requires_value {
        parser.push_unexpected("`=` (constants need a value)");
    }

    SyntaxNode::new(NodeKind::DeclarationEntry, span, children)
}

fn parse_import(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    loop {
        let name = parse_dotted_name(parser);
        let name = parse_alias_tail(parser, name);
        span = span.join(name.span());
        children.push((Some(FieldName::Name), name));
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    let mut node = SyntaxNode::new(NodeKind::ImportStatement, span, children);
    if let Some(error) = end_line(parser) {
        let span = node.span().join(error.span());
        node = SyntaxNode::new(NodeKind::ImportStatement, span, vec![(None, node), (None, error)]);
    }
    node
}

fn parse_import_from(parser: &mut Parser) -> SyntaxNode {
    let keyword = parser.advance();
    let mut span = keyword.span;
    let mut children = Vec::new();

    let module = parse_dotted_name(parser);
    span = span.join(module.span());
    children.push((Some(FieldName::ModuleName), module));

    parser.expect(TokenKind::Import, "`import`");

    loop {
        match parser.expect(TokenKind::Identifier, "an imported name") {
            Some(name) => {
                let name = SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span);
                let name = parse_alias_tail(parser, name);
                span = span.join(name.span());
                children.push((Some(FieldName::Name), name));
            }
            None => break,
        }
        if let Some(comma) = parser.eat(TokenKind::Comma) {
            span = span.join(&comma.span);
        } else {
            break;
        }
    }

    let mut node = SyntaxNode::new(NodeKind::ImportFromStatement, span, children);
    if let Some(error) = end_line(parser) {
        let span = node.span().join(error.span());
        node = SyntaxNode::new(
            NodeKind::ImportFromStatement,
            span,
            vec![(None, node), (None, error)],
        );
    }
    node
}

/// Wraps an imported name into an aliased import when an `as` clause
/// follows.
fn parse_alias_tail(parser: &mut Parser, name: SyntaxNode) -> SyntaxNode {
    if !parser.at(TokenKind::As) {
        return name;
    }

    let keyword = parser.advance();
    let mut span = name.span().join(&keyword.span);
    let mut children = vec![(Some(FieldName::Name), name)];
    if let Some(alias) = parser.expect(TokenKind::Identifier, "an alias") {
        span = span.join(&alias.span);
        children.push((
            Some(FieldName::Alias),
            SyntaxNode::leaf(NodeKind::Identifier, alias.text, alias.span),
        ));
    }
    SyntaxNode::new(NodeKind::AliasedImport, span, children)
}

fn parse_dotted_name(parser: &mut Parser) -> SyntaxNode {
    let mut span = parser.current_span();
    let mut children = Vec::new();

    loop {
        match parser.expect(TokenKind::Identifier, "a module name") {
            Some(name) => {
                span = span.join(&name.span);
                children.push((
                    None,
                    SyntaxNode::leaf(NodeKind::Identifier, name.text, name.span),
                ));
            }
            None => break,
        }
        if parser.at_operator(".") {
            let dot = parser.advance();
            span = span.join(&dot.span);
        } else {
            break;
        }
    }

    SyntaxNode::new(NodeKind::DottedName, span, children)
}

/// The body of a compound statement: either inline on the same line, or a
/// newline followed by an indented block closed by exactly one dedent.
fn parse_suite(parser: &mut Parser) -> SyntaxNode {
    if !parser.at(TokenKind::Newline) {
        let mut span = parser.current_span();
        let mut children = Vec::new();
        for statement in parse_simple_line(parser) {
            span = span.join(statement.span());
            children.push((None, statement));
        }
        return SyntaxNode::new(NodeKind::Block, span, children);
    }

    let newline = parser.advance();
    let mut span = newline.span;

    if parser.eat(TokenKind::Indent).is_none() {
        parser.push_error(Error::new(ErrorImpl::ExpectedIndentedBlock, span));
        return SyntaxNode::new(
            NodeKind::Block,
            span,
            vec![(None, parser.error_node(span))],
        );
    }

    let mut children = Vec::new();
    while parser.has_tokens() && !parser.at(TokenKind::Dedent) {
        if parser.at(TokenKind::Newline) {
            parser.advance();
            continue;
        }
        let before = parser.position();
        for statement in parse_statement(parser) {
            span = span.join(statement.span());
            children.push((None, statement));
        }
        if parser.position() == before {
            let skipped = parser.recover_statement(parser.current_span());
            span = span.join(&skipped);
            children.push((None, parser.error_node(skipped)));
        }
    }

    match parser.eat(TokenKind::Dedent) {
        Some(dedent) => span = span.join(&dedent.span),
        None => {
            let found = parser.describe_current();
            let at = parser.current_span();
            parser.push_error(Error::new(ErrorImpl::MismatchedBlock { found }, at));
        }
    }

    SyntaxNode::new(NodeKind::Block, span, children)
}

/// Consumes the logical newline ending a statement. Dedent and end of input
/// also close a line. Anything else is skipped to the next boundary and
/// returned as an error node, with a diagnostic recorded.
fn end_line(parser: &mut Parser) -> Option<SyntaxNode> {
    match parser.current_kind() {
        TokenKind::Newline => {
            parser.advance();
            None
        }
        TokenKind::Dedent | TokenKind::Eof => None,
        _ => {
            parser.push_unexpected("a newline");
            let skipped = parser.recover_statement(parser.current_span());
            Some(parser.error_node(skipped))
        }
    }
}
