//! Integration tests for the whole frontend.
//!
//! These tests drive the public surface end to end: scanning a complete
//! program, parsing it into a tree, round-tripping the raw token stream,
//! and rendering diagnostics against the source.

use frontend::{
    cst::node::{FieldName, NodeKind},
    lexer::scanner::tokenize,
    parser::parser::parse_source,
    render_error,
};

const PROGRAM: &str = "\
import strutils

const greeting = \"hello\"

proc shout*(name: string): string =
    return greeting & \" {name}!\"

var count = 0
while count < 3:
    if count mod 2 == 0:
        shout(\"even\")
    else:
        pass
    count += 1
";

#[test]
fn test_parse_full_program() {
    let (module, errors) = parse_source(PROGRAM);
    assert!(errors.is_empty(), "unexpected diagnostics: {:?}", errors);

    assert_eq!(module.kind(), NodeKind::Module);
    assert_eq!(module.child_count(), 5);
    assert_eq!(module.child(0).unwrap().kind(), NodeKind::ImportStatement);
    assert_eq!(module.child(1).unwrap().kind(), NodeKind::Declaration);
    assert_eq!(
        module.child(2).unwrap().kind(),
        NodeKind::FunctionDefinition
    );
    assert_eq!(module.child(3).unwrap().kind(), NodeKind::Declaration);
    assert_eq!(module.child(4).unwrap().kind(), NodeKind::WhileStatement);
    assert!(!module.has_errors());
}

#[test]
fn test_full_program_round_trips() {
    let (tokens, errors) = tokenize(PROGRAM);
    assert!(errors.is_empty());

    let rebuilt: String = tokens.iter().map(|token| token.text.as_str()).collect();
    assert_eq!(rebuilt, PROGRAM);
}

#[test]
fn test_function_body_structure() {
    let (module, _) = parse_source(PROGRAM);
    let function = module.child(2).unwrap();

    assert_eq!(
        function.field(FieldName::Name).unwrap().text(),
        "shout"
    );
    let body = function.field(FieldName::Body).unwrap();
    assert_eq!(body.kind(), NodeKind::Block);
    assert_eq!(body.child(0).unwrap().kind(), NodeKind::ReturnStatement);

    // The returned expression concatenates a constant with an
    // interpolated string literal.
    let value = body
        .child(0)
        .unwrap()
        .field(FieldName::Value)
        .unwrap();
    assert_eq!(value.kind(), NodeKind::BinaryOperator);
    assert_eq!(
        value.field(FieldName::Operator).unwrap().text(),
        "&"
    );
    assert_eq!(
        value.field(FieldName::Right).unwrap().kind(),
        NodeKind::String
    );
}

#[test]
fn test_diagnostics_survive_recovery() {
    let source = "var total = 0\ntotal += )\ntotal += 2\n";
    let (module, errors) = parse_source(source);

    assert!(!errors.is_empty());
    assert!(module.has_errors());

    // The statements around the malformed one still parse.
    assert_eq!(module.child(0).unwrap().kind(), NodeKind::Declaration);
    assert_eq!(
        module.child(module.child_count() - 1).unwrap().kind(),
        NodeKind::AugmentedAssignment
    );
}

#[test]
fn test_render_error_points_at_the_offence() {
    let source = "let a = (1]\n";
    let (_, errors) = parse_source(source);
    assert!(!errors.is_empty());

    let rendered = render_error(&errors[0], source, "final.lang");
    assert!(rendered.contains("final.lang"));
    assert!(rendered.contains("let a = (1]"));
    assert!(rendered.contains('^'));
}
