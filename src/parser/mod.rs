//! Parser module for building the concrete syntax tree.
//!
//! This module contains the parser that transforms the scanner's token
//! stream into a concrete syntax tree. Expressions use precedence climbing
//! driven by the operator classifier: an operator's precedence tier and
//! associativity are computed from its literal spelling, not looked up by a
//! fixed symbol. It handles:
//!
//! - Expression parsing (binary/unary operators, calls, subscripts, strings)
//! - String interpolation by recursive re-entry into the expression parser
//! - Statement parsing and the suite assembler (inline and indented forms)
//! - Error recovery at statement boundaries with explicit error nodes

pub mod expr;
pub mod parser;
pub mod precedence;
pub mod stmt;
