//! Error types and error handling for the lexer and parser.
//!
//! This module defines the error types used throughout the front end.
//! It includes:
//!
//! - Error structures with source span information
//! - Lexical error variants (scanner-level)
//! - Structural error variants (parser-level)
//! - Error formatting and helpful suggestions

pub mod errors;
