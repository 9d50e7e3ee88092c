//! Concrete syntax tree produced by the parser.
//!
//! Nodes carry a kind, a source span, optional named fields, and an ordered
//! child list. Trees are built bottom-up and never mutated after a node is
//! attached to its parent; a parent exclusively owns its children.

pub mod node;
