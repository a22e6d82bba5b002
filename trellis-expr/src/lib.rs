//! Expression AST, traversal infrastructure, and the static metamodel that
//! trellis's semantic analyses and rewrites operate over.
//!
//! The AST ([`ast::Expr`]) is a closed sum type: every expression a query
//! builder can produce is one of its cases, and consumers are expected to
//! match exhaustively. Traversal lives in [`analysis::visit`] (read-only) and
//! [`analysis::visit_mut`] (mutating); the metamodel ([`metamodel`]) answers
//! the attribute-level questions the analyses ask.

pub mod analysis;
pub mod ast;
pub mod metamodel;
