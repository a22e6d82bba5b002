//! Inlines correlated expressions in place of their free alias.
//!
//! A correlation provider names the expression it correlates on with an
//! alias; when the provider's query is merged into the outer query, every
//! bare reference to that alias must become a deep copy of the expression
//! itself. The rewrite mutates the tree in place in a single pre-order sweep
//! and never re-enters a copy it has just spliced in, so a replacement that
//! mentions the alias does not recurse.
//!
//! LIKE predicates are the documented exception: their operand slots are
//! kept as written, because patterns are rendered verbatim downstream.
//! Anything beneath the operands is still swept.

use std::convert::Infallible;

use trellis_errors::TrellisResult;
use trellis_expr::analysis::visit_mut::{self, VisitorMut};
use trellis_expr::ast::{Expr, SelectQuery};

use crate::TransformerStage;

/// Replaces every bare reference to `alias` under `tree` with a deep copy of
/// `replacement`, returning how many copies were spliced in. A bare reference
/// at the root replaces the whole tree.
pub fn replace_subexpression(tree: &mut Expr, alias: &str, replacement: &Expr) -> usize {
    let mut replacer = AliasReplacer {
        alias,
        replacement,
        replaced: 0,
    };
    if let Err(never) = replacer.visit_expr(tree) {
        match never {}
    }
    replacer.replaced
}

/// [`replace_subexpression`] over every expression position of a query:
/// select items, WHERE, GROUP BY, and HAVING.
pub fn replace_in_query(query: &mut SelectQuery, alias: &str, replacement: &Expr) -> usize {
    let mut replacer = AliasReplacer {
        alias,
        replacement,
        replaced: 0,
    };
    if let Err(never) = replacer.visit_select_query(query) {
        match never {}
    }
    replacer.replaced
}

struct AliasReplacer<'a> {
    alias: &'a str,
    replacement: &'a Expr,
    replaced: usize,
}

impl<'ast, 'a> VisitorMut<'ast> for AliasReplacer<'a> {
    type Error = Infallible;

    fn visit_expr(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
        match expr {
            Expr::Path(path) if path.is_free_alias(self.alias) => {
                *expr = self.replacement.clone();
                self.replaced += 1;
                // Returning without walking keeps the sweep out of the copy
                // just spliced in.
                Ok(())
            }
            Expr::BinaryOp { lhs, op, rhs } if op.is_like() => {
                sweep_like_operand(self, lhs.as_mut())?;
                sweep_like_operand(self, rhs.as_mut())
            }
            _ => visit_mut::walk_expr(self, expr),
        }
    }
}

/// Visits the children of a LIKE operand without offering the operand itself
/// for replacement. Nested LIKE predicates keep the exemption for their own
/// operands.
fn sweep_like_operand<'ast>(
    replacer: &mut AliasReplacer<'_>,
    expr: &'ast mut Expr,
) -> Result<(), Infallible> {
    match expr {
        Expr::BinaryOp { lhs, op, rhs } if op.is_like() => {
            sweep_like_operand(replacer, lhs.as_mut())?;
            sweep_like_operand(replacer, rhs.as_mut())
        }
        _ => visit_mut::walk_expr(replacer, expr),
    }
}

/// Pipeline stage that splices a correlated expression into the query
/// wherever its alias appears.
pub struct AliasInlineStage {
    alias: String,
    replacement: Expr,
}

impl AliasInlineStage {
    pub fn new(alias: impl Into<String>, replacement: Expr) -> Self {
        Self {
            alias: alias.into(),
            replacement,
        }
    }
}

impl TransformerStage for AliasInlineStage {
    fn name(&self) -> &'static str {
        "inline_alias"
    }

    fn apply(&mut self, query: &mut SelectQuery) -> TrellisResult<()> {
        replace_in_query(query, &self.alias, &self.replacement);
        Ok(())
    }
}
