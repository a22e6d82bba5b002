//! Per-row uniqueness inference for query expressions.
//!
//! Decides whether an expression is guaranteed to evaluate to a distinct
//! value for every underlying row, which lets the planner treat the value as
//! a grouping key and skip deduplication work. The inference is conservative:
//! answering `false` for an expression that happens to be unique only costs
//! performance, while answering `true` for one that is not would corrupt
//! results, so every doubtful case answers `false`.
//!
//! Path rules: a dereference is unique only when the terminal attribute, if
//! any, is the singular identifier of its entity AND every join hop between
//! the path's base node and its root likewise goes through a singular
//! identifier. A hop through an ordinary to-one association can map several
//! rows to the same target, so it destroys uniqueness even though it never
//! fans out.

use trellis_errors::{TrellisError, TrellisResult};
use trellis_expr::ast::{Expr, JoinForest, PathBase, PathExpr};
use trellis_expr::metamodel::Metamodel;

use crate::util::{attribute_is_unique, single_select_expr};

/// Returns `true` iff evaluating `expr` once per underlying row can never
/// produce the same value for two distinct rows.
///
/// Only value-producing cases are analyzable; handing a predicate case to
/// this function is a programming error reported as
/// [`TrellisError::UnsupportedExpressionKind`].
pub fn is_unique(
    metamodel: &dyn Metamodel,
    joins: &JoinForest,
    expr: &Expr,
) -> TrellisResult<bool> {
    match expr {
        Expr::Composite(children) => {
            // A multi-part value compares componentwise, and any non-unique
            // component can collide.
            if children.len() > 1 {
                return Ok(false);
            }
            is_unique(metamodel, joins, children.first())
        }
        Expr::Call(_) => Ok(false),
        Expr::Path(path) => path_is_unique(metamodel, joins, path),
        Expr::Subquery(query) => is_unique(metamodel, joins, single_select_expr(query)?),
        Expr::Parameter(_) => Ok(false),
        Expr::CaseWhen {
            branches,
            else_expr,
        } => {
            for branch in branches {
                if !is_unique(metamodel, joins, &branch.body)? {
                    return Ok(false);
                }
            }
            is_unique(metamodel, joins, else_expr)
        }
        Expr::Literal(_) => Ok(false),
        // NULL never compares equal to NULL, so two NULL results are never
        // duplicates under equality-based grouping.
        Expr::Null => Ok(true),
        Expr::Raw(_) => Ok(false),
        Expr::BinaryOp { .. }
        | Expr::UnaryOp { .. }
        | Expr::Between { .. }
        | Expr::In { .. }
        | Expr::Exists { .. }
        | Expr::IsNull { .. } => Err(TrellisError::UnsupportedExpressionKind {
            kind: expr.kind().into(),
            analysis: "uniqueness",
        }),
    }
}

fn path_is_unique(
    metamodel: &dyn Metamodel,
    joins: &JoinForest,
    path: &PathExpr,
) -> TrellisResult<bool> {
    let id = match path.base {
        PathBase::Node(id) => id,
        // A free alias has not been resolved against the join tree yet, so
        // nothing can be proven about it.
        PathBase::Alias(_) => return Ok(false),
    };
    if let Some(field) = &path.field {
        let node = joins.node(id);
        let attribute = metamodel.attribute(&node.entity, field)?;
        if !attribute_is_unique(attribute) {
            return Ok(false);
        }
    }
    for (parent, connecting) in joins.hops_to_root(id) {
        let attribute = metamodel.attribute(&parent.entity, connecting)?;
        if !attribute_is_unique(attribute) {
            return Ok(false);
        }
    }
    Ok(true)
}
