//! Attribute and query facts shared by the analysis passes.

use trellis_errors::{TrellisError, TrellisResult};
use trellis_expr::ast::{Expr, SelectQuery};
use trellis_expr::metamodel::Attribute;

/// A path hop preserves per-row uniqueness only when it goes through the
/// singular identifier of its entity.
pub(crate) fn attribute_is_unique(attribute: &Attribute) -> bool {
    attribute.is_id && !attribute.is_collection()
}

/// A path hop can introduce NULLs when it fans out to a collection or is
/// declared optional.
pub(crate) fn attribute_is_nullable(attribute: &Attribute) -> bool {
    attribute.is_collection() || attribute.is_optional
}

/// The single select expression a scalar subquery must expose before either
/// analysis will look at it.
pub(crate) fn single_select_expr(query: &SelectQuery) -> TrellisResult<&Expr> {
    let columns = query.select_arity();
    if columns != 1 {
        return Err(TrellisError::MultiColumnSubquery { columns });
    }
    Ok(query.select.first())
}
