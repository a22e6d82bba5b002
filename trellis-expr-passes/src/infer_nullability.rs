//! Nullability inference for query expressions.
//!
//! Computes whether an expression can ever evaluate to NULL, given the join
//! tree it is evaluated against and the metadata oracle describing the
//! attributes it dereferences. A `false` answer lets the planner drop NULL
//! handling, for example joining on the value directly instead of routing it
//! through a COALESCE guard, so the inference must never claim non-nullable
//! for an expression that can in fact produce NULL. The reverse direction
//! only costs performance, and the rules below answer `true` whenever a
//! guarantee cannot be given.
//!
//! Key rules:
//! - A path is nullable when its terminal attribute is optional or a
//!   collection, or when any join hop between its base node and the root goes
//!   through such an attribute (an optional association NULL-extends every
//!   attribute reached through it).
//! - `NULLIF` is nullable by construction. `COALESCE` is nullable only when
//!   every argument is. Any other call is nullable as soon as one argument
//!   is, which overapproximates but is sound for the strict functions this
//!   layer emits.
//! - Indirect calls through `FUNCTION('name', ...)` answer for the function
//!   they wrap.

use trellis_errors::{TrellisError, TrellisResult};
use trellis_expr::ast::{Expr, FunctionExpr, JoinForest, PathBase, PathExpr};
use trellis_expr::metamodel::Metamodel;

use crate::util::{attribute_is_nullable, single_select_expr};

/// Returns `false` only when `expr` is guaranteed non-NULL for every row.
///
/// Same analyzable set as [`crate::is_unique`]: predicate cases are reported
/// as [`TrellisError::UnsupportedExpressionKind`].
pub fn is_nullable(
    metamodel: &dyn Metamodel,
    joins: &JoinForest,
    expr: &Expr,
) -> TrellisResult<bool> {
    match expr {
        Expr::Composite(children) => {
            for child in children {
                if is_nullable(metamodel, joins, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Call(call) => call_is_nullable(metamodel, joins, call),
        Expr::Path(path) => path_is_nullable(metamodel, joins, path),
        Expr::Subquery(query) => is_nullable(metamodel, joins, single_select_expr(query)?),
        Expr::Parameter(_) => Ok(true),
        Expr::CaseWhen {
            branches,
            else_expr,
        } => {
            for branch in branches {
                if is_nullable(metamodel, joins, &branch.body)? {
                    return Ok(true);
                }
            }
            is_nullable(metamodel, joins, else_expr)
        }
        Expr::Literal(_) => Ok(false),
        Expr::Null => Ok(true),
        Expr::Raw(_) => Ok(false),
        Expr::BinaryOp { .. }
        | Expr::UnaryOp { .. }
        | Expr::Between { .. }
        | Expr::In { .. }
        | Expr::Exists { .. }
        | Expr::IsNull { .. } => Err(TrellisError::UnsupportedExpressionKind {
            kind: expr.kind().into(),
            analysis: "nullability",
        }),
    }
}

fn call_is_nullable(
    metamodel: &dyn Metamodel,
    joins: &JoinForest,
    call: &FunctionExpr,
) -> TrellisResult<bool> {
    if call.is_null_if() {
        return Ok(true);
    }
    if call.is_coalesce() {
        for arg in call.value_arguments() {
            if !is_nullable(metamodel, joins, arg)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    for arg in call.value_arguments() {
        if is_nullable(metamodel, joins, arg)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn path_is_nullable(
    metamodel: &dyn Metamodel,
    joins: &JoinForest,
    path: &PathExpr,
) -> TrellisResult<bool> {
    let id = match path.base {
        PathBase::Node(id) => id,
        // Unresolved alias: no guarantee possible.
        PathBase::Alias(_) => return Ok(true),
    };
    if let Some(field) = &path.field {
        let node = joins.node(id);
        let attribute = metamodel.attribute(&node.entity, field)?;
        if attribute_is_nullable(attribute) {
            return Ok(true);
        }
    }
    for (parent, connecting) in joins.hops_to_root(id) {
        let attribute = metamodel.attribute(&parent.entity, connecting)?;
        if attribute_is_nullable(attribute) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use trellis_expr::ast::{JoinNodeId, Literal, Parameter, SelectQuery, UnaryOperator};
    use trellis_expr::metamodel::{MetamodelBuilder, StaticMetamodel};
    use vec1::vec1;

    use super::*;

    fn document_model() -> StaticMetamodel {
        MetamodelBuilder::new()
            .entity("Document")
            .id("id")
            .basic("name")
            .optional("archived_at")
            .to_one("owner", false)
            .to_many("versions")
            .finish()
            .entity("Person")
            .id("id")
            .to_one("partner", true)
            .finish()
            .build()
            .unwrap()
    }

    /// Root `d` (Document), `owner_1` via the mandatory `d.owner`, `partner_1`
    /// via the optional `owner_1.partner`, `versions_1` via the collection
    /// `d.versions`.
    fn document_joins() -> (JoinForest, [JoinNodeId; 4]) {
        let mut joins = JoinForest::new();
        let d = joins.add_root("Document", "d");
        let owner = joins.add_child(d, "owner", "Person", "owner_1");
        let partner = joins.add_child(owner, "partner", "Person", "partner_1");
        let versions = joins.add_child(d, "versions", "Document", "versions_1");
        (joins, [d, owner, partner, versions])
    }

    fn nullable(expr: &Expr) -> TrellisResult<bool> {
        let (joins, _) = document_joins();
        is_nullable(&document_model(), &joins, expr)
    }

    mod paths {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn mandatory_scalar_attribute_is_not_nullable() {
            let (joins, [d, ..]) = document_joins();
            let expr = Expr::Path(PathExpr::of_node(d, "name"));
            assert_eq!(is_nullable(&document_model(), &joins, &expr), Ok(false));
        }

        #[test]
        fn optional_attribute_is_nullable() {
            let (joins, [d, ..]) = document_joins();
            let expr = Expr::Path(PathExpr::of_node(d, "archived_at"));
            assert_eq!(is_nullable(&document_model(), &joins, &expr), Ok(true));
        }

        #[test]
        fn mandatory_to_one_hop_stays_non_nullable() {
            let (joins, [_, owner, ..]) = document_joins();
            let expr = Expr::Path(PathExpr::of_node(owner, "id"));
            assert_eq!(is_nullable(&document_model(), &joins, &expr), Ok(false));
        }

        #[test]
        fn optional_hop_poisons_everything_below_it() {
            // partner_1.id itself is mandatory, but the partner association
            // may be absent.
            let (joins, [_, _, partner, _]) = document_joins();
            let expr = Expr::Path(PathExpr::of_node(partner, "id"));
            assert_eq!(is_nullable(&document_model(), &joins, &expr), Ok(true));
        }

        #[test]
        fn collection_hop_is_nullable() {
            let (joins, [.., versions]) = document_joins();
            let expr = Expr::Path(PathExpr::of_node(versions, "id"));
            assert_eq!(is_nullable(&document_model(), &joins, &expr), Ok(true));
        }

        #[test]
        fn free_alias_is_nullable() {
            assert_eq!(nullable(&Expr::Path(PathExpr::alias("corr"))), Ok(true));
        }
    }

    mod calls {
        use pretty_assertions::assert_eq;

        use super::*;

        fn non_nullable_arg() -> Expr {
            Expr::Literal(Literal::Integer(0))
        }

        #[test]
        fn null_if_is_always_nullable() {
            let expr = Expr::Call(FunctionExpr::new(
                "NULLIF",
                vec![non_nullable_arg(), non_nullable_arg()],
            ));
            assert_eq!(nullable(&expr), Ok(true));
        }

        #[test]
        fn coalesce_needs_every_argument_nullable() {
            let all_nullable = Expr::Call(FunctionExpr::new(
                "COALESCE",
                vec![Expr::Null, Expr::Parameter(Parameter::Positional(1))],
            ));
            assert_eq!(nullable(&all_nullable), Ok(true));

            let anchored = Expr::Call(FunctionExpr::new(
                "COALESCE",
                vec![Expr::Null, non_nullable_arg()],
            ));
            assert_eq!(nullable(&anchored), Ok(false));
        }

        #[test]
        fn plain_calls_are_nullable_when_any_argument_is() {
            let clean = Expr::Call(FunctionExpr::new("UPPER", vec![non_nullable_arg()]));
            assert_eq!(nullable(&clean), Ok(false));

            let tainted = Expr::Call(FunctionExpr::new(
                "CONCAT",
                vec![non_nullable_arg(), Expr::Null],
            ));
            assert_eq!(nullable(&tainted), Ok(true));
        }

        #[test]
        fn indirect_calls_answer_for_the_wrapped_function() {
            // FUNCTION('NULLIF', a, b) is NULLIF; the quoted name is not an
            // argument.
            let wrapped_null_if = Expr::Call(FunctionExpr::new(
                "FUNCTION",
                vec![
                    Expr::Literal("nullif".into()),
                    non_nullable_arg(),
                    non_nullable_arg(),
                ],
            ));
            assert_eq!(nullable(&wrapped_null_if), Ok(true));

            let wrapped_coalesce = Expr::Call(FunctionExpr::new(
                "FUNCTION",
                vec![Expr::Literal("coalesce".into()), non_nullable_arg()],
            ));
            assert_eq!(nullable(&wrapped_coalesce), Ok(false));
        }
    }

    #[test]
    fn null_and_parameters_are_nullable_and_literals_are_not() {
        assert_eq!(nullable(&Expr::Null), Ok(true));
        assert_eq!(
            nullable(&Expr::Parameter(Parameter::Named("p".into()))),
            Ok(true)
        );
        assert_eq!(nullable(&Expr::Literal(Literal::Boolean(false))), Ok(false));
        assert_eq!(nullable(&Expr::Raw("1 + 1".into())), Ok(false));
    }

    #[test]
    fn case_when_is_nullable_when_any_arm_is() {
        let branch = |body: Expr| trellis_expr::ast::CaseWhenBranch {
            condition: Expr::IsNull {
                expr: Box::new(Expr::Path(PathExpr::alias("d"))),
                negated: false,
            },
            body,
        };
        let nullable_arm = Expr::CaseWhen {
            branches: vec1![branch(Expr::Null)],
            else_expr: Box::new(Expr::Literal(Literal::Integer(0))),
        };
        assert_eq!(nullable(&nullable_arm), Ok(true));

        let clean = Expr::CaseWhen {
            branches: vec1![branch(Expr::Literal(Literal::Integer(1)))],
            else_expr: Box::new(Expr::Literal(Literal::Integer(0))),
        };
        assert_eq!(nullable(&clean), Ok(false));
    }

    #[test]
    fn multi_column_subquery_is_rejected() {
        let expr = Expr::Subquery(Box::new(SelectQuery::new(vec1![Expr::Null, Expr::Null])));
        assert_eq!(
            nullable(&expr),
            Err(TrellisError::MultiColumnSubquery { columns: 2 })
        );
    }

    #[test]
    fn predicates_are_unsupported() {
        let expr = Expr::UnaryOp {
            op: UnaryOperator::Not,
            rhs: Box::new(Expr::Null),
        };
        assert_eq!(
            nullable(&expr),
            Err(TrellisError::UnsupportedExpressionKind {
                kind: "UnaryOp".into(),
                analysis: "nullability",
            })
        );
    }

    mod properties {
        use proptest::prelude::*;
        use vec1::Vec1;

        use super::*;

        fn leaf(nullable: bool) -> Expr {
            if nullable {
                Expr::Null
            } else {
                Expr::Literal(Literal::Integer(7))
            }
        }

        fn check(expr: &Expr) -> bool {
            let metamodel = MetamodelBuilder::new().build().unwrap();
            let joins = JoinForest::new();
            is_nullable(&metamodel, &joins, expr).unwrap()
        }

        proptest! {
            #[test]
            fn coalesce_is_all_and_plain_calls_are_any(
                flags in proptest::collection::vec(any::<bool>(), 1..8)
            ) {
                let args = || flags.iter().copied().map(leaf).collect::<Vec<_>>();
                let coalesce = Expr::Call(FunctionExpr::new("COALESCE", args()));
                prop_assert_eq!(check(&coalesce), flags.iter().all(|f| *f));

                let concat = Expr::Call(FunctionExpr::new("CONCAT", args()));
                prop_assert_eq!(check(&concat), flags.iter().any(|f| *f));
            }

            #[test]
            fn composites_spread_nullability(
                flags in proptest::collection::vec(any::<bool>(), 1..8)
            ) {
                let children =
                    Vec1::try_from_vec(flags.iter().copied().map(leaf).collect()).unwrap();
                let composite = Expr::Composite(children);
                prop_assert_eq!(check(&composite), flags.iter().any(|f| *f));
            }
        }
    }
}
