//! Read-only analyses over expression trees: traversal infrastructure and a
//! handful of structural queries the planning layer asks before committing to
//! a rewrite.

pub mod visit;
pub mod visit_mut;

use crate::ast::{Expr, FunctionExpr, Literal, SelectQuery};
use visit::Visitor;

/// Returns true if any subquery occurs anywhere beneath the given expression,
/// whether as a scalar subquery, an EXISTS operand, or the right-hand side of
/// IN.
pub fn contains_subquery(expr: &Expr) -> bool {
    struct SubqueryFinder;

    impl<'ast> Visitor<'ast> for SubqueryFinder {
        type Error = ();

        fn visit_select_query(&mut self, _query: &'ast SelectQuery) -> Result<(), Self::Error> {
            Err(())
        }
    }

    SubqueryFinder.visit_expr(expr).is_err()
}

/// Returns true if a `SIZE(...)` call occurs anywhere beneath the given
/// expression, including inside subqueries.
pub fn contains_size_call(expr: &Expr) -> bool {
    struct SizeFinder;

    impl<'ast> Visitor<'ast> for SizeFinder {
        type Error = ();

        fn visit_function_expr(&mut self, call: &'ast FunctionExpr) -> Result<(), Self::Error> {
            if call.is_size() {
                return Err(());
            }
            visit::walk_function_expr(self, call)
        }
    }

    SizeFinder.visit_expr(expr).is_err()
}

/// The payload of a string literal, or `None` for any other expression.
pub fn unwrap_string_literal(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Literal(Literal::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use vec1::vec1;

    use super::*;
    use crate::ast::{BinaryOperator, PathExpr};

    fn size_of(path: &str) -> Expr {
        Expr::Call(FunctionExpr::new(
            "SIZE",
            vec![Expr::Path(PathExpr::alias(path))],
        ))
    }

    mod contains_subquery {
        use super::*;

        #[test]
        fn finds_scalar_subquery_in_function_argument() {
            let expr = Expr::Call(FunctionExpr::new(
                "COALESCE",
                vec![
                    Expr::Subquery(Box::new(SelectQuery::single(Expr::Null))),
                    Expr::Null,
                ],
            ));
            assert!(contains_subquery(&expr));
        }

        #[test]
        fn finds_in_subquery() {
            let expr = Expr::In {
                lhs: Box::new(Expr::Path(PathExpr::alias("d"))),
                rhs: Box::new(SelectQuery::single(Expr::Null)).into(),
                negated: false,
            };
            assert!(contains_subquery(&expr));
        }

        #[test]
        fn plain_predicate_has_none() {
            let expr = Expr::BinaryOp {
                lhs: Box::new(Expr::Path(PathExpr::alias("d"))),
                op: BinaryOperator::Equal,
                rhs: Box::new(Expr::Literal(1i64.into())),
            };
            assert!(!contains_subquery(&expr));
        }
    }

    mod contains_size_call {
        use super::*;

        #[test]
        fn finds_size_behind_composite() {
            let expr = Expr::Composite(vec1![Expr::Null, size_of("d.versions")]);
            assert!(contains_size_call(&expr));
        }

        #[test]
        fn finds_size_inside_subquery() {
            let mut query = SelectQuery::single(Expr::Null);
            query.having = Some(size_of("p.documents"));
            assert!(contains_size_call(&Expr::Subquery(Box::new(query))));
        }

        #[test]
        fn other_calls_do_not_count() {
            let expr = Expr::Call(FunctionExpr::new(
                "COUNT",
                vec![Expr::Path(PathExpr::alias("d"))],
            ));
            assert!(!contains_size_call(&expr));
        }
    }

    #[test]
    fn unwrap_string_literal_only_matches_strings() {
        assert_eq!(
            unwrap_string_literal(&Expr::Literal("nullif".into())),
            Some("nullif")
        );
        assert_eq!(unwrap_string_literal(&Expr::Literal(1i64.into())), None);
        assert_eq!(unwrap_string_literal(&Expr::Null), None);
    }
}
