//! AST walker over mutable references, inspired by [rustc's AST
//! visitor][rustc-ast-visit].
//!
//! [rustc-ast-visit]: https://doc.rust-lang.org/stable/nightly-rustc/rustc_ast/visit/index.html
//!
//! NOTE: remember that this file is effectively duplicated to
//! [`visit`][super::visit]; changes to the traversal here usually belong
//! there too.

use crate::ast::{
    CaseWhenBranch, Expr, FunctionExpr, InValue, Literal, Parameter, PathExpr, SelectQuery,
};

/// Each method of [`VisitorMut`] is a hook to be potentially overridden when
/// recursively traversing expression trees, like
/// [`Visitor`][super::visit::Visitor] but receiving mutable references. An
/// override that replaces a node wholesale should skip the corresponding
/// `walk` call when the new subtree must not itself be traversed.
///
/// # Examples
///
/// The following visitor folds every boolean literal into NULL.
///
/// ```
/// use std::convert::Infallible;
///
/// use trellis_expr::analysis::visit_mut::{walk_expr, VisitorMut};
/// use trellis_expr::ast::{Expr, Literal};
///
/// struct Nullify;
///
/// impl<'ast> VisitorMut<'ast> for Nullify {
///     type Error = Infallible;
///
///     fn visit_expr(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
///         if matches!(expr, Expr::Literal(Literal::Boolean(_))) {
///             *expr = Expr::Null;
///             return Ok(());
///         }
///         walk_expr(self, expr)
///     }
/// }
///
/// let mut expr = Expr::UnaryOp {
///     op: trellis_expr::ast::UnaryOperator::Not,
///     rhs: Box::new(Expr::Literal(Literal::Boolean(true))),
/// };
/// Nullify.visit_expr(&mut expr).unwrap();
/// assert_eq!(
///     expr,
///     Expr::UnaryOp {
///         op: trellis_expr::ast::UnaryOperator::Not,
///         rhs: Box::new(Expr::Null),
///     }
/// );
/// ```
pub trait VisitorMut<'ast>: Sized {
    /// Errors that can be thrown during execution of this visitor
    type Error;

    fn visit_literal(&mut self, _literal: &'ast mut Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_parameter(&mut self, _parameter: &'ast mut Parameter) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_path_expr(&mut self, _path: &'ast mut PathExpr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_function_expr(&mut self, call: &'ast mut FunctionExpr) -> Result<(), Self::Error> {
        walk_function_expr(self, call)
    }

    fn visit_case_when_branch(
        &mut self,
        branch: &'ast mut CaseWhenBranch,
    ) -> Result<(), Self::Error> {
        walk_case_when_branch(self, branch)
    }

    fn visit_in_value(&mut self, in_value: &'ast mut InValue) -> Result<(), Self::Error> {
        walk_in_value(self, in_value)
    }

    fn visit_expr(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_where_clause(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
        self.visit_expr(expr)
    }

    fn visit_having_clause(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
        self.visit_expr(expr)
    }

    fn visit_select_query(&mut self, query: &'ast mut SelectQuery) -> Result<(), Self::Error> {
        walk_select_query(self, query)
    }
}

pub fn walk_expr<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    expr: &'ast mut Expr,
) -> Result<(), V::Error> {
    match expr {
        Expr::Composite(children) => {
            for child in children.iter_mut() {
                visitor.visit_expr(child)?;
            }
            Ok(())
        }
        Expr::Call(call) => visitor.visit_function_expr(call),
        Expr::Path(path) => visitor.visit_path_expr(path),
        Expr::Subquery(query) => visitor.visit_select_query(query.as_mut()),
        Expr::Parameter(parameter) => visitor.visit_parameter(parameter),
        Expr::CaseWhen {
            branches,
            else_expr,
        } => {
            for branch in branches.iter_mut() {
                visitor.visit_case_when_branch(branch)?;
            }
            visitor.visit_expr(else_expr.as_mut())
        }
        Expr::Literal(literal) => visitor.visit_literal(literal),
        Expr::Null | Expr::Raw(_) => Ok(()),
        Expr::BinaryOp { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_mut())?;
            visitor.visit_expr(rhs.as_mut())
        }
        Expr::UnaryOp { rhs, .. } => visitor.visit_expr(rhs.as_mut()),
        Expr::Between {
            operand, min, max, ..
        } => {
            visitor.visit_expr(operand.as_mut())?;
            visitor.visit_expr(min.as_mut())?;
            visitor.visit_expr(max.as_mut())
        }
        Expr::In { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_mut())?;
            visitor.visit_in_value(rhs)
        }
        Expr::Exists { subquery, .. } => visitor.visit_select_query(subquery.as_mut()),
        Expr::IsNull { expr, .. } => visitor.visit_expr(expr.as_mut()),
    }
}

pub fn walk_function_expr<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    call: &'ast mut FunctionExpr,
) -> Result<(), V::Error> {
    for arg in &mut call.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_case_when_branch<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    branch: &'ast mut CaseWhenBranch,
) -> Result<(), V::Error> {
    visitor.visit_expr(&mut branch.condition)?;
    visitor.visit_expr(&mut branch.body)
}

pub fn walk_in_value<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    in_value: &'ast mut InValue,
) -> Result<(), V::Error> {
    match in_value {
        InValue::Subquery(query) => visitor.visit_select_query(query.as_mut()),
        InValue::List(exprs) => {
            for expr in exprs {
                visitor.visit_expr(expr)?;
            }
            Ok(())
        }
    }
}

pub fn walk_select_query<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    query: &'ast mut SelectQuery,
) -> Result<(), V::Error> {
    for expr in query.select.iter_mut() {
        visitor.visit_expr(expr)?;
    }
    if let Some(where_clause) = &mut query.where_clause {
        visitor.visit_where_clause(where_clause)?;
    }
    for expr in &mut query.group_by {
        visitor.visit_expr(expr)?;
    }
    if let Some(having) = &mut query.having {
        visitor.visit_having_clause(having)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::ast::{BinaryOperator, PathExpr};

    /// Rewrites every named parameter into the next free positional one.
    struct Renumber(u32);

    impl<'ast> VisitorMut<'ast> for Renumber {
        type Error = Infallible;

        fn visit_parameter(&mut self, parameter: &'ast mut Parameter) -> Result<(), Self::Error> {
            if matches!(parameter, Parameter::Named(_)) {
                self.0 += 1;
                *parameter = Parameter::Positional(self.0);
            }
            Ok(())
        }
    }

    #[test]
    fn rewrites_nodes_in_place_across_clauses() {
        let mut query = SelectQuery::single(Expr::Parameter(Parameter::Named("a".into())));
        query.where_clause = Some(Expr::BinaryOp {
            lhs: Box::new(Expr::Path(PathExpr::alias("d"))),
            op: BinaryOperator::Equal,
            rhs: Box::new(Expr::Parameter(Parameter::Named("b".into()))),
        });

        let mut renumber = Renumber(0);
        renumber.visit_select_query(&mut query).unwrap();

        assert_eq!(*query.select.first(), Expr::Parameter(Parameter::Positional(1)));
        match query.where_clause {
            Some(Expr::BinaryOp { rhs, .. }) => {
                assert_eq!(*rhs, Expr::Parameter(Parameter::Positional(2)));
            }
            other => panic!("unexpected where clause: {other:?}"),
        }
    }
}
