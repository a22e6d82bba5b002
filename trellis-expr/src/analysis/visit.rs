//! AST walker over shared references, inspired by [rustc's AST
//! visitor][rustc-ast-visit].
//!
//! [rustc-ast-visit]: https://doc.rust-lang.org/stable/nightly-rustc/rustc_ast/visit/index.html
//!
//! NOTE: remember that this file is effectively duplicated to
//! [`visit_mut`][super::visit_mut]; changes to the traversal here usually
//! belong there too.

use crate::ast::{
    CaseWhenBranch, Expr, FunctionExpr, InValue, Literal, Parameter, PathExpr, SelectQuery,
};

/// Each method of [`Visitor`] is a hook to be potentially overridden when
/// recursively traversing expression trees. The default implementation of
/// each method recursively visits the substructure of the input via the
/// corresponding `walk` function, e.g. `visit_expr` by default calls
/// [`walk_expr`]. This allows writing algorithms that depend on recursive
/// traversal without reimplementing the traversal every time.
///
/// # Examples
///
/// The following visitor counts the bind parameters in an expression tree.
///
/// ```
/// use std::convert::Infallible;
///
/// use trellis_expr::analysis::visit::Visitor;
/// use trellis_expr::ast::{BinaryOperator, Expr, Parameter};
///
/// fn count_parameters(expr: &Expr) -> usize {
///     #[derive(Default)]
///     struct ParameterCounter(usize);
///
///     impl<'ast> Visitor<'ast> for ParameterCounter {
///         type Error = Infallible;
///
///         fn visit_parameter(&mut self, _parameter: &'ast Parameter) -> Result<(), Self::Error> {
///             self.0 += 1;
///             Ok(())
///         }
///     }
///
///     let mut counter = ParameterCounter::default();
///     counter.visit_expr(expr).unwrap();
///     counter.0
/// }
///
/// let expr = Expr::BinaryOp {
///     lhs: Box::new(Expr::Parameter(Parameter::Positional(1))),
///     op: BinaryOperator::And,
///     rhs: Box::new(Expr::Parameter(Parameter::Named("age".into()))),
/// };
/// assert_eq!(count_parameters(&expr), 2);
/// ```
pub trait Visitor<'ast>: Sized {
    /// Errors that can be thrown during execution of this visitor
    type Error;

    fn visit_literal(&mut self, _literal: &'ast Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_parameter(&mut self, _parameter: &'ast Parameter) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_path_expr(&mut self, _path: &'ast PathExpr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_function_expr(&mut self, call: &'ast FunctionExpr) -> Result<(), Self::Error> {
        walk_function_expr(self, call)
    }

    fn visit_case_when_branch(
        &mut self,
        branch: &'ast CaseWhenBranch,
    ) -> Result<(), Self::Error> {
        walk_case_when_branch(self, branch)
    }

    fn visit_in_value(&mut self, in_value: &'ast InValue) -> Result<(), Self::Error> {
        walk_in_value(self, in_value)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_where_clause(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
        self.visit_expr(expr)
    }

    fn visit_having_clause(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
        self.visit_expr(expr)
    }

    fn visit_select_query(&mut self, query: &'ast SelectQuery) -> Result<(), Self::Error> {
        walk_select_query(self, query)
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    expr: &'ast Expr,
) -> Result<(), V::Error> {
    match expr {
        Expr::Composite(children) => {
            for child in children {
                visitor.visit_expr(child)?;
            }
            Ok(())
        }
        Expr::Call(call) => visitor.visit_function_expr(call),
        Expr::Path(path) => visitor.visit_path_expr(path),
        Expr::Subquery(query) => visitor.visit_select_query(query.as_ref()),
        Expr::Parameter(parameter) => visitor.visit_parameter(parameter),
        Expr::CaseWhen {
            branches,
            else_expr,
        } => {
            for branch in branches {
                visitor.visit_case_when_branch(branch)?;
            }
            visitor.visit_expr(else_expr.as_ref())
        }
        Expr::Literal(literal) => visitor.visit_literal(literal),
        Expr::Null | Expr::Raw(_) => Ok(()),
        Expr::BinaryOp { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_ref())?;
            visitor.visit_expr(rhs.as_ref())
        }
        Expr::UnaryOp { rhs, .. } => visitor.visit_expr(rhs.as_ref()),
        Expr::Between {
            operand, min, max, ..
        } => {
            visitor.visit_expr(operand.as_ref())?;
            visitor.visit_expr(min.as_ref())?;
            visitor.visit_expr(max.as_ref())
        }
        Expr::In { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_ref())?;
            visitor.visit_in_value(rhs)
        }
        Expr::Exists { subquery, .. } => visitor.visit_select_query(subquery.as_ref()),
        Expr::IsNull { expr, .. } => visitor.visit_expr(expr.as_ref()),
    }
}

pub fn walk_function_expr<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    call: &'ast FunctionExpr,
) -> Result<(), V::Error> {
    for arg in &call.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_case_when_branch<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    branch: &'ast CaseWhenBranch,
) -> Result<(), V::Error> {
    visitor.visit_expr(&branch.condition)?;
    visitor.visit_expr(&branch.body)
}

pub fn walk_in_value<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    in_value: &'ast InValue,
) -> Result<(), V::Error> {
    match in_value {
        InValue::Subquery(query) => visitor.visit_select_query(query.as_ref()),
        InValue::List(exprs) => {
            for expr in exprs {
                visitor.visit_expr(expr)?;
            }
            Ok(())
        }
    }
}

pub fn walk_select_query<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    query: &'ast SelectQuery,
) -> Result<(), V::Error> {
    for expr in &query.select {
        visitor.visit_expr(expr)?;
    }
    if let Some(where_clause) = &query.where_clause {
        visitor.visit_where_clause(where_clause)?;
    }
    for expr in &query.group_by {
        visitor.visit_expr(expr)?;
    }
    if let Some(having) = &query.having {
        visitor.visit_having_clause(having)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use vec1::vec1;

    use super::*;
    use crate::ast::BinaryOperator;

    /// Records the display form of every expression node in visit order.
    #[derive(Default)]
    struct NodeLog(Vec<String>);

    impl<'ast> Visitor<'ast> for NodeLog {
        type Error = Infallible;

        fn visit_expr(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
            self.0.push(expr.to_string());
            walk_expr(self, expr)
        }
    }

    #[test]
    fn walk_reaches_every_node_once() {
        let expr = Expr::Between {
            operand: Box::new(Expr::Path(crate::ast::PathExpr::alias("d"))),
            min: Box::new(Expr::Literal(1i64.into())),
            max: Box::new(Expr::CaseWhen {
                branches: vec1![CaseWhenBranch {
                    condition: Expr::Literal(true.into()),
                    body: Expr::Literal(10i64.into()),
                }],
                else_expr: Box::new(Expr::Literal(20i64.into())),
            }),
            negated: false,
        };

        let mut log = NodeLog::default();
        log.visit_expr(&expr).unwrap();
        assert_eq!(
            log.0,
            vec![
                "d BETWEEN 1 AND CASE WHEN TRUE THEN 10 ELSE 20 END",
                "d",
                "1",
                "CASE WHEN TRUE THEN 10 ELSE 20 END",
                "TRUE",
                "10",
                "20",
            ]
        );
    }

    #[test]
    fn where_clause_hook_sees_the_whole_clause() {
        struct WhereSpy(Option<String>);

        impl<'ast> Visitor<'ast> for WhereSpy {
            type Error = Infallible;

            fn visit_where_clause(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
                self.0 = Some(expr.to_string());
                self.visit_expr(expr)
            }
        }

        let mut query = SelectQuery::single(Expr::Null);
        query.where_clause = Some(Expr::BinaryOp {
            lhs: Box::new(Expr::Path(crate::ast::PathExpr::alias("d"))),
            op: BinaryOperator::NotEqual,
            rhs: Box::new(Expr::Null),
        });

        let mut spy = WhereSpy(None);
        spy.visit_select_query(&query).unwrap();
        assert_eq!(spy.0.as_deref(), Some("(d != NULL)"));
    }
}
