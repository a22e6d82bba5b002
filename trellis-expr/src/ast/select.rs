use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use crate::ast::Expr;

/// The query shape the analyses and rewrites need to see: the select list
/// plus the expression-bearing clauses. Join construction, ordering, and
/// paging live with the owning builder and never reach this layer.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SelectQuery {
    /// The select list; always at least one item.
    pub select: Vec1<Expr>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
}

impl SelectQuery {
    pub fn new(select: Vec1<Expr>) -> Self {
        Self {
            select,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
        }
    }

    /// A query selecting a single expression, the common case for scalar
    /// subqueries.
    pub fn single(select: Expr) -> Self {
        Self::new(Vec1::new(select))
    }

    /// Number of select expressions this query exposes.
    pub fn select_arity(&self) -> usize {
        self.select.len()
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {}", self.select.iter().join(", "))?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.iter().join(", "))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        Ok(())
    }
}
