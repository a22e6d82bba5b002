use std::fmt;

use derive_more::derive::From;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumDiscriminants, IntoStaticStr};
use vec1::Vec1;

use crate::ast::{JoinNodeId, Literal, SelectQuery};

/// A named function application, e.g. `COALESCE(d.idx, 0)` or
/// `SIZE(d.versions)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

impl FunctionExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Returns an iterator over the direct arguments of this call.
    pub fn arguments(&self) -> impl Iterator<Item = &Expr> {
        self.args.iter()
    }

    /// Function names compare case-insensitively; an indirect
    /// `FUNCTION('name', ...)` call answers for the name it wraps.
    pub fn has_name(&self, name: &str) -> bool {
        self.resolved_name().eq_ignore_ascii_case(name)
    }

    /// The effective function name: the quoted name for indirect
    /// `FUNCTION('name', ...)` calls, the call's own name otherwise.
    pub fn resolved_name(&self) -> &str {
        self.wrapped_function_name().unwrap_or(&self.name)
    }

    /// True for the collection-size function `SIZE(path)`.
    pub fn is_size(&self) -> bool {
        self.has_name("SIZE")
    }

    /// True for `OUTER(path)`, which resolves a path against the outer
    /// query's root instead of the local one.
    pub fn is_outer(&self) -> bool {
        self.has_name("OUTER")
    }

    /// True for the two-argument `NULLIF(a, b)`.
    pub fn is_null_if(&self) -> bool {
        self.has_name("NULLIF")
    }

    /// True for `COALESCE(args...)`.
    pub fn is_coalesce(&self) -> bool {
        self.has_name("COALESCE")
    }

    /// For indirect calls of the form `FUNCTION('name', args...)`, the quoted
    /// name of the function actually being invoked.
    pub fn wrapped_function_name(&self) -> Option<&str> {
        if !self.name.eq_ignore_ascii_case("FUNCTION") {
            return None;
        }
        match self.args.first() {
            Some(Expr::Literal(Literal::String(name))) => Some(name),
            _ => None,
        }
    }

    /// The arguments carrying values: everything except the quoted name of an
    /// indirect `FUNCTION('name', ...)` call.
    pub fn value_arguments(&self) -> &[Expr] {
        if self.wrapped_function_name().is_some() {
            &self.args[1..]
        } else {
            &self.args
        }
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.iter().join(", "))
    }
}

/// A bind-parameter reference, by name or by position.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Named(String),
    Positional(u32),
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Named(name) => write!(f, ":{name}"),
            Parameter::Positional(pos) => write!(f, "?{pos}"),
        }
    }
}

/// What a path expression is rooted at: a resolved join-tree node, or a free
/// alias that a later rewrite may substitute.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PathBase {
    Node(JoinNodeId),
    Alias(String),
}

impl fmt::Display for PathBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathBase::Node(id) => write!(f, "{id}"),
            PathBase::Alias(alias) => write!(f, "{alias}"),
        }
    }
}

/// An attribute dereference relative to a join-tree node or alias, e.g.
/// `d.owner`, or a bare reference like `d`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PathExpr {
    pub base: PathBase,
    /// Terminal attribute name; `None` for a bare reference to the base
    /// itself.
    pub field: Option<String>,
}

impl PathExpr {
    /// A bare reference to a free alias.
    pub fn alias(alias: impl Into<String>) -> Self {
        Self {
            base: PathBase::Alias(alias.into()),
            field: None,
        }
    }

    /// A bare reference to a join node.
    pub fn node(node: JoinNodeId) -> Self {
        Self {
            base: PathBase::Node(node),
            field: None,
        }
    }

    /// An attribute of a join node.
    pub fn of_node(node: JoinNodeId, field: impl Into<String>) -> Self {
        Self {
            base: PathBase::Node(node),
            field: Some(field.into()),
        }
    }

    /// True when this path is exactly the given free alias, with no terminal
    /// field.
    pub fn is_free_alias(&self, alias: &str) -> bool {
        self.field.is_none() && matches!(&self.base, PathBase::Alias(a) if a == alias)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{field}", self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Binary operators appearing in predicates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `=`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
}

impl BinaryOperator {
    /// True for the LIKE family, whose operand slots the alias-inlining
    /// rewrite leaves untouched.
    pub fn is_like(&self) -> bool {
        matches!(self, BinaryOperator::Like | BinaryOperator::NotLike)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::NotLike => "NOT LIKE",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
        };
        write!(f, "{op}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Neg => write!(f, "-"),
            UnaryOperator::Not => write!(f, "NOT"),
        }
    }
}

/// Right-hand side of IN
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, From)]
pub enum InValue {
    Subquery(Box<SelectQuery>),
    List(Vec<Expr>),
}

impl fmt::Display for InValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InValue::Subquery(query) => write!(f, "{query}"),
            InValue::List(exprs) => write!(f, "{}", exprs.iter().join(", ")),
        }
    }
}

/// A single branch of a `CASE WHEN` expression
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, From)]
pub struct CaseWhenBranch {
    pub condition: Expr,
    pub body: Expr,
}

impl fmt::Display for CaseWhenBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHEN {} THEN {}", self.condition, self.body)
    }
}

/// Query expression AST
#[derive(
    Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, From, EnumDiscriminants,
)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum Expr {
    /// An ordered, non-empty grouping of expressions treated as one value,
    /// e.g. a multi-part select item assembled by a builder.
    Composite(Vec1<Expr>),

    /// Function call expressions
    Call(FunctionExpr),

    /// A path rooted at a join node or free alias
    Path(PathExpr),

    /// A scalar subquery
    Subquery(Box<SelectQuery>),

    /// A bind parameter
    Parameter(Parameter),

    /// `CASE (WHEN condition THEN body)... ELSE else_expr END`; the ELSE
    /// branch is always present.
    CaseWhen {
        branches: Vec1<CaseWhenBranch>,
        else_expr: Box<Expr>,
    },

    /// Literal values
    Literal(Literal),

    /// The NULL literal. Its own case rather than a [`Literal`] because the
    /// semantic analyses give it answers no other expression shares.
    Null,

    /// An opaque, pre-rendered fragment produced by legacy builders. Carried
    /// through rewrites untouched; the semantic analyses treat it as neither
    /// unique nor nullable.
    #[from(ignore)]
    Raw(String),

    /// Binary operator: comparisons, AND/OR, and the LIKE family
    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOperator,
        rhs: Box<Expr>,
    },

    /// Unary operator
    UnaryOp { op: UnaryOperator, rhs: Box<Expr> },

    /// `operand [NOT] BETWEEN min AND max`
    Between {
        operand: Box<Expr>,
        min: Box<Expr>,
        max: Box<Expr>,
        negated: bool,
    },

    /// An IN (or NOT IN) predicate
    In {
        lhs: Box<Expr>,
        rhs: InValue,
        negated: bool,
    },

    /// `[NOT] EXISTS (select)`
    Exists {
        subquery: Box<SelectQuery>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },
}

impl Expr {
    /// The bare variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        ExprDiscriminants::from(self).into()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Composite(children) => write!(f, "({})", children.iter().join(", ")),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Path(path) => write!(f, "{path}"),
            Expr::Subquery(query) => write!(f, "({query})"),
            Expr::Parameter(param) => write!(f, "{param}"),
            Expr::CaseWhen {
                branches,
                else_expr,
            } => {
                write!(f, "CASE ")?;
                for branch in branches {
                    write!(f, "{branch} ")?;
                }
                write!(f, "ELSE {else_expr} END")
            }
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Null => write!(f, "NULL"),
            Expr::Raw(fragment) => write!(f, "{fragment}"),
            Expr::BinaryOp { lhs, op, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::UnaryOp {
                op: UnaryOperator::Neg,
                rhs,
            } => write!(f, "(-{rhs})"),
            Expr::UnaryOp { op, rhs } => write!(f, "({op} {rhs})"),
            Expr::Between {
                operand,
                min,
                max,
                negated,
            } => write!(
                f,
                "{operand} {}BETWEEN {min} AND {max}",
                if *negated { "NOT " } else { "" }
            ),
            Expr::In { lhs, rhs, negated } => {
                write!(f, "{lhs}")?;
                if *negated {
                    write!(f, " NOT")?;
                }
                write!(f, " IN ({rhs})")
            }
            Expr::Exists { subquery, negated } => write!(
                f,
                "{}EXISTS ({subquery})",
                if *negated { "NOT " } else { "" }
            ),
            Expr::IsNull { expr, negated } => write!(
                f,
                "{expr} IS {}NULL",
                if *negated { "NOT " } else { "" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use vec1::vec1;

    use super::*;

    fn owner_path() -> Expr {
        Expr::Path(PathExpr::alias("owner"))
    }

    #[test]
    fn kind_names() {
        assert_eq!(Expr::Null.kind(), "Null");
        assert_eq!(owner_path().kind(), "Path");
        assert_eq!(
            Expr::BinaryOp {
                lhs: Box::new(Expr::Null),
                op: BinaryOperator::Equal,
                rhs: Box::new(Expr::Null),
            }
            .kind(),
            "BinaryOp"
        );
    }

    #[test]
    fn wrapped_function_name() {
        let indirect = FunctionExpr::new(
            "FUNCTION",
            vec![
                Expr::Literal("nullif".into()),
                owner_path(),
                Expr::Literal(1i64.into()),
            ],
        );
        assert_eq!(indirect.wrapped_function_name(), Some("nullif"));
        assert_eq!(indirect.value_arguments().len(), 2);
        assert!(indirect.is_null_if());
        assert!(!indirect.is_coalesce());

        let direct = FunctionExpr::new("NULLIF", vec![owner_path(), Expr::Null]);
        assert_eq!(direct.wrapped_function_name(), None);
        assert_eq!(direct.value_arguments().len(), 2);
        assert!(direct.is_null_if());
    }

    #[test]
    fn function_name_predicates_ignore_case() {
        assert!(FunctionExpr::new("size", vec![]).is_size());
        assert!(FunctionExpr::new("Outer", vec![owner_path()]).is_outer());
        assert!(FunctionExpr::new("coalesce", vec![]).is_coalesce());
        assert!(!FunctionExpr::new("COALESCE", vec![]).is_size());
    }

    #[test]
    fn display() {
        let expr = Expr::BinaryOp {
            lhs: Box::new(Expr::Path(PathExpr {
                base: PathBase::Alias("d".into()),
                field: Some("name".into()),
            })),
            op: BinaryOperator::Like,
            rhs: Box::new(Expr::Literal("doc%".into())),
        };
        assert_eq!(expr.to_string(), "(d.name LIKE 'doc%')");

        let case = Expr::CaseWhen {
            branches: vec1![CaseWhenBranch {
                condition: Expr::IsNull {
                    expr: Box::new(owner_path()),
                    negated: false,
                },
                body: Expr::Literal(0i64.into()),
            }],
            else_expr: Box::new(Expr::Literal(1i64.into())),
        };
        assert_eq!(
            case.to_string(),
            "CASE WHEN owner IS NULL THEN 0 ELSE 1 END"
        );

        let composite = Expr::Composite(vec1![Expr::Null, Expr::Parameter(Parameter::Positional(1))]);
        assert_eq!(composite.to_string(), "(NULL, ?1)");
    }
}
