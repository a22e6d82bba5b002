//! Error types shared across the trellis crates.
//!
//! All fallible operations in the workspace return [`TrellisResult`]. Every
//! variant of [`TrellisError`] is fatal at the point of detection: callers are
//! expected to abort the surrounding planning or materialization operation, not
//! to skip the offending expression and continue.

use thiserror::Error;

/// Errors surfaced by expression analysis, metadata introspection, and tuple
/// transformation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrellisError {
    /// The semantic analyzer was handed an expression case outside the
    /// analyzable set (predicate kinds, for instance). This is a programming
    /// error in the caller, never silently defaulted.
    #[error("expression of kind `{kind}` cannot be analyzed for {analysis}")]
    UnsupportedExpressionKind {
        kind: String,
        analysis: &'static str,
    },

    /// A subquery handed to the analyzer exposed more than one select
    /// expression, violating the analyzer's precondition.
    #[error("expected a subquery with exactly one select expression, found {columns}")]
    MultiColumnSubquery { columns: usize },

    /// Metadata validation found an attribute whose backing member is neither
    /// a field nor an accessor. Indicates a bug in the metadata source, not in
    /// the data being queried.
    #[error("attribute `{entity}.{attribute}` is backed by neither a field nor an accessor")]
    MalformedAttributeMember { entity: String, attribute: String },

    /// An entity name that the metamodel does not know about.
    #[error("unknown entity `{entity}`")]
    UnknownEntity { entity: String },

    /// An attribute lookup missed on an entity the metamodel does know about.
    #[error("entity `{entity}` has no attribute `{attribute}`")]
    UnknownAttribute { entity: String, attribute: String },

    /// An internal invariant was broken. Always a bug in trellis itself.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// A construct that is valid but that this layer does not support.
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl TrellisError {
    /// Returns true for errors that indicate a bug in trellis rather than in
    /// the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(self, TrellisError::Internal(_))
    }
}

pub type TrellisResult<T> = Result<T, TrellisError>;

#[macro_export]
macro_rules! trellis_err {
    ($kind:ident, $e:expr) => {
        $crate::TrellisError::$kind(format!(
            "at {}:{}:{}: {}",
            std::file!(),
            std::line!(),
            std::column!(),
            $e
        ))
    };
}

/// Constructs a [`TrellisError::Internal`] carrying the source location of the
/// macro invocation.
#[macro_export]
macro_rules! internal_err {
    ($($format_args:tt)*) => {
        $crate::trellis_err!(Internal, format!($($format_args)*))
    };
}

/// Returns early with a [`TrellisError::Internal`].
#[macro_export]
macro_rules! internal {
    ($($format_args:tt)*) => {
        return Err($crate::internal_err!($($format_args)*).into())
    };
}

/// Constructs a [`TrellisError::Unsupported`] carrying the source location of
/// the macro invocation.
#[macro_export]
macro_rules! unsupported_err {
    ($($format_args:tt)*) => {
        $crate::trellis_err!(Unsupported, format!($($format_args)*))
    };
}

/// Returns early with a [`TrellisError::Unsupported`].
#[macro_export]
macro_rules! unsupported {
    ($($format_args:tt)*) => {
        return Err($crate::unsupported_err!($($format_args)*).into())
    };
}

/// Returns early with a [`TrellisError::Internal`] if the given condition does
/// not hold.
#[macro_export]
macro_rules! invariant {
    ($expr:expr, $($format_args:tt)*) => {
        if !$expr {
            $crate::internal!($($format_args)*);
        }
    };
    ($expr:expr) => {
        if !$expr {
            $crate::internal!("invariant failed: {}", stringify!($expr));
        }
    };
}
