mod expression;
mod join;
mod literal;
mod select;

pub use self::expression::*;
pub use self::join::*;
pub use self::literal::*;
pub use self::select::*;
