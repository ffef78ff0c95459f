//! The two small languages embedded in Cadence configurations: the
//! `{{ key }}` placeholder sub-language and the boolean/arithmetic filter
//! expression language.

pub mod expr;
pub mod substitute;

pub use expr::{eval, parse, Expr, ExprError, Value};
pub use substitute::{substitute, substitute_for_validation};
