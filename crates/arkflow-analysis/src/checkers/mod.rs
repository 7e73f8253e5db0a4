//! Checkers built on the IFDS solver

mod div_by_zero;
mod finding;
mod undefined;

pub use div_by_zero::{DivByZeroChecker, ZeroFact};
pub use finding::Finding;
pub use undefined::{UndefinedFact, UndefinedVariableChecker};
