//! Evaluation engine for the solver crates.
//!
//! This crate owns everything below the solver state machines: the
//! normalizing simplifier, the isolation rewriter, assumption records,
//! numeric evaluation, calculus primitives and the solve budget.

pub mod assumptions;
pub mod budget;
pub mod calculus;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod isolation;
pub mod nary;
pub mod simplify;
pub mod substitute;

pub use assumptions::{Assumption, Assumptions, NumberType, Sign};
pub use budget::{CancelToken, SolveBudget};
pub use calculus::{differentiate, integrate};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::EngineError;
pub use eval::eval_f64;
pub use isolation::{eval_relation, isolate_equation};
pub use simplify::simplify;
pub use substitute::{substitute_expr, substitute_var};
