//! Expression arena and relation types shared by the solver crates.
//!
//! Nodes are hash-consed: building the same structure twice yields the
//! same `ExprId`, so id equality is structural equality.

pub mod builtin;
pub mod context;
pub mod display;
pub mod expression;
pub mod ordering;
pub mod relation;
pub mod symbol;
pub mod traversal;

pub use builtin::BuiltinFn;
pub use context::{Context, ExprId};
pub use display::{DisplayEquation, DisplayExpr, DisplayRelation};
pub use expression::{Constant, Expr};
pub use relation::{Equation, RelOp, Relation};
pub use symbol::{SymbolId, SymbolTable};
