//! Input shape classification.
//!
//! The solver only accepts relations that are comparison-shaped after
//! normalization. Anything that collapses to a bare truth value gets one
//! second look with comparison testing disabled, because `3 = 3` should
//! classify as a (trivially true) equation rather than be rejected as
//! "not an equation".

use crate::error::SolveError;
use cassia_ast::{Context, Equation, Relation};
use cassia_engine::eval_relation;

/// The four accepted input and result shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum EquationShape {
    Comparison(Equation),
    Conjunction(Vec<Relation>),
    Disjunction(Vec<Relation>),
    /// A disjunction at least one of whose branches is itself a
    /// conjunction, e.g. sign-split solutions of `k * x < 1`.
    DisjunctionOfConjunctions(Vec<Relation>),
}

/// Classify `relation` after normalizing it.
pub fn classify(
    ctx: &mut Context,
    relation: &Relation,
    comparison_testing: bool,
) -> Result<EquationShape, SolveError> {
    let evaluated = eval_relation(ctx, relation, comparison_testing);
    match shape_of(&evaluated) {
        Some(shape) => Ok(shape),
        // One-shot re-probe: a relation that collapsed to true/false may
        // still be comparison-shaped when numeric collapse is off.
        None if comparison_testing => {
            let softer = eval_relation(ctx, relation, false);
            shape_of(&softer).ok_or(SolveError::NotAnEquation)
        }
        None => Err(SolveError::NotAnEquation),
    }
}

fn shape_of(relation: &Relation) -> Option<EquationShape> {
    match relation {
        Relation::Compare(eq) => Some(EquationShape::Comparison(*eq)),
        Relation::All(members) => Some(EquationShape::Conjunction(members.clone())),
        Relation::Any(branches) => {
            if branches.iter().any(|b| matches!(b, Relation::All(_))) {
                Some(EquationShape::DisjunctionOfConjunctions(branches.clone()))
            } else {
                Some(EquationShape::Disjunction(branches.clone()))
            }
        }
        Relation::True | Relation::False => None,
    }
}
