//! Approximate consistency checks against an initial condition.

use cassia_ast::{Context, ExprId, SymbolId};
use cassia_engine::{eval_f64, substitute_var};
use rustc_hash::FxHashMap;

pub(crate) const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Consistent,
    /// Symbolic leftovers on both sides; nothing to check numerically.
    Undetermined,
    Inconsistent,
}

/// Numeric value of `expr` at the initial pair, or `None` when it stays
/// symbolic or leaves the real domain.
pub(crate) fn side_value(
    ctx: &mut Context,
    expr: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    x0: ExprId,
    y0: ExprId,
) -> Option<f64> {
    let with_dep = substitute_var(ctx, expr, dep, y0);
    let substituted = substitute_var(ctx, with_dep, indep, x0);
    eval_f64(ctx, substituted, &FxHashMap::default())
}

/// Compare both sides of `lhs = rhs` at the initial pair.
pub(crate) fn test_equation(
    ctx: &mut Context,
    lhs: ExprId,
    rhs: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    x0: ExprId,
    y0: ExprId,
) -> Verdict {
    let l = side_value(ctx, lhs, dep, indep, x0, y0);
    let r = side_value(ctx, rhs, dep, indep, x0, y0);
    match (l, r) {
        (Some(l), Some(r)) => {
            if (l - r).abs() < TOLERANCE {
                Verdict::Consistent
            } else {
                Verdict::Inconsistent
            }
        }
        (None, None) => Verdict::Undetermined,
        // One side evaluates and the other does not: the relation's
        // dependency on the pair is broken, e.g. ln of a nonpositive
        // initial value.
        _ => Verdict::Inconsistent,
    }
}
