//! Derivative term recognition.
//!
//! A first-order derivative appears as `diff(y, x)` with both arguments
//! plain variables. Anything nested under another `diff` is higher order.

use crate::error::OdeError;
use cassia_ast::{BuiltinFn, Context, Expr, ExprId, SymbolId};

/// The `diff(y, x)` node found in an equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeTerm {
    pub id: ExprId,
}

/// Locate the derivative of `dep` with respect to `indep` in `root`.
///
/// Returns `Ok(None)` when the subtree has no such derivative. A `diff`
/// call whose first argument itself contains a `diff` call is rejected
/// as higher order.
pub fn find_derivative(
    ctx: &Context,
    root: ExprId,
    dep: SymbolId,
    indep: SymbolId,
) -> Result<Option<DerivativeTerm>, OdeError> {
    let mut found = None;
    scan(ctx, root, dep, indep, &mut found)?;
    Ok(found)
}

fn scan(
    ctx: &Context,
    id: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    found: &mut Option<DerivativeTerm>,
) -> Result<(), OdeError> {
    match ctx.get(id) {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => Ok(()),
        Expr::Add(l, r)
        | Expr::Sub(l, r)
        | Expr::Mul(l, r)
        | Expr::Div(l, r)
        | Expr::Pow(l, r) => {
            scan(ctx, *l, dep, indep, found)?;
            scan(ctx, *r, dep, indep, found)
        }
        Expr::Neg(inner) | Expr::Hold(inner) => scan(ctx, *inner, dep, indep, found),
        Expr::Function(sym, args) => {
            if ctx.builtin_of(*sym) == Some(BuiltinFn::Diff) {
                let [subject, wrt] = args.as_slice() else {
                    return Ok(());
                };
                if contains_diff(ctx, *subject) {
                    return Err(OdeError::HigherOrder);
                }
                let subject_matches =
                    matches!(ctx.get(*subject), Expr::Variable(s) if *s == dep);
                let wrt_matches = matches!(ctx.get(*wrt), Expr::Variable(s) if *s == indep);
                if subject_matches && wrt_matches {
                    *found = Some(DerivativeTerm { id });
                }
                return Ok(());
            }
            for arg in args {
                scan(ctx, *arg, dep, indep, found)?;
            }
            Ok(())
        }
    }
}

fn contains_diff(ctx: &Context, id: ExprId) -> bool {
    let mut found = false;
    cassia_ast::traversal::visit(ctx, id, &mut |_, expr| {
        if let Expr::Function(sym, _) = expr {
            if ctx.builtin_of(*sym) == Some(BuiltinFn::Diff) {
                found = true;
            }
        }
    });
    found
}
