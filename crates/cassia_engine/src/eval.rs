//! Approximate numeric evaluation.
//!
//! Used by the solution verifier: substitute concrete values, collapse to
//! `f64`, compare within tolerance. Returns `None` whenever a subtree has
//! no numeric meaning under the given bindings, which callers must treat
//! as "cannot check", not as failure.

use cassia_ast::{BuiltinFn, Constant, Context, Expr, ExprId, SymbolId};
use num_traits::ToPrimitive;
use rustc_hash::FxHashMap;

/// Evaluate `id` to a finite `f64` under the variable bindings.
pub fn eval_f64(
    ctx: &Context,
    id: ExprId,
    bindings: &FxHashMap<SymbolId, f64>,
) -> Option<f64> {
    let value = eval(ctx, id, bindings)?;
    value.is_finite().then_some(value)
}

fn eval(ctx: &Context, id: ExprId, bindings: &FxHashMap<SymbolId, f64>) -> Option<f64> {
    match ctx.get(id) {
        Expr::Number(n) => n.to_f64(),
        Expr::Constant(c) => match c {
            Constant::Pi => Some(std::f64::consts::PI),
            Constant::E => Some(std::f64::consts::E),
            Constant::Infinity | Constant::Undefined => None,
        },
        Expr::Variable(sym) => bindings.get(sym).copied(),
        Expr::Add(l, r) => Some(eval(ctx, *l, bindings)? + eval(ctx, *r, bindings)?),
        Expr::Sub(l, r) => Some(eval(ctx, *l, bindings)? - eval(ctx, *r, bindings)?),
        Expr::Mul(l, r) => Some(eval(ctx, *l, bindings)? * eval(ctx, *r, bindings)?),
        Expr::Div(l, r) => {
            let denom = eval(ctx, *r, bindings)?;
            if denom == 0.0 {
                return None;
            }
            Some(eval(ctx, *l, bindings)? / denom)
        }
        Expr::Pow(b, e) => Some(eval(ctx, *b, bindings)?.powf(eval(ctx, *e, bindings)?)),
        Expr::Neg(inner) => Some(-eval(ctx, *inner, bindings)?),
        Expr::Hold(inner) => eval(ctx, *inner, bindings),
        Expr::Function(sym, args) => {
            let f = ctx.builtin_of(*sym)?;
            eval_builtin(ctx, f, args, bindings)
        }
    }
}

fn eval_builtin(
    ctx: &Context,
    f: BuiltinFn,
    args: &[ExprId],
    bindings: &FxHashMap<SymbolId, f64>,
) -> Option<f64> {
    if f == BuiltinFn::Log {
        let [base, arg] = args else { return None };
        let base = eval(ctx, *base, bindings)?;
        let arg = eval(ctx, *arg, bindings)?;
        return Some(arg.log(base));
    }
    let [arg] = args else { return None };
    let x = eval(ctx, *arg, bindings)?;
    match f {
        BuiltinFn::Ln => Some(x.ln()),
        BuiltinFn::Exp => Some(x.exp()),
        BuiltinFn::Sqrt => Some(x.sqrt()),
        BuiltinFn::Abs => Some(x.abs()),
        BuiltinFn::Sin => Some(x.sin()),
        BuiltinFn::Cos => Some(x.cos()),
        BuiltinFn::Tan => Some(x.tan()),
        BuiltinFn::Arcsin => Some(x.asin()),
        BuiltinFn::Arccos => Some(x.acos()),
        BuiltinFn::Arctan => Some(x.atan()),
        // Derivative markers have no pointwise value.
        BuiltinFn::Diff => None,
        BuiltinFn::Log => unreachable!(),
    }
}
