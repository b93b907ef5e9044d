//! Symbolic differentiation and table-driven integration.
//!
//! Both report success or failure through `Option`; the ODE layer treats a
//! `None` as "this classification does not apply" and moves on, so an
//! incomplete table here degrades capability, never correctness.

use crate::nary::{linear_coeffs, mul_factors, build_product};
use crate::simplify::{fold_add, fold_div, fold_mul, fold_neg, fold_pow, fold_sub, simplify};
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{BuiltinFn, Constant, Context, Expr, ExprId, SymbolId};
use num_rational::BigRational;
use num_traits::One;

/// Derivative of `id` with respect to `var`, or `None` when a subtree has
/// no rule.
pub fn differentiate(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<ExprId> {
    let raw = diff_rec(ctx, id, var)?;
    Some(simplify(ctx, raw))
}

fn diff_rec(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<ExprId> {
    if !contains_symbol(ctx, id, var) {
        return Some(ctx.num(0));
    }
    match ctx.get(id).clone() {
        Expr::Variable(s) if s == var => Some(ctx.num(1)),
        Expr::Add(l, r) => {
            let (dl, dr) = (diff_rec(ctx, l, var)?, diff_rec(ctx, r, var)?);
            Some(fold_add(ctx, dl, dr))
        }
        Expr::Sub(l, r) => {
            let (dl, dr) = (diff_rec(ctx, l, var)?, diff_rec(ctx, r, var)?);
            Some(fold_sub(ctx, dl, dr))
        }
        Expr::Neg(inner) => {
            let d = diff_rec(ctx, inner, var)?;
            Some(fold_neg(ctx, d))
        }
        Expr::Mul(l, r) => {
            let (dl, dr) = (diff_rec(ctx, l, var)?, diff_rec(ctx, r, var)?);
            let left = fold_mul(ctx, dl, r);
            let right = fold_mul(ctx, l, dr);
            Some(fold_add(ctx, left, right))
        }
        Expr::Div(l, r) => {
            let (dl, dr) = (diff_rec(ctx, l, var)?, diff_rec(ctx, r, var)?);
            let left = fold_mul(ctx, dl, r);
            let right = fold_mul(ctx, l, dr);
            let numer = fold_sub(ctx, left, right);
            let two = ctx.num(2);
            let denom = fold_pow(ctx, r, two);
            Some(fold_div(ctx, numer, denom))
        }
        Expr::Pow(b, e) => diff_pow(ctx, b, e, var),
        Expr::Function(sym, args) => diff_function(ctx, sym, &args, var),
        // A held subtree is protected from rewriting, including this one.
        Expr::Hold(_) => None,
        _ => None,
    }
}

fn diff_pow(ctx: &mut Context, b: ExprId, e: ExprId, var: SymbolId) -> Option<ExprId> {
    let base_varies = contains_symbol(ctx, b, var);
    let exp_varies = contains_symbol(ctx, e, var);
    if base_varies && !exp_varies {
        // e * b^(e-1) * b'
        let one = ctx.num(1);
        let e_minus_1 = fold_sub(ctx, e, one);
        let pow = fold_pow(ctx, b, e_minus_1);
        let db = diff_rec(ctx, b, var)?;
        let scaled = fold_mul(ctx, e, pow);
        Some(fold_mul(ctx, scaled, db))
    } else if !base_varies && exp_varies {
        // b^e * ln(b) * e'
        let pow = fold_pow(ctx, b, e);
        let ln_b = ctx.call_builtin(BuiltinFn::Ln, vec![b]);
        let de = diff_rec(ctx, e, var)?;
        let scaled = fold_mul(ctx, pow, ln_b);
        Some(fold_mul(ctx, scaled, de))
    } else {
        // b^e * (e' ln b + e b'/b)
        let pow = fold_pow(ctx, b, e);
        let ln_b = ctx.call_builtin(BuiltinFn::Ln, vec![b]);
        let de = diff_rec(ctx, e, var)?;
        let db = diff_rec(ctx, b, var)?;
        let left = fold_mul(ctx, de, ln_b);
        let ratio = fold_div(ctx, db, b);
        let right = fold_mul(ctx, e, ratio);
        let bracket = fold_add(ctx, left, right);
        Some(fold_mul(ctx, pow, bracket))
    }
}

fn diff_function(
    ctx: &mut Context,
    sym: SymbolId,
    args: &[ExprId],
    var: SymbolId,
) -> Option<ExprId> {
    let builtin = ctx.builtin_of(sym)?;
    if builtin == BuiltinFn::Log {
        let &[base, u] = args else { return None };
        if contains_symbol(ctx, base, var) {
            return None;
        }
        // u' / (u * ln(base))
        let du = diff_rec(ctx, u, var)?;
        let ln_base = ctx.call_builtin(BuiltinFn::Ln, vec![base]);
        let denom = fold_mul(ctx, u, ln_base);
        return Some(fold_div(ctx, du, denom));
    }
    let &[u] = args else { return None };
    let du = diff_rec(ctx, u, var)?;
    let outer = match builtin {
        BuiltinFn::Ln => {
            let one = ctx.num(1);
            fold_div(ctx, one, u)
        }
        BuiltinFn::Exp => ctx.call_builtin(BuiltinFn::Exp, vec![u]),
        BuiltinFn::Sqrt => {
            let one = ctx.num(1);
            let two = ctx.num(2);
            let root = ctx.call_builtin(BuiltinFn::Sqrt, vec![u]);
            let denom = fold_mul(ctx, two, root);
            fold_div(ctx, one, denom)
        }
        BuiltinFn::Sin => ctx.call_builtin(BuiltinFn::Cos, vec![u]),
        BuiltinFn::Cos => {
            let sin = ctx.call_builtin(BuiltinFn::Sin, vec![u]);
            fold_neg(ctx, sin)
        }
        BuiltinFn::Tan => {
            let one = ctx.num(1);
            let two = ctx.num(2);
            let cos = ctx.call_builtin(BuiltinFn::Cos, vec![u]);
            let sq = fold_pow(ctx, cos, two);
            fold_div(ctx, one, sq)
        }
        BuiltinFn::Arcsin | BuiltinFn::Arccos => {
            let one = ctx.num(1);
            let two = ctx.num(2);
            let sq = fold_pow(ctx, u, two);
            let inner = fold_sub(ctx, one, sq);
            let root = ctx.call_builtin(BuiltinFn::Sqrt, vec![inner]);
            let frac = fold_div(ctx, one, root);
            if builtin == BuiltinFn::Arccos {
                fold_neg(ctx, frac)
            } else {
                frac
            }
        }
        BuiltinFn::Arctan => {
            let one = ctx.num(1);
            let two = ctx.num(2);
            let sq = fold_pow(ctx, u, two);
            let denom = fold_add(ctx, one, sq);
            fold_div(ctx, one, denom)
        }
        BuiltinFn::Abs | BuiltinFn::Diff | BuiltinFn::Log => return None,
    };
    Some(fold_mul(ctx, outer, du))
}

/// Antiderivative of `id` with respect to `var`, or `None` when the
/// expression is outside the table.
pub fn integrate(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<ExprId> {
    let raw = int_rec(ctx, id, var)?;
    Some(simplify(ctx, raw))
}

fn int_rec(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<ExprId> {
    if !contains_symbol(ctx, id, var) {
        let x = ctx.add(Expr::Variable(var));
        return Some(fold_mul(ctx, id, x));
    }
    match ctx.get(id).clone() {
        Expr::Variable(s) if s == var => {
            let two = ctx.num(2);
            let sq = fold_pow(ctx, id, two);
            Some(fold_div(ctx, sq, two))
        }
        Expr::Add(l, r) => {
            let (il, ir) = (int_rec(ctx, l, var)?, int_rec(ctx, r, var)?);
            Some(fold_add(ctx, il, ir))
        }
        Expr::Sub(l, r) => {
            let (il, ir) = (int_rec(ctx, l, var)?, int_rec(ctx, r, var)?);
            Some(fold_sub(ctx, il, ir))
        }
        Expr::Neg(inner) => {
            let i = int_rec(ctx, inner, var)?;
            Some(fold_neg(ctx, i))
        }
        Expr::Mul(_, _) => {
            // Pull all constant factors out, integrate what remains.
            let factors = mul_factors(ctx, id);
            let (fixed, varying): (Vec<_>, Vec<_>) = factors
                .into_iter()
                .partition(|f| !contains_symbol(ctx, *f, var));
            if fixed.is_empty() {
                return None;
            }
            let rest = build_product(ctx, &varying);
            let integral = int_rec(ctx, rest, var)?;
            let scale = build_product(ctx, &fixed);
            Some(fold_mul(ctx, scale, integral))
        }
        Expr::Div(u, v) => int_quotient(ctx, u, v, var),
        Expr::Pow(b, e) => int_power(ctx, b, e, var),
        Expr::Function(sym, args) => int_function(ctx, sym, &args, var),
        _ => None,
    }
}

fn int_quotient(ctx: &mut Context, u: ExprId, v: ExprId, var: SymbolId) -> Option<ExprId> {
    if !contains_symbol(ctx, v, var) {
        let integral = int_rec(ctx, u, var)?;
        return Some(fold_div(ctx, integral, v));
    }
    if contains_symbol(ctx, u, var) {
        return None;
    }
    // u / v with constant u: recognized reciprocal shapes.
    let recip = int_reciprocal(ctx, v, var)?;
    Some(fold_mul(ctx, u, recip))
}

/// Antiderivative of `1 / v` for the recognized shapes of `v`.
fn int_reciprocal(ctx: &mut Context, v: ExprId, var: SymbolId) -> Option<ExprId> {
    // 1 / (a*x + b)  ->  ln(a*x + b) / a
    if let Some((a, _)) = linear_coeffs(ctx, v, var) {
        if !matches!(ctx.as_number(a), Some(n) if n == BigRational::from_integer(0.into())) {
            let ln = ctx.call_builtin(BuiltinFn::Ln, vec![v]);
            return Some(fold_div(ctx, ln, a));
        }
    }
    match ctx.get(v).clone() {
        Expr::Pow(b, e) => {
            let n = ctx.as_number(e)?;
            // 1 / cos(u)^2  ->  tan(u) / a  for linear u
            if n == BigRational::from_integer(2.into()) {
                if let Expr::Function(fsym, fargs) = ctx.get(b).clone() {
                    if ctx.builtin_of(fsym) == Some(BuiltinFn::Cos) && fargs.len() == 1 {
                        let u = fargs[0];
                        let (a, _) = linear_coeffs(ctx, u, var)?;
                        let tan = ctx.call_builtin(BuiltinFn::Tan, vec![u]);
                        return Some(fold_div(ctx, tan, a));
                    }
                }
            }
            // 1 / u^n  ->  integral of u^(-n)
            let neg = ctx.num_rational(-n);
            int_power(ctx, b, neg, var)
        }
        // 1 / (1 + x^2)  ->  arctan(x)
        Expr::Add(l, r) => {
            let sq_side = if ctx.as_number(l).is_some_and(|n| n.is_one()) {
                r
            } else if ctx.as_number(r).is_some_and(|n| n.is_one()) {
                l
            } else {
                return None;
            };
            match ctx.get(sq_side).clone() {
                Expr::Pow(b, e)
                    if matches!(ctx.get(b), Expr::Variable(s) if *s == var)
                        && ctx
                            .as_number(e)
                            .is_some_and(|n| n == BigRational::from_integer(2.into())) =>
                {
                    Some(ctx.call_builtin(BuiltinFn::Arctan, vec![b]))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn int_power(ctx: &mut Context, b: ExprId, e: ExprId, var: SymbolId) -> Option<ExprId> {
    if contains_symbol(ctx, e, var) {
        // a^x -> a^x / ln(a), for constant positive base
        if contains_symbol(ctx, b, var) {
            return None;
        }
        let (a, _) = linear_coeffs(ctx, e, var)?;
        if matches!(ctx.get(b), Expr::Constant(Constant::E)) {
            let pow = fold_pow(ctx, b, e);
            return Some(fold_div(ctx, pow, a));
        }
        let pow = fold_pow(ctx, b, e);
        let ln = ctx.call_builtin(BuiltinFn::Ln, vec![b]);
        let denom = fold_mul(ctx, a, ln);
        return Some(fold_div(ctx, pow, denom));
    }
    let n = ctx.as_number(e)?;
    let (a, _) = linear_coeffs(ctx, b, var)?;
    if n == BigRational::from_integer((-1).into()) {
        // u^(-1) -> ln(u) / a
        let ln = ctx.call_builtin(BuiltinFn::Ln, vec![b]);
        return Some(fold_div(ctx, ln, a));
    }
    // u^n -> u^(n+1) / (a * (n+1))
    let n_plus_1 = ctx.num_rational(n + BigRational::one());
    let pow = fold_pow(ctx, b, n_plus_1);
    let scale = fold_mul(ctx, a, n_plus_1);
    Some(fold_div(ctx, pow, scale))
}

fn int_function(
    ctx: &mut Context,
    sym: SymbolId,
    args: &[ExprId],
    var: SymbolId,
) -> Option<ExprId> {
    let builtin = ctx.builtin_of(sym)?;
    let &[u] = args else { return None };
    let (a, _) = linear_coeffs(ctx, u, var)?;
    match builtin {
        BuiltinFn::Exp => {
            let exp = ctx.call_builtin(BuiltinFn::Exp, vec![u]);
            Some(fold_div(ctx, exp, a))
        }
        BuiltinFn::Sin => {
            let cos = ctx.call_builtin(BuiltinFn::Cos, vec![u]);
            let scaled = fold_div(ctx, cos, a);
            Some(fold_neg(ctx, scaled))
        }
        BuiltinFn::Cos => {
            let sin = ctx.call_builtin(BuiltinFn::Sin, vec![u]);
            Some(fold_div(ctx, sin, a))
        }
        _ => None,
    }
}
