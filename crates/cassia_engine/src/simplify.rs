//! Normalizing simplifier.
//!
//! Bottom-up, single pass, idempotent: exact rational folding plus the
//! identity rules the isolation rewriter relies on. This is deliberately
//! not a general simplification strategy; it only has to bring isolation
//! results and substitution residues to a recognizable normal form.
//!
//! `Hold` is transparent to numeric folding (a held subtree that is a
//! plain number collapses) but opaque to every structural rule.

use cassia_ast::{BuiltinFn, Constant, Context, Expr, ExprId};
use num_bigint::BigInt;
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rustc_hash::FxHashMap;

/// Largest integer exponent folded exactly. Beyond this the power is
/// kept symbolic so a stray `2^10000` cannot blow up the arena.
const MAX_FOLD_EXP: i64 = 64;

pub fn simplify(ctx: &mut Context, id: ExprId) -> ExprId {
    let mut memo = FxHashMap::default();
    simplify_rec(ctx, id, &mut memo)
}

fn simplify_rec(ctx: &mut Context, id: ExprId, memo: &mut FxHashMap<ExprId, ExprId>) -> ExprId {
    if let Some(&done) = memo.get(&id) {
        return done;
    }
    let result = match ctx.get(id).clone() {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
        Expr::Hold(inner) => {
            let folded = simplify_rec(ctx, inner, memo);
            if matches!(ctx.get(folded), Expr::Number(_)) {
                folded
            } else {
                id
            }
        }
        Expr::Add(l, r) => {
            let (l, r) = (simplify_rec(ctx, l, memo), simplify_rec(ctx, r, memo));
            fold_add(ctx, l, r)
        }
        Expr::Sub(l, r) => {
            let (l, r) = (simplify_rec(ctx, l, memo), simplify_rec(ctx, r, memo));
            fold_sub(ctx, l, r)
        }
        Expr::Mul(l, r) => {
            let (l, r) = (simplify_rec(ctx, l, memo), simplify_rec(ctx, r, memo));
            fold_mul(ctx, l, r)
        }
        Expr::Div(l, r) => {
            let (l, r) = (simplify_rec(ctx, l, memo), simplify_rec(ctx, r, memo));
            fold_div(ctx, l, r)
        }
        Expr::Pow(b, e) => {
            let (b, e) = (simplify_rec(ctx, b, memo), simplify_rec(ctx, e, memo));
            fold_pow(ctx, b, e)
        }
        Expr::Neg(inner) => {
            let inner = simplify_rec(ctx, inner, memo);
            fold_neg(ctx, inner)
        }
        Expr::Function(sym, args) => {
            let args: Vec<ExprId> = args
                .iter()
                .map(|a| simplify_rec(ctx, *a, memo))
                .collect();
            fold_function(ctx, sym, args)
        }
    };
    memo.insert(id, result);
    result
}

fn number(ctx: &Context, id: ExprId) -> Option<&BigRational> {
    match ctx.get(id) {
        Expr::Number(n) => Some(n),
        _ => None,
    }
}

fn is_num(ctx: &Context, id: ExprId, pred: impl Fn(&BigRational) -> bool) -> bool {
    number(ctx, id).is_some_and(pred)
}

pub(crate) fn fold_add(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (number(ctx, l), number(ctx, r)) {
        let sum = a + b;
        return ctx.num_rational(sum);
    }
    if is_num(ctx, l, Zero::is_zero) {
        return r;
    }
    if is_num(ctx, r, Zero::is_zero) {
        return l;
    }
    if let Expr::Neg(inner) = *ctx.get(r) {
        return fold_sub(ctx, l, inner);
    }
    if let Expr::Neg(inner) = *ctx.get(l) {
        return fold_sub(ctx, r, inner);
    }
    // Merge trailing numeric terms: (a + n1) + n2 and n1 + (a + n2).
    if number(ctx, r).is_some() {
        if let Expr::Add(a, b) = *ctx.get(l) {
            if number(ctx, b).is_some() {
                let merged = fold_add(ctx, b, r);
                return fold_add(ctx, a, merged);
            }
        }
        if let Expr::Sub(a, b) = *ctx.get(l) {
            if number(ctx, b).is_some() {
                let merged = fold_sub(ctx, r, b);
                return fold_add(ctx, a, merged);
            }
        }
    }
    ctx.add2(l, r)
}

pub(crate) fn fold_sub(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if l == r {
        return ctx.num(0);
    }
    if let (Some(a), Some(b)) = (number(ctx, l), number(ctx, r)) {
        let diff = a - b;
        return ctx.num_rational(diff);
    }
    if is_num(ctx, r, Zero::is_zero) {
        return l;
    }
    if is_num(ctx, l, Zero::is_zero) {
        return fold_neg(ctx, r);
    }
    if let Expr::Neg(inner) = *ctx.get(r) {
        return fold_add(ctx, l, inner);
    }
    ctx.sub2(l, r)
}

pub(crate) fn fold_mul(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if let (Some(a), Some(b)) = (number(ctx, l), number(ctx, r)) {
        let prod = a * b;
        return ctx.num_rational(prod);
    }
    if is_num(ctx, l, Zero::is_zero) || is_num(ctx, r, Zero::is_zero) {
        return ctx.num(0);
    }
    if is_num(ctx, l, One::is_one) {
        return r;
    }
    if is_num(ctx, r, One::is_one) {
        return l;
    }
    if is_num(ctx, l, |n| *n == -BigRational::one()) {
        return fold_neg(ctx, r);
    }
    if is_num(ctx, r, |n| *n == -BigRational::one()) {
        return fold_neg(ctx, l);
    }
    if let Expr::Neg(inner) = *ctx.get(l) {
        let prod = fold_mul(ctx, inner, r);
        return fold_neg(ctx, prod);
    }
    if let Expr::Neg(inner) = *ctx.get(r) {
        let prod = fold_mul(ctx, l, inner);
        return fold_neg(ctx, prod);
    }
    // Merge leading numeric factors: n1 * (n2 * a).
    if number(ctx, l).is_some() {
        if let Expr::Mul(a, b) = *ctx.get(r) {
            if number(ctx, a).is_some() {
                let merged = fold_mul(ctx, l, a);
                return fold_mul(ctx, merged, b);
            }
        }
    }
    // Fold a numeric factor against a numeric divisor: n * (u / m).
    if let Some(scaled) = fold_numeric_ratio(ctx, l, r) {
        return scaled;
    }
    if let Some(scaled) = fold_numeric_ratio(ctx, r, l) {
        return scaled;
    }
    // Combine equal bases into a single power.
    if l == r {
        let two = ctx.num(2);
        return fold_pow(ctx, l, two);
    }
    if let (Some((lb, le)), Some((rb, re))) = (power_parts(ctx, l), power_parts(ctx, r)) {
        if lb == rb {
            if let (Some(a), Some(b)) = (number(ctx, le), number(ctx, re)) {
                let sum = a + b;
                let exp = ctx.num_rational(sum);
                return fold_pow(ctx, lb, exp);
            }
        }
    }
    ctx.mul2(l, r)
}

fn fold_numeric_ratio(ctx: &mut Context, n_id: ExprId, quot: ExprId) -> Option<ExprId> {
    let n = number(ctx, n_id)?.clone();
    let Expr::Div(u, v) = *ctx.get(quot) else {
        return None;
    };
    let m = number(ctx, v)?;
    if m.is_zero() {
        return None;
    }
    let ratio = n / m;
    let scale = ctx.num_rational(ratio);
    Some(fold_mul(ctx, scale, u))
}

/// View an expression as `base^exp`; a bare non-numeric expression
/// counts as `e^1`.
fn power_parts(ctx: &mut Context, id: ExprId) -> Option<(ExprId, ExprId)> {
    match *ctx.get(id) {
        Expr::Pow(b, e) => Some((b, e)),
        Expr::Number(_) => None,
        _ => {
            let one = ctx.num(1);
            Some((id, one))
        }
    }
}

pub(crate) fn fold_div(ctx: &mut Context, l: ExprId, r: ExprId) -> ExprId {
    if is_num(ctx, r, Zero::is_zero) {
        return ctx.constant(Constant::Undefined);
    }
    if l == r {
        return ctx.num(1);
    }
    if let (Some(a), Some(b)) = (number(ctx, l), number(ctx, r)) {
        let quot = a / b;
        return ctx.num_rational(quot);
    }
    if is_num(ctx, l, Zero::is_zero) {
        return ctx.num(0);
    }
    if is_num(ctx, r, One::is_one) {
        return l;
    }
    if is_num(ctx, r, |n| *n == -BigRational::one()) {
        return fold_neg(ctx, l);
    }
    if let Expr::Neg(inner) = *ctx.get(l) {
        let quot = fold_div(ctx, inner, r);
        return fold_neg(ctx, quot);
    }
    if let Expr::Neg(inner) = *ctx.get(r) {
        let quot = fold_div(ctx, l, inner);
        return fold_neg(ctx, quot);
    }
    ctx.div2(l, r)
}

pub(crate) fn fold_neg(ctx: &mut Context, inner: ExprId) -> ExprId {
    match ctx.get(inner).clone() {
        Expr::Number(n) => ctx.num_rational(-n),
        Expr::Neg(x) => x,
        Expr::Sub(a, b) => fold_sub(ctx, b, a),
        _ => ctx.neg(inner),
    }
}

pub(crate) fn fold_pow(ctx: &mut Context, base: ExprId, exp: ExprId) -> ExprId {
    if is_num(ctx, exp, Zero::is_zero) {
        return if is_num(ctx, base, Zero::is_zero) {
            ctx.constant(Constant::Undefined)
        } else {
            ctx.num(1)
        };
    }
    if is_num(ctx, exp, One::is_one) {
        return base;
    }
    if is_num(ctx, base, One::is_one) {
        return ctx.num(1);
    }
    if is_num(ctx, base, Zero::is_zero) && is_num(ctx, exp, |n| n.is_positive()) {
        return ctx.num(0);
    }
    if let (Some(b), Some(e)) = (number(ctx, base), number(ctx, exp)) {
        if let Some(folded) = rational_pow_exact(b, e) {
            return ctx.num_rational(folded);
        }
    }
    // Powers of e canonicalize to exp so the logarithm rules see them.
    if matches!(ctx.get(base), Expr::Constant(Constant::E)) {
        let sym = ctx.sym(BuiltinFn::Exp.name());
        return fold_function(ctx, sym, vec![exp]);
    }
    ctx.pow2(base, exp)
}

/// Exact value of `base^exp` when the result is rational and small
/// enough to fold. Fractional exponents fold only for perfect roots.
fn rational_pow_exact(base: &BigRational, exp: &BigRational) -> Option<BigRational> {
    let p = exp.numer().to_i64()?;
    let q = exp.denom().to_i64()?;
    if p.abs() > MAX_FOLD_EXP || q > MAX_FOLD_EXP {
        return None;
    }
    let rooted = if q == 1 {
        base.clone()
    } else {
        let numer = exact_nth_root(base.numer(), q as u32)?;
        let denom = exact_nth_root(base.denom(), q as u32)?;
        BigRational::new(numer, denom)
    };
    let mut acc = BigRational::one();
    for _ in 0..p.unsigned_abs() {
        acc *= &rooted;
    }
    if p < 0 {
        if acc.is_zero() {
            return None;
        }
        acc = acc.recip();
    }
    Some(acc)
}

fn exact_nth_root(x: &BigInt, n: u32) -> Option<BigInt> {
    if x.is_negative() {
        if n % 2 == 0 {
            return None;
        }
        return exact_nth_root(&-x, n).map(|r| -r);
    }
    let root = x.nth_root(n);
    (root.pow(n) == *x).then_some(root)
}

fn fold_function(ctx: &mut Context, sym: cassia_ast::SymbolId, args: Vec<ExprId>) -> ExprId {
    let Some(builtin) = ctx.builtin_of(sym) else {
        return ctx.add(Expr::Function(sym, args));
    };
    match (builtin, args.as_slice()) {
        (BuiltinFn::Sqrt, &[arg]) => {
            if let Some(n) = number(ctx, arg) {
                if !n.is_negative() {
                    if let (Some(numer), Some(denom)) =
                        (exact_sqrt(n.numer()), exact_sqrt(n.denom()))
                    {
                        return ctx.num_rational(BigRational::new(numer, denom));
                    }
                }
            }
            if let Expr::Pow(b, e) = *ctx.get(arg) {
                if is_num(ctx, e, |n| *n == BigRational::from_integer(BigInt::from(2))) {
                    return ctx.call_builtin(BuiltinFn::Abs, vec![b]);
                }
            }
            ctx.call_builtin(BuiltinFn::Sqrt, vec![arg])
        }
        (BuiltinFn::Abs, &[arg]) => {
            if let Some(n) = number(ctx, arg) {
                let abs = n.abs();
                return ctx.num_rational(abs);
            }
            if let Expr::Neg(inner) = *ctx.get(arg) {
                return ctx.call_builtin(BuiltinFn::Abs, vec![inner]);
            }
            ctx.call_builtin(BuiltinFn::Abs, vec![arg])
        }
        (BuiltinFn::Ln, &[arg]) => {
            if is_num(ctx, arg, One::is_one) {
                return ctx.num(0);
            }
            if matches!(ctx.get(arg), Expr::Constant(Constant::E)) {
                return ctx.num(1);
            }
            match *ctx.get(arg) {
                Expr::Function(inner_sym, ref inner_args)
                    if ctx.builtin_of(inner_sym) == Some(BuiltinFn::Exp)
                        && inner_args.len() == 1 =>
                {
                    inner_args[0]
                }
                Expr::Pow(b, e) if matches!(ctx.get(b), Expr::Constant(Constant::E)) => e,
                _ => ctx.call_builtin(BuiltinFn::Ln, vec![arg]),
            }
        }
        (BuiltinFn::Exp, &[arg]) => {
            if is_num(ctx, arg, Zero::is_zero) {
                return ctx.num(1);
            }
            if is_num(ctx, arg, One::is_one) {
                return ctx.constant(Constant::E);
            }
            if let Some(inner) = ln_argument(ctx, arg) {
                return inner;
            }
            if let Expr::Neg(neg_inner) = *ctx.get(arg) {
                if let Some(inner) = ln_argument(ctx, neg_inner) {
                    let one = ctx.num(1);
                    return fold_div(ctx, one, inner);
                }
            }
            if let Expr::Mul(a, b) = *ctx.get(arg) {
                if let Some(inner) = ln_argument(ctx, b) {
                    return fold_pow(ctx, inner, a);
                }
                if let Some(inner) = ln_argument(ctx, a) {
                    return fold_pow(ctx, inner, b);
                }
            }
            ctx.call_builtin(BuiltinFn::Exp, vec![arg])
        }
        (BuiltinFn::Sin, &[arg]) | (BuiltinFn::Tan, &[arg])
            if is_num(ctx, arg, Zero::is_zero) =>
        {
            ctx.num(0)
        }
        (BuiltinFn::Cos, &[arg]) if is_num(ctx, arg, Zero::is_zero) => ctx.num(1),
        (BuiltinFn::Log, &[base, arg]) => {
            if is_num(ctx, arg, One::is_one) {
                return ctx.num(0);
            }
            if base == arg {
                return ctx.num(1);
            }
            ctx.call_builtin(BuiltinFn::Log, vec![base, arg])
        }
        _ => ctx.add(Expr::Function(sym, args)),
    }
}

/// The `u` in `ln(u)`, when `id` is such a call.
fn ln_argument(ctx: &Context, id: ExprId) -> Option<ExprId> {
    match ctx.get(id) {
        Expr::Function(sym, args)
            if ctx.builtin_of(*sym) == Some(BuiltinFn::Ln) && args.len() == 1 =>
        {
            Some(args[0])
        }
        _ => None,
    }
}

fn exact_sqrt(x: &BigInt) -> Option<BigInt> {
    exact_nth_root(x, 2)
}
