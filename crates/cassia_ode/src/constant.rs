//! Constants of integration.
//!
//! Fresh names are drawn as `C`, `C1`, `C2`, ... skipping anything the
//! equation already mentions. After an explicit solve, additive constants
//! trapped inside an exponential are renamed into a multiplicative one.

use cassia_ast::traversal::collect_variables;
use cassia_ast::{BuiltinFn, Context, Expr, ExprId, SymbolId};
use cassia_engine::nary::{add_terms, build_sum};

/// First of `base`, `base1`, `base2`, ... not mentioned in any of
/// `used_in`.
pub fn fresh_symbol(ctx: &mut Context, base: &str, used_in: &[ExprId]) -> SymbolId {
    let mut used: Vec<String> = Vec::new();
    for &root in used_in {
        for sym in collect_variables(ctx, root) {
            used.push(ctx.sym_name(sym).to_string());
        }
    }
    if !used.iter().any(|name| name == base) {
        return ctx.sym(base);
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}{n}");
        if !used.iter().any(|name| *name == candidate) {
            return ctx.sym(&candidate);
        }
        n += 1;
    }
}

/// Rewrite `exp(u + C)` (and `exp(C)`) into `C * exp(u)` and `C`, reusing
/// the constant's name for the rescaled constant.
pub fn absorb_constant(ctx: &mut Context, root: ExprId, constant: SymbolId) -> ExprId {
    match ctx.get(root).clone() {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) | Expr::Hold(_) => root,
        Expr::Add(l, r) => {
            let (l2, r2) = (
                absorb_constant(ctx, l, constant),
                absorb_constant(ctx, r, constant),
            );
            ctx.add2(l2, r2)
        }
        Expr::Sub(l, r) => {
            let (l2, r2) = (
                absorb_constant(ctx, l, constant),
                absorb_constant(ctx, r, constant),
            );
            ctx.sub2(l2, r2)
        }
        Expr::Mul(l, r) => {
            let (l2, r2) = (
                absorb_constant(ctx, l, constant),
                absorb_constant(ctx, r, constant),
            );
            ctx.mul2(l2, r2)
        }
        Expr::Div(l, r) => {
            let (l2, r2) = (
                absorb_constant(ctx, l, constant),
                absorb_constant(ctx, r, constant),
            );
            ctx.div2(l2, r2)
        }
        Expr::Pow(l, r) => {
            let (l2, r2) = (
                absorb_constant(ctx, l, constant),
                absorb_constant(ctx, r, constant),
            );
            ctx.pow2(l2, r2)
        }
        Expr::Neg(inner) => {
            let inner2 = absorb_constant(ctx, inner, constant);
            ctx.neg(inner2)
        }
        Expr::Function(sym, args) => {
            if ctx.builtin_of(sym) == Some(BuiltinFn::Exp) && args.len() == 1 {
                if let Some(rewritten) = absorb_exp_argument(ctx, args[0], constant) {
                    return rewritten;
                }
            }
            let args: Vec<ExprId> = args
                .iter()
                .map(|a| absorb_constant(ctx, *a, constant))
                .collect();
            ctx.add(Expr::Function(sym, args))
        }
    }
}

fn absorb_exp_argument(ctx: &mut Context, arg: ExprId, constant: SymbolId) -> Option<ExprId> {
    let terms = add_terms(ctx, arg);
    let position = terms
        .iter()
        .position(|t| matches!(ctx.get(t.expr), Expr::Variable(s) if *s == constant))?;
    let mut rest = terms;
    rest.remove(position);
    let c_var = ctx.add(Expr::Variable(constant));
    if rest.is_empty() {
        return Some(c_var);
    }
    let rest_sum = build_sum(ctx, &rest);
    let exp = ctx.call_builtin(BuiltinFn::Exp, vec![rest_sum]);
    Some(ctx.mul2(c_var, exp))
}
