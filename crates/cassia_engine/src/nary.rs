//! Flattened views of nested additions and multiplications.
//!
//! The tree is strictly binary; rewrites that reason about "all terms of a
//! sum" or "all factors of a product" flatten first and rebuild after.

use crate::simplify::simplify;
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{Context, Expr, ExprId, SymbolId};

/// One term of a flattened sum. `negated` carries the sign so `a - b`
/// and `a + (-b)` flatten identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub expr: ExprId,
    pub negated: bool,
}

impl Term {
    pub fn positive(expr: ExprId) -> Self {
        Term {
            expr,
            negated: false,
        }
    }

    pub fn negative(expr: ExprId) -> Self {
        Term {
            expr,
            negated: true,
        }
    }

    pub fn flipped(self) -> Self {
        Term {
            expr: self.expr,
            negated: !self.negated,
        }
    }
}

/// Terms of the sum rooted at `id`, looking through `Add`, `Sub` and `Neg`.
pub fn add_terms(ctx: &Context, id: ExprId) -> Vec<Term> {
    let mut out = Vec::new();
    collect_terms(ctx, id, false, &mut out);
    out
}

fn collect_terms(ctx: &Context, id: ExprId, negated: bool, out: &mut Vec<Term>) {
    match ctx.get(id) {
        Expr::Add(l, r) => {
            collect_terms(ctx, *l, negated, out);
            collect_terms(ctx, *r, negated, out);
        }
        Expr::Sub(l, r) => {
            collect_terms(ctx, *l, negated, out);
            collect_terms(ctx, *r, !negated, out);
        }
        Expr::Neg(inner) => collect_terms(ctx, *inner, !negated, out),
        _ => out.push(Term { expr: id, negated }),
    }
}

/// Factors of the product rooted at `id`, looking through `Mul`.
pub fn mul_factors(ctx: &Context, id: ExprId) -> Vec<ExprId> {
    let mut out = Vec::new();
    collect_factors(ctx, id, &mut out);
    out
}

fn collect_factors(ctx: &Context, id: ExprId, out: &mut Vec<ExprId>) {
    match ctx.get(id) {
        Expr::Mul(l, r) => {
            collect_factors(ctx, *l, out);
            collect_factors(ctx, *r, out);
        }
        _ => out.push(id),
    }
}

/// Rebuild a sum from terms. Empty input is zero.
pub fn build_sum(ctx: &mut Context, terms: &[Term]) -> ExprId {
    let mut iter = terms.iter();
    let mut acc = match iter.next() {
        None => return ctx.num(0),
        Some(first) => {
            if first.negated {
                ctx.neg(first.expr)
            } else {
                first.expr
            }
        }
    };
    for term in iter {
        acc = if term.negated {
            ctx.sub2(acc, term.expr)
        } else {
            ctx.add2(acc, term.expr)
        };
    }
    acc
}

/// Rebuild a product from factors. Empty input is one.
pub fn build_product(ctx: &mut Context, factors: &[ExprId]) -> ExprId {
    let mut iter = factors.iter();
    let mut acc = match iter.next() {
        None => return ctx.num(1),
        Some(first) => *first,
    };
    for factor in iter {
        acc = ctx.mul2(acc, *factor);
    }
    acc
}

/// Decompose `id` as `a * var + b` with `a` and `b` free of `var`.
///
/// Fails (returns `None`) when any term mentions the variable other than
/// as a plain linear factor, e.g. under a power or inside a function call.
pub fn linear_coeffs(
    ctx: &mut Context,
    id: ExprId,
    var: SymbolId,
) -> Option<(ExprId, ExprId)> {
    let terms = add_terms(ctx, id);
    let mut coeff_terms: Vec<Term> = Vec::new();
    let mut const_terms: Vec<Term> = Vec::new();
    for term in terms {
        if !contains_symbol(ctx, term.expr, var) {
            const_terms.push(term);
            continue;
        }
        let coeff = term_coefficient(ctx, term.expr, var)?;
        coeff_terms.push(Term {
            expr: coeff,
            negated: term.negated,
        });
    }
    let a = build_sum(ctx, &coeff_terms);
    let b = build_sum(ctx, &const_terms);
    Some((simplify(ctx, a), simplify(ctx, b)))
}

/// Coefficient of `var` in a single term known to mention it.
fn term_coefficient(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<ExprId> {
    match ctx.get(id).clone() {
        Expr::Variable(s) if s == var => Some(ctx.num(1)),
        Expr::Neg(inner) => {
            let coeff = term_coefficient(ctx, inner, var)?;
            Some(ctx.neg(coeff))
        }
        Expr::Div(u, v) => {
            if contains_symbol(ctx, v, var) {
                return None;
            }
            let coeff = term_coefficient(ctx, u, var)?;
            Some(ctx.div2(coeff, v))
        }
        Expr::Mul(_, _) => {
            let factors = mul_factors(ctx, id);
            let mut var_seen = false;
            let mut rest = Vec::new();
            for f in factors {
                if matches!(ctx.get(f), Expr::Variable(s) if *s == var) {
                    if var_seen {
                        return None;
                    }
                    var_seen = true;
                } else if contains_symbol(ctx, f, var) {
                    return None;
                } else {
                    rest.push(f);
                }
            }
            var_seen.then(|| build_product(ctx, &rest))
        }
        _ => None,
    }
}
