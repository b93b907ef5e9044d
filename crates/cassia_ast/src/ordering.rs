//! Canonical structural ordering of expressions.
//!
//! Used to produce deterministic output when rewrites collect terms or
//! factors. The order is by node kind first, then by contents, so numbers
//! sort before variables and variables before compound terms.

use crate::context::{Context, ExprId};
use crate::expression::Expr;
use std::cmp::Ordering;

fn rank(e: &Expr) -> u8 {
    match e {
        Expr::Number(_) => 0,
        Expr::Constant(_) => 1,
        Expr::Variable(_) => 2,
        Expr::Function(_, _) => 3,
        Expr::Neg(_) => 4,
        Expr::Pow(_, _) => 5,
        Expr::Mul(_, _) => 6,
        Expr::Div(_, _) => 7,
        Expr::Add(_, _) => 8,
        Expr::Sub(_, _) => 9,
        Expr::Hold(_) => 10,
    }
}

/// Total order on expression trees.
pub fn compare_expr(ctx: &Context, a: ExprId, b: ExprId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let ea = ctx.get(a);
    let eb = ctx.get(b);
    match rank(ea).cmp(&rank(eb)) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match (ea, eb) {
        (Expr::Number(x), Expr::Number(y)) => x.cmp(y),
        (Expr::Constant(x), Expr::Constant(y)) => x.name().cmp(y.name()),
        (Expr::Variable(x), Expr::Variable(y)) => ctx.sym_name(*x).cmp(ctx.sym_name(*y)),
        (Expr::Function(fx, ax), Expr::Function(fy, ay)) => {
            match ctx.sym_name(*fx).cmp(ctx.sym_name(*fy)) {
                Ordering::Equal => compare_slices(ctx, ax, ay),
                ord => ord,
            }
        }
        (Expr::Neg(x), Expr::Neg(y)) | (Expr::Hold(x), Expr::Hold(y)) => {
            compare_expr(ctx, *x, *y)
        }
        (Expr::Pow(lx, rx), Expr::Pow(ly, ry))
        | (Expr::Mul(lx, rx), Expr::Mul(ly, ry))
        | (Expr::Div(lx, rx), Expr::Div(ly, ry))
        | (Expr::Add(lx, rx), Expr::Add(ly, ry))
        | (Expr::Sub(lx, rx), Expr::Sub(ly, ry)) => match compare_expr(ctx, *lx, *ly) {
            Ordering::Equal => compare_expr(ctx, *rx, *ry),
            ord => ord,
        },
        _ => unreachable!("rank equality guarantees matching variants"),
    }
}

fn compare_slices(ctx: &Context, a: &[ExprId], b: &[ExprId]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match compare_expr(ctx, *x, *y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}
