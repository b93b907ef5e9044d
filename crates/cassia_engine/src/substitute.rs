//! Substitution rewrites.
//!
//! Both walk the tree and rebuild; hash-consing in the arena keeps shared
//! unchanged subtrees at their old ids.

use cassia_ast::{Context, Expr, ExprId, SymbolId};

/// Replace every occurrence of the variable `sym` with `replacement`.
pub fn substitute_var(
    ctx: &mut Context,
    root: ExprId,
    sym: SymbolId,
    replacement: ExprId,
) -> ExprId {
    rebuild(ctx, root, &|ctx, id| {
        matches!(ctx.get(id), Expr::Variable(s) if *s == sym).then_some(replacement)
    })
}

/// Replace every occurrence of the node `target` (by interned identity)
/// with `replacement`.
pub fn substitute_expr(
    ctx: &mut Context,
    root: ExprId,
    target: ExprId,
    replacement: ExprId,
) -> ExprId {
    rebuild(ctx, root, &|_, id| (id == target).then_some(replacement))
}

fn rebuild<F>(ctx: &mut Context, id: ExprId, hit: &F) -> ExprId
where
    F: Fn(&Context, ExprId) -> Option<ExprId>,
{
    if let Some(replacement) = hit(ctx, id) {
        return replacement;
    }
    match ctx.get(id).clone() {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
        Expr::Add(l, r) => {
            let (l2, r2) = (rebuild(ctx, l, hit), rebuild(ctx, r, hit));
            if l2 == l && r2 == r {
                id
            } else {
                ctx.add2(l2, r2)
            }
        }
        Expr::Sub(l, r) => {
            let (l2, r2) = (rebuild(ctx, l, hit), rebuild(ctx, r, hit));
            if l2 == l && r2 == r {
                id
            } else {
                ctx.sub2(l2, r2)
            }
        }
        Expr::Mul(l, r) => {
            let (l2, r2) = (rebuild(ctx, l, hit), rebuild(ctx, r, hit));
            if l2 == l && r2 == r {
                id
            } else {
                ctx.mul2(l2, r2)
            }
        }
        Expr::Div(l, r) => {
            let (l2, r2) = (rebuild(ctx, l, hit), rebuild(ctx, r, hit));
            if l2 == l && r2 == r {
                id
            } else {
                ctx.div2(l2, r2)
            }
        }
        Expr::Pow(l, r) => {
            let (l2, r2) = (rebuild(ctx, l, hit), rebuild(ctx, r, hit));
            if l2 == l && r2 == r {
                id
            } else {
                ctx.pow2(l2, r2)
            }
        }
        Expr::Neg(inner) => {
            let inner2 = rebuild(ctx, inner, hit);
            if inner2 == inner {
                id
            } else {
                ctx.neg(inner2)
            }
        }
        Expr::Hold(inner) => {
            let inner2 = rebuild(ctx, inner, hit);
            if inner2 == inner {
                id
            } else {
                ctx.hold(inner2)
            }
        }
        Expr::Function(sym, args) => {
            let new_args: Vec<ExprId> = args.iter().map(|a| rebuild(ctx, *a, hit)).collect();
            if new_args == args {
                id
            } else {
                ctx.add(Expr::Function(sym, new_args))
            }
        }
    }
}
