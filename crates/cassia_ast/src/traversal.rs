//! Read-only tree walks.

use crate::context::{Context, ExprId};
use crate::expression::Expr;
use crate::symbol::SymbolId;

/// Visit every node of the subtree rooted at `id`, parents before children.
pub fn visit<F: FnMut(ExprId, &Expr)>(ctx: &Context, id: ExprId, f: &mut F) {
    let expr = ctx.get(id);
    f(id, expr);
    match expr {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
        Expr::Add(l, r)
        | Expr::Sub(l, r)
        | Expr::Mul(l, r)
        | Expr::Div(l, r)
        | Expr::Pow(l, r) => {
            visit(ctx, *l, f);
            visit(ctx, *r, f);
        }
        Expr::Neg(inner) | Expr::Hold(inner) => visit(ctx, *inner, f),
        Expr::Function(_, args) => {
            for arg in args {
                visit(ctx, *arg, f);
            }
        }
    }
}

/// Does the subtree mention the variable with symbol `sym`?
pub fn contains_symbol(ctx: &Context, id: ExprId, sym: SymbolId) -> bool {
    match ctx.get(id) {
        Expr::Variable(s) => *s == sym,
        Expr::Number(_) | Expr::Constant(_) => false,
        Expr::Add(l, r)
        | Expr::Sub(l, r)
        | Expr::Mul(l, r)
        | Expr::Div(l, r)
        | Expr::Pow(l, r) => contains_symbol(ctx, *l, sym) || contains_symbol(ctx, *r, sym),
        Expr::Neg(inner) | Expr::Hold(inner) => contains_symbol(ctx, *inner, sym),
        Expr::Function(_, args) => args.iter().any(|a| contains_symbol(ctx, *a, sym)),
    }
}

/// Does the subtree mention the variable `name`?
pub fn contains_var(ctx: &Context, id: ExprId, name: &str) -> bool {
    match ctx.sym_lookup(name) {
        Some(sym) => contains_symbol(ctx, id, sym),
        None => false,
    }
}

/// Does the subtree contain `needle` as a node (by interned identity)?
pub fn contains_expr(ctx: &Context, id: ExprId, needle: ExprId) -> bool {
    if id == needle {
        return true;
    }
    match ctx.get(id) {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => false,
        Expr::Add(l, r)
        | Expr::Sub(l, r)
        | Expr::Mul(l, r)
        | Expr::Div(l, r)
        | Expr::Pow(l, r) => contains_expr(ctx, *l, needle) || contains_expr(ctx, *r, needle),
        Expr::Neg(inner) | Expr::Hold(inner) => contains_expr(ctx, *inner, needle),
        Expr::Function(_, args) => args.iter().any(|a| contains_expr(ctx, *a, needle)),
    }
}

/// Symbols of all variables mentioned in the subtree, deduplicated.
pub fn collect_variables(ctx: &Context, id: ExprId) -> Vec<SymbolId> {
    let mut seen = Vec::new();
    visit(ctx, id, &mut |_, expr| {
        if let Expr::Variable(sym) = expr {
            if !seen.contains(sym) {
                seen.push(*sym);
            }
        }
    });
    seen
}

/// Number of nodes in the subtree, counting shared subtrees once per path.
pub fn node_count(ctx: &Context, id: ExprId) -> usize {
    let mut n = 0;
    visit(ctx, id, &mut |_, _| n += 1);
    n
}

/// Does the subtree call the function named `name` anywhere?
pub fn contains_call(ctx: &Context, id: ExprId, name: &str) -> bool {
    let Some(sym) = ctx.sym_lookup(name) else {
        return false;
    };
    let mut found = false;
    visit(ctx, id, &mut |_, expr| {
        if let Expr::Function(s, _) = expr {
            if *s == sym {
                found = true;
            }
        }
    });
    found
}
