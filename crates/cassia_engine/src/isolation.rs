//! Inverse-rewrite isolation of a target variable.
//!
//! The entry point takes one comparison and peels structure off the side
//! holding the variable: subtract terms, divide factors, take roots and
//! logarithms, apply inverse functions. Order comparisons flip when both
//! sides are multiplied or divided by something known negative; an unknown
//! sign splits the result into sign-conditioned branches.
//!
//! Results are [`Relation`] values: a single comparison for the ordinary
//! case, `Any`/`All` combinations for branching rewrites (absolute value,
//! even powers), and `True`/`False` when the variable drops out and the
//! residue can be decided.

use crate::assumptions::{Assumptions, Sign};
use crate::budget::SolveBudget;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::nary::linear_coeffs;
use crate::simplify::{fold_add, fold_div, fold_mul, fold_neg, fold_pow, fold_sub, simplify};
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{
    BuiltinFn, Context, DisplayExpr, Equation, Expr, ExprId, RelOp, Relation, SymbolId,
};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use tracing::debug;

/// Normalize a relation tree: simplify every comparison's sides and, when
/// `testing` is set, collapse decidable comparisons to `True`/`False`.
///
/// The solver's soft re-probe for "is this really an equation?" runs this
/// with `testing` off, so a tautological input stays visible as a
/// comparison instead of evaporating into a boolean.
pub fn eval_relation(ctx: &mut Context, rel: &Relation, testing: bool) -> Relation {
    match rel {
        Relation::True => Relation::True,
        Relation::False => Relation::False,
        Relation::Compare(eq) => {
            let lhs = simplify(ctx, eq.lhs);
            let rhs = simplify(ctx, eq.rhs);
            if testing {
                if let (Some(a), Some(b)) = (ctx.as_number(lhs), ctx.as_number(rhs)) {
                    return bool_rel(op_holds(eq.op, a.cmp(&b)));
                }
                if lhs == rhs {
                    return bool_rel(eq.op.allows_equal());
                }
            }
            Relation::Compare(Equation::new(lhs, eq.op, rhs))
        }
        Relation::All(parts) => {
            let parts = parts.iter().map(|p| eval_relation(ctx, p, testing)).collect();
            Relation::and(parts)
        }
        Relation::Any(parts) => {
            let parts = parts.iter().map(|p| eval_relation(ctx, p, testing)).collect();
            Relation::or(parts)
        }
    }
}

/// Isolate `var` in a single comparison.
pub fn isolate_equation(
    ctx: &mut Context,
    eq: &Equation,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    debug!(
        target = ctx.sym_name(var),
        "isolating {}",
        cassia_ast::DisplayEquation::new(ctx, *eq)
    );
    step(ctx, eq.lhs, eq.op, eq.rhs, var, assumptions, diagnostics, budget)
}

#[allow(clippy::too_many_arguments)]
fn step(
    ctx: &mut Context,
    lhs: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let budget = budget.descend()?;
    let lhs = simplify(ctx, lhs);
    let rhs = simplify(ctx, rhs);
    let l_has = contains_symbol(ctx, lhs, var);
    let r_has = contains_symbol(ctx, rhs, var);

    if !l_has && !r_has {
        return Ok(var_free_compare(ctx, lhs, op, rhs));
    }
    if !l_has && r_has {
        return step(ctx, rhs, op.flip(), lhs, var, assumptions, diagnostics, &budget);
    }
    if l_has && r_has {
        let moved = fold_sub(ctx, lhs, rhs);
        let zero = ctx.num(0);
        return step(ctx, moved, op, zero, var, assumptions, diagnostics, &budget);
    }

    match ctx.get(lhs).clone() {
        Expr::Variable(s) if s == var => Ok(finalize(ctx, var, op, rhs, assumptions)),
        Expr::Neg(inner) => {
            let neg_rhs = fold_neg(ctx, rhs);
            step(ctx, inner, op.flip(), neg_rhs, var, assumptions, diagnostics, &budget)
        }
        Expr::Add(l, r) => {
            let (l_in, r_in) = (contains_symbol(ctx, l, var), contains_symbol(ctx, r, var));
            if l_in && r_in {
                return solve_linear(ctx, lhs, op, rhs, var, assumptions, diagnostics, &budget);
            }
            let (keep, move_out) = if l_in { (l, r) } else { (r, l) };
            let new_rhs = fold_sub(ctx, rhs, move_out);
            step(ctx, keep, op, new_rhs, var, assumptions, diagnostics, &budget)
        }
        Expr::Sub(l, r) => {
            let (l_in, r_in) = (contains_symbol(ctx, l, var), contains_symbol(ctx, r, var));
            if l_in && r_in {
                return solve_linear(ctx, lhs, op, rhs, var, assumptions, diagnostics, &budget);
            }
            if l_in {
                let new_rhs = fold_add(ctx, rhs, r);
                step(ctx, l, op, new_rhs, var, assumptions, diagnostics, &budget)
            } else {
                // l - r op c  ==>  r op' l - c
                let new_rhs = fold_sub(ctx, l, rhs);
                step(ctx, r, op.flip(), new_rhs, var, assumptions, diagnostics, &budget)
            }
        }
        Expr::Mul(l, r) => {
            let (l_in, r_in) = (contains_symbol(ctx, l, var), contains_symbol(ctx, r, var));
            if l_in && r_in {
                return solve_linear(ctx, lhs, op, rhs, var, assumptions, diagnostics, &budget);
            }
            let (keep, factor) = if l_in { (l, r) } else { (r, l) };
            let new_rhs = fold_div(ctx, rhs, factor);
            divide_through(
                ctx, keep, op, new_rhs, factor, var, assumptions, diagnostics, &budget,
            )
        }
        Expr::Div(l, r) => {
            let (l_in, r_in) = (contains_symbol(ctx, l, var), contains_symbol(ctx, r, var));
            if l_in && r_in {
                return Err(partial(ctx, var));
            }
            if l_in {
                let new_rhs = fold_mul(ctx, rhs, r);
                divide_through(
                    ctx, l, op, new_rhs, r, var, assumptions, diagnostics, &budget,
                )
            } else {
                solve_var_denominator(
                    ctx, l, op, rhs, r, var, assumptions, diagnostics, &budget,
                )
            }
        }
        Expr::Pow(b, e) => solve_pow(ctx, b, e, op, rhs, var, assumptions, diagnostics, &budget),
        Expr::Function(fsym, args) => {
            solve_function(ctx, fsym, &args, op, rhs, var, assumptions, diagnostics, &budget)
        }
        // A held subtree is a barrier: the variable inside is unreachable.
        Expr::Hold(_) => Err(partial(ctx, var)),
        _ => Err(partial(ctx, var)),
    }
}

/// `keep op rhs` after both sides were divided by `factor`; applies the
/// inequality flip or splits into sign-conditioned branches.
#[allow(clippy::too_many_arguments)]
fn divide_through(
    ctx: &mut Context,
    keep: ExprId,
    op: RelOp,
    new_rhs: ExprId,
    factor: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    match known_sign(ctx, factor, assumptions) {
        Some(Ordering::Equal) => {
            // Dividing by a literal zero: the rewrite is meaningless.
            Ok(Relation::False)
        }
        Some(Ordering::Greater) => {
            step(ctx, keep, op, new_rhs, var, assumptions, diagnostics, budget)
        }
        Some(Ordering::Less) => step(
            ctx,
            keep,
            op.flip(),
            new_rhs,
            var,
            assumptions,
            diagnostics,
            budget,
        ),
        None if !op.is_order() => {
            diagnostics.advisory(format!(
                "assuming {} is not zero",
                DisplayExpr::new(ctx, factor)
            ));
            step(ctx, keep, op, new_rhs, var, assumptions, diagnostics, budget)
        }
        None => {
            let zero = ctx.num(0);
            let pos_cond = var_free_compare(ctx, factor, RelOp::Gt, zero);
            let pos = step(ctx, keep, op, new_rhs, var, assumptions, diagnostics, budget)?;
            let neg_cond = var_free_compare(ctx, factor, RelOp::Lt, zero);
            let neg = step(
                ctx,
                keep,
                op.flip(),
                new_rhs,
                var,
                assumptions,
                diagnostics,
                budget,
            )?;
            Ok(Relation::or(vec![
                Relation::and(vec![pos_cond, pos]),
                Relation::and(vec![neg_cond, neg]),
            ]))
        }
    }
}

/// `numer / denom op rhs` with the variable inside `denom`.
#[allow(clippy::too_many_arguments)]
fn solve_var_denominator(
    ctx: &mut Context,
    numer: ExprId,
    op: RelOp,
    rhs: ExprId,
    denom: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    if !op.is_order() {
        // n / d = c  ==>  d = n / c
        if let Some(c) = ctx.as_number(rhs) {
            if c.is_zero() {
                // A nonzero numerator over anything is never zero.
                return Ok(match (op, ctx.as_number(numer)) {
                    (RelOp::Eq, Some(n)) if !n.is_zero() => Relation::False,
                    (RelOp::Neq, Some(n)) if !n.is_zero() => Relation::True,
                    _ => Relation::False,
                });
            }
        } else {
            diagnostics.advisory(format!(
                "assuming {} is not zero",
                DisplayExpr::new(ctx, rhs)
            ));
        }
        let new_rhs = fold_div(ctx, numer, rhs);
        return step(ctx, denom, op, new_rhs, var, assumptions, diagnostics, budget);
    }
    // Order comparison: multiply through by the denominator, branching on
    // its sign. Each branch carries the sign condition as a conjunct; the
    // condition itself is a comparison in the target variable and is
    // isolated recursively.
    let crossed = fold_mul(ctx, rhs, denom);
    let zero = ctx.num(0);
    let pos_cond = step(ctx, denom, RelOp::Gt, zero, var, assumptions, diagnostics, budget)?;
    let pos_body = step(
        ctx, crossed, op.flip(), numer, var, assumptions, diagnostics, budget,
    )?;
    let neg_cond = step(ctx, denom, RelOp::Lt, zero, var, assumptions, diagnostics, budget)?;
    let neg_body = step(ctx, crossed, op, numer, var, assumptions, diagnostics, budget)?;
    Ok(Relation::or(vec![
        Relation::and(vec![pos_cond, pos_body]),
        Relation::and(vec![neg_cond, neg_body]),
    ]))
}

#[allow(clippy::too_many_arguments)]
fn solve_pow(
    ctx: &mut Context,
    base: ExprId,
    exp: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let base_in = contains_symbol(ctx, base, var);
    let exp_in = contains_symbol(ctx, exp, var);
    if base_in && exp_in {
        return Err(partial(ctx, var));
    }
    if exp_in {
        return solve_exponential(
            ctx, base, exp, op, rhs, var, assumptions, diagnostics, budget,
        );
    }
    let Some(n) = ctx.as_number(exp) else {
        return Err(partial(ctx, var));
    };
    if n.is_integer() {
        let Some(k) = n.numer().to_i64() else {
            return Err(partial(ctx, var));
        };
        if k < 0 {
            // b^(-m) = 1 / b^m: reroute through the division rules.
            let one = ctx.num(1);
            let m = ctx.num(-k);
            let pow = fold_pow(ctx, base, m);
            let frac = ctx.div2(one, pow);
            return step(ctx, frac, op, rhs, var, assumptions, diagnostics, budget);
        }
        if k % 2 == 1 {
            // Odd powers are strictly monotone: a single root, order kept.
            let root = nth_root(ctx, rhs, k);
            return step(ctx, base, op, root, var, assumptions, diagnostics, budget);
        }
        return solve_even_power(
            ctx, base, k, op, rhs, var, assumptions, diagnostics, budget,
        );
    }
    // Fractional exponent: principal branch only.
    diagnostics.advisory("taking the principal root only".to_string());
    let inv = ctx.num_rational(n.recip());
    let new_rhs = fold_pow(ctx, rhs, inv);
    let next_op = if n.is_negative() { op.flip() } else { op };
    step(ctx, base, next_op, new_rhs, var, assumptions, diagnostics, budget)
}

#[allow(clippy::too_many_arguments)]
fn solve_even_power(
    ctx: &mut Context,
    base: ExprId,
    k: i64,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let root = nth_root(ctx, rhs, k);
    let neg_root = fold_neg(ctx, root);
    let rhs_num = ctx.as_number(rhs);
    match op {
        RelOp::Eq | RelOp::Neq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    return Ok(bool_rel(op == RelOp::Neq));
                }
                if c.is_zero() {
                    let zero = ctx.num(0);
                    return step(ctx, base, op, zero, var, assumptions, diagnostics, budget);
                }
            }
            let hi = step(ctx, base, op, root, var, assumptions, diagnostics, budget)?;
            let lo = step(ctx, base, op, neg_root, var, assumptions, diagnostics, budget)?;
            let mut branches = vec![hi, lo];
            if rhs_num.is_none() {
                let zero = ctx.num(0);
                let nonneg = var_free_compare(ctx, rhs, RelOp::Geq, zero);
                branches = branches
                    .into_iter()
                    .map(|b| Relation::and(vec![b, nonneg.clone()]))
                    .collect();
            }
            Ok(if op == RelOp::Eq {
                Relation::or(branches)
            } else {
                Relation::and(branches)
            })
        }
        RelOp::Lt | RelOp::Leq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() || (c.is_zero() && op == RelOp::Lt) {
                    return Ok(Relation::False);
                }
            }
            // b^k < c  ==>  -c^(1/k) < b < c^(1/k)
            let upper = step(ctx, base, op, root, var, assumptions, diagnostics, budget)?;
            let lower = step(
                ctx,
                base,
                op.flip(),
                neg_root,
                var,
                assumptions,
                diagnostics,
                budget,
            )?;
            Ok(Relation::and(vec![upper, lower]))
        }
        RelOp::Gt | RelOp::Geq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    return Ok(Relation::True);
                }
            }
            let upper = step(ctx, base, op, root, var, assumptions, diagnostics, budget)?;
            let lower = step(
                ctx,
                base,
                op.flip(),
                neg_root,
                var,
                assumptions,
                diagnostics,
                budget,
            )?;
            Ok(Relation::or(vec![upper, lower]))
        }
    }
}

/// `base^u op rhs` with the variable inside the exponent `u`.
#[allow(clippy::too_many_arguments)]
fn solve_exponential(
    ctx: &mut Context,
    base: ExprId,
    exp: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    if let Some(b) = ctx.as_number(base) {
        if !b.is_positive() {
            return Err(EngineError::UnsupportedFunction(format!(
                "exponential with non-positive base {}",
                b
            )));
        }
        if b.is_one() {
            // 1^u is identically 1.
            let one = ctx.num(1);
            return Ok(var_free_compare(ctx, one, op, rhs));
        }
    }
    if let Some(c) = ctx.as_number(rhs) {
        if !c.is_positive() {
            return Ok(match op {
                RelOp::Eq | RelOp::Lt | RelOp::Leq => Relation::False,
                RelOp::Neq | RelOp::Gt | RelOp::Geq => Relation::True,
            });
        }
    }
    let is_e = matches!(ctx.get(base), Expr::Constant(cassia_ast::Constant::E));
    let new_rhs = if is_e {
        let ln = ctx.call_builtin(BuiltinFn::Ln, vec![rhs]);
        simplify(ctx, ln)
    } else {
        let ln_rhs = ctx.call_builtin(BuiltinFn::Ln, vec![rhs]);
        let ln_base = ctx.call_builtin(BuiltinFn::Ln, vec![base]);
        let ratio = ctx.div2(ln_rhs, ln_base);
        simplify(ctx, ratio)
    };
    // A base below one makes the exponential decreasing.
    let decreasing = ctx
        .as_number(base)
        .is_some_and(|b| b < BigRational::one());
    let next_op = if decreasing { op.flip() } else { op };
    step(ctx, exp, next_op, new_rhs, var, assumptions, diagnostics, budget)
}

#[allow(clippy::too_many_arguments)]
fn solve_function(
    ctx: &mut Context,
    fsym: SymbolId,
    args: &[ExprId],
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let Some(builtin) = ctx.builtin_of(fsym) else {
        return Err(EngineError::UnsupportedFunction(
            ctx.sym_name(fsym).to_string(),
        ));
    };
    match builtin {
        BuiltinFn::Ln => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            // ln is increasing; ln(u) op c  ==>  u op e^c
            let e = ctx.constant(cassia_ast::Constant::E);
            let raised = fold_pow(ctx, e, rhs);
            step(ctx, u, op, raised, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Exp => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            let e = ctx.constant(cassia_ast::Constant::E);
            solve_exponential(ctx, e, u, op, rhs, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Sqrt => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            solve_sqrt(ctx, u, op, rhs, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Abs => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            solve_abs(ctx, u, op, rhs, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Sin | BuiltinFn::Cos | BuiltinFn::Tan => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            if op != RelOp::Eq {
                return Err(partial(ctx, var));
            }
            if matches!(builtin, BuiltinFn::Sin | BuiltinFn::Cos) {
                if let Some(c) = ctx.as_number(rhs) {
                    if c.abs() > BigRational::one() {
                        return Ok(Relation::False);
                    }
                }
            }
            diagnostics.advisory(
                "taking the principal solution of a periodic equation".to_string(),
            );
            let inverse = builtin.inverse().ok_or_else(|| partial(ctx, var))?;
            let applied = ctx.call_builtin(inverse, vec![rhs]);
            let applied = simplify(ctx, applied);
            step(ctx, u, RelOp::Eq, applied, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Arcsin | BuiltinFn::Arctan => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            let inverse = builtin.inverse().ok_or_else(|| partial(ctx, var))?;
            let applied = ctx.call_builtin(inverse, vec![rhs]);
            let applied = simplify(ctx, applied);
            step(ctx, u, op, applied, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Arccos => {
            let &[u] = args else { return Err(partial(ctx, var)) };
            // arccos is decreasing.
            let applied = ctx.call_builtin(BuiltinFn::Cos, vec![rhs]);
            let applied = simplify(ctx, applied);
            step(ctx, u, op.flip(), applied, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Log => {
            let &[base, u] = args else { return Err(partial(ctx, var)) };
            if contains_symbol(ctx, u, var) {
                if contains_symbol(ctx, base, var) {
                    return Err(partial(ctx, var));
                }
                // log(b, u) op c  ==>  u op b^c
                let raised = fold_pow(ctx, base, rhs);
                let raised = simplify(ctx, raised);
                let decreasing = ctx
                    .as_number(base)
                    .is_some_and(|b| b < BigRational::one());
                let next_op = if decreasing { op.flip() } else { op };
                return step(ctx, u, next_op, raised, var, assumptions, diagnostics, budget);
            }
            if op != RelOp::Eq {
                return Err(partial(ctx, var));
            }
            // log(b, u) = c  ==>  b = u^(1/c)
            let one = ctx.num(1);
            let inv = fold_div(ctx, one, rhs);
            let raised = fold_pow(ctx, u, inv);
            let raised = simplify(ctx, raised);
            step(ctx, base, RelOp::Eq, raised, var, assumptions, diagnostics, budget)
        }
        BuiltinFn::Diff => Err(partial(ctx, var)),
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_sqrt(
    ctx: &mut Context,
    u: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let two = ctx.num(2);
    let squared = fold_pow(ctx, rhs, two);
    let rhs_num = ctx.as_number(rhs);
    match op {
        RelOp::Eq | RelOp::Neq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    return Ok(bool_rel(op == RelOp::Neq));
                }
                return step(ctx, u, op, squared, var, assumptions, diagnostics, budget);
            }
            let body = step(ctx, u, op, squared, var, assumptions, diagnostics, budget)?;
            let zero = ctx.num(0);
            let nonneg = var_free_compare(ctx, rhs, RelOp::Geq, zero);
            Ok(Relation::and(vec![body, nonneg]))
        }
        RelOp::Lt | RelOp::Leq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() || (c.is_zero() && op == RelOp::Lt) {
                    return Ok(Relation::False);
                }
            } else {
                return Err(partial(ctx, var));
            }
            // sqrt(u) < c  ==>  0 <= u < c^2
            let upper = step(ctx, u, op, squared, var, assumptions, diagnostics, budget)?;
            let zero = ctx.num(0);
            let domain = step(ctx, u, RelOp::Geq, zero, var, assumptions, diagnostics, budget)?;
            Ok(Relation::and(vec![upper, domain]))
        }
        RelOp::Gt | RelOp::Geq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    // Anywhere the root is defined.
                    let zero = ctx.num(0);
                    return step(ctx, u, RelOp::Geq, zero, var, assumptions, diagnostics, budget);
                }
                return step(ctx, u, op, squared, var, assumptions, diagnostics, budget);
            }
            Err(partial(ctx, var))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_abs(
    ctx: &mut Context,
    u: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let neg_rhs = fold_neg(ctx, rhs);
    let rhs_num = ctx.as_number(rhs);
    match op {
        RelOp::Eq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    return Ok(Relation::False);
                }
                if c.is_zero() {
                    let zero = ctx.num(0);
                    return step(ctx, u, RelOp::Eq, zero, var, assumptions, diagnostics, budget);
                }
            }
            let hi = step(ctx, u, RelOp::Eq, rhs, var, assumptions, diagnostics, budget)?;
            let lo = step(ctx, u, RelOp::Eq, neg_rhs, var, assumptions, diagnostics, budget)?;
            let mut branches = vec![hi, lo];
            if rhs_num.is_none() {
                let zero = ctx.num(0);
                let nonneg = var_free_compare(ctx, rhs, RelOp::Geq, zero);
                branches = branches
                    .into_iter()
                    .map(|b| Relation::and(vec![b, nonneg.clone()]))
                    .collect();
            }
            Ok(Relation::or(branches))
        }
        RelOp::Neq => {
            let hi = step(ctx, u, RelOp::Neq, rhs, var, assumptions, diagnostics, budget)?;
            let lo = step(ctx, u, RelOp::Neq, neg_rhs, var, assumptions, diagnostics, budget)?;
            Ok(Relation::and(vec![hi, lo]))
        }
        RelOp::Lt | RelOp::Leq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() || (c.is_zero() && op == RelOp::Lt) {
                    return Ok(Relation::False);
                }
            }
            // |u| < c  ==>  -c < u < c
            let upper = step(ctx, u, op, rhs, var, assumptions, diagnostics, budget)?;
            let lower = step(
                ctx, u, op.flip(), neg_rhs, var, assumptions, diagnostics, budget,
            )?;
            let mut parts = vec![upper, lower];
            if rhs_num.is_none() {
                let zero = ctx.num(0);
                parts.push(var_free_compare(ctx, rhs, RelOp::Gt, zero));
            }
            Ok(Relation::and(parts))
        }
        RelOp::Gt | RelOp::Geq => {
            if let Some(c) = &rhs_num {
                if c.is_negative() {
                    return Ok(Relation::True);
                }
            }
            let upper = step(ctx, u, op, rhs, var, assumptions, diagnostics, budget)?;
            let lower = step(
                ctx, u, op.flip(), neg_rhs, var, assumptions, diagnostics, budget,
            )?;
            Ok(Relation::or(vec![upper, lower]))
        }
    }
}

/// Linear fallback for comparisons the structural peel cannot split,
/// e.g. `2*x + 3*x op c` or variable terms on both sides.
#[allow(clippy::too_many_arguments)]
fn solve_linear(
    ctx: &mut Context,
    lhs: ExprId,
    op: RelOp,
    rhs: ExprId,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, EngineError> {
    let Some((a, b)) = linear_coeffs(ctx, lhs, var) else {
        return Err(partial(ctx, var));
    };
    if ctx.as_number(a).is_some_and(|n| n.is_zero()) {
        // The variable cancelled out.
        return step(ctx, b, op, rhs, var, assumptions, diagnostics, budget);
    }
    let moved = fold_sub(ctx, rhs, b);
    let target = fold_div(ctx, moved, a);
    let var_node = ctx.add(Expr::Variable(var));
    divide_through(
        ctx, var_node, op, target, a, var, assumptions, diagnostics, budget,
    )
}

/// Decide or normalize a comparison that does not mention the target.
fn var_free_compare(ctx: &mut Context, lhs: ExprId, op: RelOp, rhs: ExprId) -> Relation {
    let lhs = simplify(ctx, lhs);
    let rhs = simplify(ctx, rhs);
    if let (Some(a), Some(b)) = (ctx.as_number(lhs), ctx.as_number(rhs)) {
        return bool_rel(op_holds(op, a.cmp(&b)));
    }
    if lhs == rhs {
        return bool_rel(op.allows_equal());
    }
    Relation::Compare(Equation::new(lhs, op, rhs))
}

/// Terminal comparison `var op rhs`, pruned against the assumptions.
fn finalize(
    ctx: &mut Context,
    var: SymbolId,
    op: RelOp,
    rhs: ExprId,
    assumptions: &Assumptions,
) -> Relation {
    let rhs = simplify(ctx, rhs);
    if matches!(op, RelOp::Eq | RelOp::Neq) {
        if let Some(value) = ctx.as_number(rhs) {
            let record = assumptions.get(var);
            if !record.admits(&value) {
                debug!(
                    var = ctx.sym_name(var),
                    value = %value,
                    "candidate rejected by assumptions"
                );
                return bool_rel(op == RelOp::Neq);
            }
        }
    }
    if op.is_order() {
        if let Some(value) = ctx.as_number(rhs) {
            let sign = assumptions.get(var).sign;
            if ray_outside_sign(sign, op, &value) {
                debug!(
                    var = ctx.sym_name(var),
                    value = %value,
                    "solution ray rejected by assumptions"
                );
                return Relation::False;
            }
        }
    }
    let var_node = ctx.add(Expr::Variable(var));
    Relation::Compare(Equation::new(var_node, op, rhs))
}

/// Is the solution ray `var op value` disjoint from the assumed sign range?
fn ray_outside_sign(sign: Sign, op: RelOp, value: &BigRational) -> bool {
    let zero = BigRational::zero();
    match (sign, op) {
        (Sign::Positive, RelOp::Lt | RelOp::Leq) => *value <= zero,
        (Sign::Nonnegative, RelOp::Lt) => *value <= zero,
        (Sign::Nonnegative, RelOp::Leq) => *value < zero,
        (Sign::Negative, RelOp::Gt | RelOp::Geq) => *value >= zero,
        (Sign::Nonpositive, RelOp::Gt) => *value >= zero,
        (Sign::Nonpositive, RelOp::Geq) => *value > zero,
        _ => false,
    }
}

/// Sign of a variable-free expression, from its value or from the
/// assumption record of a bare variable.
fn known_sign(ctx: &Context, id: ExprId, assumptions: &Assumptions) -> Option<Ordering> {
    if let Some(n) = ctx.as_number(id) {
        return Some(n.cmp(&BigRational::zero()));
    }
    match ctx.get(id) {
        Expr::Variable(s) => {
            let sign = assumptions.get(*s).sign;
            if sign.is_known_positive() {
                Some(Ordering::Greater)
            } else if sign.is_known_negative() {
                Some(Ordering::Less)
            } else {
                None
            }
        }
        Expr::Neg(inner) => known_sign(ctx, *inner, assumptions).map(Ordering::reverse),
        Expr::Mul(l, r) | Expr::Div(l, r) => {
            let (sl, sr) = (
                known_sign(ctx, *l, assumptions)?,
                known_sign(ctx, *r, assumptions)?,
            );
            match (sl, sr) {
                (Ordering::Equal, _) => Some(Ordering::Equal),
                (_, Ordering::Equal) => None,
                (a, b) if a == b => Some(Ordering::Greater),
                _ => Some(Ordering::Less),
            }
        }
        Expr::Constant(cassia_ast::Constant::Pi | cassia_ast::Constant::E) => {
            Some(Ordering::Greater)
        }
        _ => None,
    }
}

/// Exact or symbolic `rhs^(1/k)`.
fn nth_root(ctx: &mut Context, rhs: ExprId, k: i64) -> ExprId {
    if k == 1 {
        return rhs;
    }
    if k == 2 {
        let root = ctx.call_builtin(BuiltinFn::Sqrt, vec![rhs]);
        return simplify(ctx, root);
    }
    let inv = ctx.num_rational(BigRational::new(1.into(), k.into()));
    let root = ctx.pow2(rhs, inv);
    simplify(ctx, root)
}

fn op_holds(op: RelOp, ord: Ordering) -> bool {
    match op {
        RelOp::Eq => ord == Ordering::Equal,
        RelOp::Neq => ord != Ordering::Equal,
        RelOp::Lt => ord == Ordering::Less,
        RelOp::Gt => ord == Ordering::Greater,
        RelOp::Leq => ord != Ordering::Greater,
        RelOp::Geq => ord != Ordering::Less,
    }
}

fn bool_rel(holds: bool) -> Relation {
    if holds {
        Relation::True
    } else {
        Relation::False
    }
}

fn partial(ctx: &Context, var: SymbolId) -> EngineError {
    EngineError::PartialIsolation {
        var: ctx.sym_name(var).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassia_ast::DisplayRelation;

    fn isolate_str(
        ctx: &mut Context,
        lhs: ExprId,
        op: RelOp,
        rhs: ExprId,
        var: &str,
    ) -> String {
        let sym = ctx.sym(var);
        let eq = Equation::new(lhs, op, rhs);
        let assumptions = Assumptions::new();
        let mut diagnostics = Diagnostics::new();
        let budget = SolveBudget::default();
        let rel =
            isolate_equation(ctx, &eq, sym, &assumptions, &mut diagnostics, &budget).unwrap();
        DisplayRelation::new(ctx, &rel).to_string()
    }

    #[test]
    fn linear_equation() {
        // 2x + 3 = 11  ->  x = 4
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let three = ctx.num(3);
        let eleven = ctx.num(11);
        let prod = ctx.mul2(two, x);
        let lhs = ctx.add2(prod, three);
        assert_eq!(isolate_str(&mut ctx, lhs, RelOp::Eq, eleven, "x"), "x = 4");
    }

    #[test]
    fn variable_on_both_sides() {
        // 5x - 2 = 3x + 4  ->  x = 3
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let five = ctx.num(5);
        let two = ctx.num(2);
        let three = ctx.num(3);
        let four = ctx.num(4);
        let l0 = ctx.mul2(five, x);
        let lhs = ctx.sub2(l0, two);
        let r0 = ctx.mul2(three, x);
        let rhs = ctx.add2(r0, four);
        assert_eq!(isolate_str(&mut ctx, lhs, RelOp::Eq, rhs, "x"), "x = 3");
    }

    #[test]
    fn inequality_flips_on_negative_factor() {
        // -2x < 6  ->  x > -3
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let minus_two = ctx.num(-2);
        let six = ctx.num(6);
        let lhs = ctx.mul2(minus_two, x);
        assert_eq!(isolate_str(&mut ctx, lhs, RelOp::Lt, six, "x"), "x > -3");
    }

    #[test]
    fn even_power_splits_into_two_branches() {
        // x^2 = 9  ->  x = 3 or x = -3
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let nine = ctx.num(9);
        let lhs = ctx.pow2(x, two);
        assert_eq!(
            isolate_str(&mut ctx, lhs, RelOp::Eq, nine, "x"),
            "x = 3 or x = -3"
        );
    }

    #[test]
    fn even_power_of_negative_has_no_solution() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let minus_nine = ctx.num(-9);
        let lhs = ctx.pow2(x, two);
        let sym = ctx.sym("x");
        let eq = Equation::new(lhs, RelOp::Eq, minus_nine);
        let rel = isolate_equation(
            &mut ctx,
            &eq,
            sym,
            &Assumptions::new(),
            &mut Diagnostics::new(),
            &SolveBudget::default(),
        )
        .unwrap();
        assert_eq!(rel, Relation::False);
    }

    #[test]
    fn abs_inequality_produces_band() {
        // |x| < 2  ->  x < 2 and x > -2
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let lhs = ctx.call_builtin(BuiltinFn::Abs, vec![x]);
        assert_eq!(
            isolate_str(&mut ctx, lhs, RelOp::Lt, two, "x"),
            "x < 2 and x > -2"
        );
    }

    #[test]
    fn exp_equation_takes_log() {
        // exp(x) = 5  ->  x = ln(5)
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let five = ctx.num(5);
        let lhs = ctx.call_builtin(BuiltinFn::Exp, vec![x]);
        assert_eq!(
            isolate_str(&mut ctx, lhs, RelOp::Eq, five, "x"),
            "x = ln(5)"
        );
    }

    #[test]
    fn exp_can_never_be_negative() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let minus_one = ctx.num(-1);
        let lhs = ctx.call_builtin(BuiltinFn::Exp, vec![x]);
        let sym = ctx.sym("x");
        let eq = Equation::new(lhs, RelOp::Eq, minus_one);
        let rel = isolate_equation(
            &mut ctx,
            &eq,
            sym,
            &Assumptions::new(),
            &mut Diagnostics::new(),
            &SolveBudget::default(),
        )
        .unwrap();
        assert_eq!(rel, Relation::False);
    }

    #[test]
    fn reciprocal_inequality_branches_on_denominator_sign() {
        // 1/x < 2 splits into the x > 0 and x < 0 cases.
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let two = ctx.num(2);
        let lhs = ctx.div2(one, x);
        let rendered = isolate_str(&mut ctx, lhs, RelOp::Lt, two, "x");
        assert!(rendered.contains("x > 0"), "got: {rendered}");
        assert!(rendered.contains("x < 0"), "got: {rendered}");
        assert!(rendered.contains(" or "), "got: {rendered}");
    }

    #[test]
    fn assumption_prunes_contradicting_candidate() {
        // x = -5 under a positive assumption has no admissible solution.
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let minus_five = ctx.num(-5);
        let mut assumptions = Assumptions::new();
        assumptions.set(
            sym,
            crate::assumptions::Assumption {
                sign: crate::assumptions::Sign::Positive,
                number_type: crate::assumptions::NumberType::Number,
            },
        );
        let eq = Equation::new(x, RelOp::Eq, minus_five);
        let rel = isolate_equation(
            &mut ctx,
            &eq,
            sym,
            &assumptions,
            &mut Diagnostics::new(),
            &SolveBudget::default(),
        )
        .unwrap();
        assert_eq!(rel, Relation::False);
    }

    #[test]
    fn unknown_symbolic_divisor_branches_for_order_ops() {
        // k * x < 1 with unknown sign of k.
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let k = ctx.var("k");
        let one = ctx.num(1);
        let lhs = ctx.mul2(k, x);
        let rendered = isolate_str(&mut ctx, lhs, RelOp::Lt, one, "x");
        assert!(rendered.contains("k > 0"), "got: {rendered}");
        assert!(rendered.contains("k < 0"), "got: {rendered}");
    }

    #[test]
    fn tautology_collapses_to_true() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let eq = Equation::new(x, RelOp::Eq, x);
        let rel = isolate_equation(
            &mut ctx,
            &eq,
            sym,
            &Assumptions::new(),
            &mut Diagnostics::new(),
            &SolveBudget::default(),
        )
        .unwrap();
        assert_eq!(rel, Relation::True);
    }

    #[test]
    fn depth_budget_is_enforced() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let mut lhs = x;
        for i in 0..40 {
            let n = ctx.num(i);
            lhs = ctx.add2(lhs, n);
        }
        let target = ctx.num(5);
        let eq = Equation::new(lhs, RelOp::Eq, target);
        let tight = SolveBudget::new(3);
        let err = isolate_equation(
            &mut ctx,
            &eq,
            sym,
            &Assumptions::new(),
            &mut Diagnostics::new(),
            &tight,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::DepthExceeded { limit: 3 });
    }

    #[test]
    fn eval_relation_testing_flag() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        let rel = Relation::Compare(Equation::new(one, RelOp::Eq, one));
        assert_eq!(eval_relation(&mut ctx, &rel, true), Relation::True);
        assert_eq!(eval_relation(&mut ctx, &rel, false), rel);
    }
}
