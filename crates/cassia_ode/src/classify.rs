//! Five-priority shape classification for `dy/dx = f(x, y)`.
//!
//! Each candidate shape is validated by actually performing its
//! integrations; a failed integration falls through to the next priority.
//! Every accepted shape produces an [`ImplicitSolution`] `lhs = rhs + C`
//! where `lhs` may mention both variables and `rhs` mentions only the
//! independent one.

use crate::error::OdeError;
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{BuiltinFn, Context, Equation, Expr, ExprId, RelOp, Relation, SymbolId};
use cassia_engine::nary::{add_terms, build_product, build_sum, linear_coeffs, mul_factors, Term};
use cassia_engine::{integrate, simplify, Assumptions, Diagnostics, EngineError, SolveBudget};
use cassia_solver::{solve_equation, SolveError, SolverOptions};
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::debug;

/// Antiderivative form of a classified ODE, still missing its constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitSolution {
    /// Side that may mention both variables.
    pub lhs: ExprId,
    /// Side in the independent variable only.
    pub rhs: ExprId,
}

/// Internal failure mode of classification; the caller attaches the
/// held equation for the user-visible error.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ClassifyFailure {
    Unmatched,
    Integration,
    Engine(EngineError),
}

impl From<EngineError> for ClassifyFailure {
    fn from(err: EngineError) -> Self {
        ClassifyFailure::Engine(err)
    }
}

pub(crate) fn classify_and_integrate(
    ctx: &mut Context,
    f: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    budget: &SolveBudget,
) -> Result<ImplicitSolution, ClassifyFailure> {
    budget.check_cancelled()?;

    // Priority 1: f free of y, integrate directly.
    if !contains_symbol(ctx, f, dep) {
        debug!(shape = "direct", "classifying derivative right side");
        if let Some(rhs) = integrate(ctx, f, indep) {
            let lhs = ctx.add(Expr::Variable(dep));
            return Ok(ImplicitSolution { lhs, rhs });
        }
        return Err(ClassifyFailure::Unmatched);
    }

    // Priority 2: f free of x, invert and integrate in y.
    if !contains_symbol(ctx, f, indep) {
        debug!(shape = "autonomous", "classifying derivative right side");
        let one = ctx.num(1);
        let inverted = ctx.div2(one, f);
        let inverted = simplify(ctx, inverted);
        if let Some(lhs) = integrate(ctx, inverted, dep) {
            let rhs = ctx.add(Expr::Variable(indep));
            return Ok(ImplicitSolution { lhs, rhs });
        }
    }

    // Priority 3: separable product of single-variable factors.
    if let Some(solution) = try_separable(ctx, f, dep, indep) {
        return Ok(solution);
    }

    // Priority 4: factor a common x-dependent term out of a sum and
    // recurse on the product form.
    budget.check_cancelled()?;
    if let Some(factored) = common_factor_form(ctx, f, dep, indep) {
        debug!(shape = "common-factor", "classifying derivative right side");
        let deeper = budget.descend()?;
        match classify_and_integrate(ctx, factored, dep, indep, &deeper) {
            Ok(solution) => return Ok(solution),
            Err(ClassifyFailure::Engine(err)) => return Err(ClassifyFailure::Engine(err)),
            Err(_) => {}
        }
    }

    // Priority 5: linear or Bernoulli sum split.
    try_sum_split(ctx, f, dep, indep, budget)
}

fn try_separable(
    ctx: &mut Context,
    f: ExprId,
    dep: SymbolId,
    indep: SymbolId,
) -> Option<ImplicitSolution> {
    let factors = mul_factors(ctx, f);
    if factors.len() < 2 {
        return None;
    }
    let mut dep_factors = Vec::new();
    let mut indep_factors = Vec::new();
    for factor in factors {
        let has_dep = contains_symbol(ctx, factor, dep);
        let has_indep = contains_symbol(ctx, factor, indep);
        if has_dep && has_indep {
            return None;
        }
        if has_dep {
            dep_factors.push(factor);
        } else {
            // Pure constants ride along on the x side.
            indep_factors.push(factor);
        }
    }
    if dep_factors.is_empty() {
        return None;
    }
    debug!(shape = "separable", "classifying derivative right side");
    let f_dep = build_product(ctx, &dep_factors);
    let one = ctx.num(1);
    let inverted = ctx.div2(one, f_dep);
    let inverted = simplify(ctx, inverted);
    let lhs = integrate(ctx, inverted, dep)?;
    let f_indep = build_product(ctx, &indep_factors);
    let f_indep = simplify(ctx, f_indep);
    let rhs = integrate(ctx, f_indep, indep)?;
    Some(ImplicitSolution { lhs, rhs })
}

/// Rewrite `f` as `common * rest` when every term of the sum shares a
/// multiplicative factor that depends on `indep`.
fn common_factor_form(
    ctx: &mut Context,
    f: ExprId,
    _dep: SymbolId,
    indep: SymbolId,
) -> Option<ExprId> {
    let terms = add_terms(ctx, f);
    if terms.len() < 2 {
        return None;
    }
    let factor_lists: Vec<Vec<ExprId>> = terms
        .iter()
        .map(|t| mul_factors(ctx, t.expr))
        .collect();
    let common = factor_lists[0].iter().copied().find(|&candidate| {
        contains_symbol(ctx, candidate, indep)
            && factor_lists[1..].iter().all(|list| list.contains(&candidate))
    })?;
    let mut rest_terms = Vec::with_capacity(terms.len());
    for (term, mut list) in terms.iter().zip(factor_lists) {
        let position = list.iter().position(|&x| x == common)?;
        list.remove(position);
        let rebuilt = build_product(ctx, &list);
        rest_terms.push(Term {
            expr: rebuilt,
            negated: term.negated,
        });
    }
    let rest = build_sum(ctx, &rest_terms);
    Some(ctx.mul2(common, rest))
}

fn try_sum_split(
    ctx: &mut Context,
    f: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    budget: &SolveBudget,
) -> Result<ImplicitSolution, ClassifyFailure> {
    if let Some((a, b)) = linear_coeffs(ctx, f, dep) {
        if ctx.as_number(b).is_some_and(|n| n.is_zero()) {
            // Homogeneous linear: y' = a(x) * y separates directly.
            debug!(shape = "homogeneous-linear", "classifying derivative right side");
            let y = ctx.add(Expr::Variable(dep));
            let one = ctx.num(1);
            let recip = ctx.div2(one, y);
            let lhs = integrate(ctx, recip, dep).ok_or(ClassifyFailure::Integration)?;
            let rhs = integrate(ctx, a, indep).ok_or(ClassifyFailure::Integration)?;
            return Ok(ImplicitSolution { lhs, rhs });
        }
        // General linear: multiply through by exp(-A) so the left side
        // becomes the exact derivative of mu * y.
        debug!(shape = "linear", "classifying derivative right side");
        let a_integral = integrate(ctx, a, indep).ok_or(ClassifyFailure::Integration)?;
        let mu = integrating_factor(ctx, a_integral, indep, budget)?;
        let y = ctx.add(Expr::Variable(dep));
        let lhs = ctx.mul2(mu, y);
        let lhs = simplify(ctx, lhs);
        let scaled = ctx.mul2(mu, b);
        let scaled = simplify(ctx, scaled);
        let rhs = integrate(ctx, scaled, indep).ok_or(ClassifyFailure::Integration)?;
        return Ok(ImplicitSolution { lhs, rhs });
    }

    bernoulli(ctx, f, dep, indep, budget)
}

/// `y' = a(x) y + g(x) y^c` with a single non-unit exponent `c`.
///
/// The substitution `v = y^(1-c)` turns this into the linear equation
/// `v' = (1-c) a v + (1-c) g`, solved with the same integrating factor.
fn bernoulli(
    ctx: &mut Context,
    f: ExprId,
    dep: SymbolId,
    indep: SymbolId,
    budget: &SolveBudget,
) -> Result<ImplicitSolution, ClassifyFailure> {
    let terms = add_terms(ctx, f);
    let mut linear_terms: Vec<Term> = Vec::new();
    let mut power_terms: Vec<Term> = Vec::new();
    let mut exponent: Option<BigRational> = None;
    for term in terms {
        if !contains_symbol(ctx, term.expr, dep) {
            // A y-free term would make this inhomogeneous in y^c; the
            // substitution no longer linearizes it.
            return Err(ClassifyFailure::Unmatched);
        }
        let (c, coeff) =
            split_power_term(ctx, term.expr, dep).ok_or(ClassifyFailure::Unmatched)?;
        if contains_symbol(ctx, coeff, dep) {
            return Err(ClassifyFailure::Unmatched);
        }
        let coeff_term = Term {
            expr: coeff,
            negated: term.negated,
        };
        if c.is_one() {
            linear_terms.push(coeff_term);
            continue;
        }
        match &exponent {
            None => exponent = Some(c),
            Some(seen) if *seen == c => {}
            Some(_) => return Err(ClassifyFailure::Unmatched),
        }
        power_terms.push(coeff_term);
    }
    let Some(c) = exponent else {
        return Err(ClassifyFailure::Unmatched);
    };
    debug!(shape = "bernoulli", exponent = %c, "classifying derivative right side");

    let one_minus_c = BigRational::one() - &c;
    let scale = ctx.num_rational(one_minus_c.clone());
    let a = build_sum(ctx, &linear_terms);
    let g = build_sum(ctx, &power_terms);
    let a_scaled = ctx.mul2(scale, a);
    let a_scaled = simplify(ctx, a_scaled);
    let g_scaled = ctx.mul2(scale, g);
    let g_scaled = simplify(ctx, g_scaled);

    let a_integral = integrate(ctx, a_scaled, indep).ok_or(ClassifyFailure::Integration)?;
    let mu = integrating_factor(ctx, a_integral, indep, budget)?;
    let y = ctx.add(Expr::Variable(dep));
    let power_exp = ctx.num_rational(one_minus_c);
    let substituted = ctx.pow2(y, power_exp);
    let lhs = ctx.mul2(mu, substituted);
    let lhs = simplify(ctx, lhs);
    let scaled = ctx.mul2(mu, g_scaled);
    let scaled = simplify(ctx, scaled);
    let rhs = integrate(ctx, scaled, indep).ok_or(ClassifyFailure::Integration)?;
    Ok(ImplicitSolution { lhs, rhs })
}

/// Split a term into `(c, g)` with the term equal to `g * y^c` and `g`
/// intended to be free of `y`.
fn split_power_term(
    ctx: &mut Context,
    id: ExprId,
    dep: SymbolId,
) -> Option<(BigRational, ExprId)> {
    match ctx.get(id).clone() {
        Expr::Variable(s) if s == dep => Some((BigRational::one(), ctx.num(1))),
        Expr::Pow(base, exp) if matches!(ctx.get(base), Expr::Variable(s) if *s == dep) => {
            let c = ctx.as_number(exp)?;
            Some((c, ctx.num(1)))
        }
        Expr::Mul(_, _) => {
            let factors = mul_factors(ctx, id);
            let mut split: Option<BigRational> = None;
            let mut rest = Vec::new();
            for factor in factors {
                if contains_symbol(ctx, factor, dep) {
                    if split.is_some() {
                        return None;
                    }
                    let (c, g) = split_power_term(ctx, factor, dep)?;
                    if !ctx.as_number(g).is_some_and(|n| n.is_one()) {
                        return None;
                    }
                    split = Some(c);
                } else {
                    rest.push(factor);
                }
            }
            let c = split?;
            Some((c, build_product(ctx, &rest)))
        }
        Expr::Div(numer, denom) => {
            if contains_symbol(ctx, denom, dep) {
                return None;
            }
            let (c, g) = split_power_term(ctx, numer, dep)?;
            Some((c, ctx.div2(g, denom)))
        }
        _ => None,
    }
}

/// `mu = exp(-A)`, obtained by handing `ln(u) = -A` to the equation
/// solver for a fresh auxiliary unknown.
fn integrating_factor(
    ctx: &mut Context,
    a_integral: ExprId,
    indep: SymbolId,
    budget: &SolveBudget,
) -> Result<ExprId, ClassifyFailure> {
    let aux = crate::constant::fresh_symbol(ctx, "u", &[a_integral]);
    let aux_var = ctx.add(Expr::Variable(aux));
    let lhs = ctx.call_builtin(BuiltinFn::Ln, vec![aux_var]);
    let negated = ctx.neg(a_integral);
    let rhs = simplify(ctx, negated);
    let equation = Equation::new(lhs, RelOp::Eq, rhs);

    let options = SolverOptions {
        comparison_testing: false,
        ode_mode: true,
        ..SolverOptions::default()
    };
    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let deeper = budget.descend()?;
    let solved = solve_equation(
        ctx,
        &equation,
        aux,
        &options,
        &mut assumptions,
        &mut diagnostics,
        &deeper,
    )
    .map_err(|err| match err {
        SolveError::Cancelled => ClassifyFailure::Engine(EngineError::Cancelled),
        SolveError::DepthExceeded { limit } => {
            ClassifyFailure::Engine(EngineError::DepthExceeded { limit })
        }
        _ => ClassifyFailure::Integration,
    })?;
    let Relation::Compare(result) = solved.relation else {
        return Err(ClassifyFailure::Integration);
    };
    if !matches!(ctx.get(result.lhs), Expr::Variable(s) if *s == aux) {
        return Err(ClassifyFailure::Integration);
    }
    debug!(
        factor = %cassia_ast::DisplayExpr::new(ctx, result.rhs),
        var = ctx.sym_name(indep),
        "integrating factor"
    );
    Ok(simplify(ctx, result.rhs))
}
