//! Whole differential-equation solves.
//!
//! `dsolve` hands the algebraic legwork to the equation solver twice:
//! once to pre-isolate the derivative term (through a fresh auxiliary
//! variable) and once at the end to turn the implicit antiderivative
//! relation into an explicit one. Everything between is the shape
//! classifier and the constant resolver.

use crate::classify::{classify_and_integrate, ClassifyFailure};
use crate::constant::{absorb_constant, fresh_symbol};
use crate::error::OdeError;
use crate::term::find_derivative;
use crate::verify::{side_value, test_equation, Verdict};
use cassia_ast::{
    Context, DisplayEquation, Equation, Expr, ExprId, RelOp, Relation, SymbolId,
};
use cassia_engine::{
    simplify, substitute_expr, substitute_var, Assumptions, Diagnostics, SolveBudget,
};
use cassia_solver::{solve_equation, SideCondition, SolveError, SolvedEquation, SolverOptions};
use tracing::debug;

/// Solve a first-order ordinary differential equation for `dep(indep)`.
///
/// `initial` is an optional `(x0, y0)` pair; with it the constant of
/// integration is resolved to a concrete value, without it a fresh named
/// constant is appended. An implicit antiderivative relation that cannot
/// be made explicit is still returned as a success.
#[allow(clippy::too_many_arguments)]
pub fn dsolve(
    ctx: &mut Context,
    equation: &Equation,
    dep: SymbolId,
    indep: SymbolId,
    initial: Option<(ExprId, ExprId)>,
    assumptions: &mut Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<SolvedEquation, OdeError> {
    budget.check_cancelled()?;
    debug!(
        equation = %DisplayEquation::new(ctx, *equation),
        dep = ctx.sym_name(dep),
        indep = ctx.sym_name(indep),
        "dsolve"
    );
    if equation.op != RelOp::Eq {
        return Err(OdeError::NotAnOde {
            var: ctx.sym_name(dep).to_string(),
        });
    }
    let found = match find_derivative(ctx, equation.lhs, dep, indep)? {
        Some(term) => Some(term),
        None => find_derivative(ctx, equation.rhs, dep, indep)?,
    };
    let Some(derivative) = found else {
        return Err(OdeError::NotAnOde {
            var: ctx.sym_name(dep).to_string(),
        });
    };

    // Stand the derivative in for a fresh unknown so the equation solver
    // can isolate it like any other variable.
    let aux = fresh_symbol(ctx, "dy", &[equation.lhs, equation.rhs]);
    let aux_var = ctx.add(Expr::Variable(aux));
    let pre_lhs = substitute_expr(ctx, equation.lhs, derivative.id, aux_var);
    let pre_rhs = substitute_expr(ctx, equation.rhs, derivative.id, aux_var);
    let pre = Equation::new(pre_lhs, RelOp::Eq, pre_rhs);

    let options = SolverOptions {
        comparison_testing: false,
        ode_mode: true,
        ..SolverOptions::default()
    };
    let mut scratch = Diagnostics::new();
    let pre_solved = match solve_equation(
        ctx,
        &pre,
        aux,
        &options,
        assumptions,
        &mut scratch,
        budget,
    ) {
        Ok(solved) => solved,
        Err(SolveError::Cancelled) => return Err(OdeError::Cancelled),
        Err(SolveError::DepthExceeded { limit }) => {
            return Err(OdeError::DepthExceeded { limit })
        }
        Err(_) => {
            return Err(shape_failure(ctx, diagnostics, equation, derivative.id));
        }
    };
    let Relation::Compare(isolated) = pre_solved.relation else {
        return Err(shape_failure(ctx, diagnostics, equation, derivative.id));
    };
    let f = simplify(ctx, isolated.rhs);

    let implicit = classify_and_integrate(ctx, f, dep, indep, budget).map_err(|failure| {
        match failure {
            ClassifyFailure::Engine(err) => OdeError::from(err),
            ClassifyFailure::Integration => {
                diagnostics.fatal("unable to solve differential equation");
                OdeError::IntegrationFailed
            }
            ClassifyFailure::Unmatched => {
                shape_failure(ctx, diagnostics, equation, derivative.id)
            }
        }
    })?;

    // Constant resolution: a concrete value from the initial pair, or a
    // fresh named constant.
    let (final_rhs, constant) = match initial {
        Some((x0, y0)) => {
            let l = side_value(ctx, implicit.lhs, dep, indep, x0, y0);
            let r = side_value(ctx, implicit.rhs, dep, indep, x0, y0);
            if l.is_some() != r.is_some() {
                diagnostics.fatal(
                    "the initial condition lies outside the solution's domain",
                );
                return Err(OdeError::InitialConditionInconsistent);
            }
            let lhs_dep = substitute_var(ctx, implicit.lhs, dep, y0);
            let lhs_at = substitute_var(ctx, lhs_dep, indep, x0);
            let rhs_at = substitute_var(ctx, implicit.rhs, indep, x0);
            let difference = ctx.sub2(lhs_at, rhs_at);
            let k = simplify(ctx, difference);
            let attached = ctx.add2(implicit.rhs, k);
            let final_rhs = simplify(ctx, attached);
            if test_equation(ctx, implicit.lhs, final_rhs, dep, indep, x0, y0)
                == Verdict::Inconsistent
            {
                diagnostics.fatal(
                    "the resolved constant does not reproduce the initial condition",
                );
                return Err(OdeError::InitialConditionInconsistent);
            }
            (final_rhs, None)
        }
        None => {
            let c = fresh_symbol(
                ctx,
                "C",
                &[implicit.lhs, implicit.rhs, equation.lhs, equation.rhs],
            );
            let c_var = ctx.add(Expr::Variable(c));
            (ctx.add2(implicit.rhs, c_var), Some(c))
        }
    };

    let implicit_eq = Equation::new(implicit.lhs, RelOp::Eq, final_rhs);
    let (mut relation, side_conditions) =
        make_explicit(ctx, &implicit_eq, dep, &options, assumptions, diagnostics, budget)?;
    if let Some(c) = constant {
        relation = absorb_in_relation(ctx, &relation, c);
    }
    Ok(SolvedEquation {
        var: dep,
        relation,
        side_conditions,
    })
}

/// Isolate `dep` in the implicit relation; an unisolatable left side
/// falls back to the implicit equation with an advisory.
fn make_explicit(
    ctx: &mut Context,
    implicit: &Equation,
    dep: SymbolId,
    options: &SolverOptions,
    assumptions: &mut Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<(Relation, Vec<SideCondition>), OdeError> {
    if matches!(ctx.get(implicit.lhs), Expr::Variable(s) if *s == dep) {
        return Ok((Relation::Compare(*implicit), Vec::new()));
    }
    let mut scratch = Diagnostics::new();
    match solve_equation(
        ctx,
        implicit,
        dep,
        options,
        assumptions,
        &mut scratch,
        budget,
    ) {
        Ok(solved) => {
            for entry in scratch.entries() {
                diagnostics.report(entry.clone());
            }
            Ok((solved.relation, solved.side_conditions))
        }
        Err(SolveError::Cancelled) => Err(OdeError::Cancelled),
        Err(SolveError::DepthExceeded { limit }) => Err(OdeError::DepthExceeded { limit }),
        Err(_) => {
            diagnostics.advisory(format!(
                "leaving the solution implicit; '{}' could not be isolated",
                ctx.sym_name(dep)
            ));
            Ok((Relation::Compare(*implicit), Vec::new()))
        }
    }
}

/// Build the `ShapeNotRecognized` error: the input equation with the
/// derivative term protected, plus the fatal diagnostic.
fn shape_failure(
    ctx: &mut Context,
    diagnostics: &mut Diagnostics,
    equation: &Equation,
    derivative: ExprId,
) -> OdeError {
    diagnostics.fatal("unable to solve differential equation");
    let held = ctx.hold(derivative);
    let lhs = substitute_expr(ctx, equation.lhs, derivative, held);
    let rhs = substitute_expr(ctx, equation.rhs, derivative, held);
    OdeError::ShapeNotRecognized {
        remaining: Equation::new(lhs, equation.op, rhs),
    }
}

fn absorb_in_relation(ctx: &mut Context, relation: &Relation, constant: SymbolId) -> Relation {
    match relation {
        Relation::True | Relation::False => relation.clone(),
        Relation::Compare(eq) => {
            let lhs = absorb_constant(ctx, eq.lhs, constant);
            let rhs = absorb_constant(ctx, eq.rhs, constant);
            Relation::Compare(Equation::new(lhs, eq.op, rhs))
        }
        Relation::All(parts) => Relation::All(
            parts
                .iter()
                .map(|p| absorb_in_relation(ctx, p, constant))
                .collect(),
        ),
        Relation::Any(parts) => Relation::Any(
            parts
                .iter()
                .map(|p| absorb_in_relation(ctx, p, constant))
                .collect(),
        ),
    }
}
