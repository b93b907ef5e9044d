//! Solve entry point and retry state machine.
//!
//! One solve is a bounded ladder of isolation attempts. Each attempt runs
//! under an [`AssumptionGuard`] holding the relaxation level's view of the
//! target variable, with diagnostics suppressed; only the attempt that is
//! finally kept surfaces its messages. The first failure's diagnosis is
//! remembered across retries and reported on exhaustion, because relaxed
//! attempts fail in less specific ways.

use crate::classify::{classify, EquationShape};
use crate::error::SolveError;
use crate::logical::{op_matches, resolve_conjunction, resolve_disjunction};
use crate::options::SolverOptions;
use crate::relax::{AssumptionGuard, RelaxLevel};
use crate::result::SolvedEquation;
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{Context, DisplayRelation, Equation, Expr, RelOp, Relation, SymbolId};
use cassia_engine::{
    eval_relation, isolate_equation, Assumptions, Diagnostics, SolveBudget,
};
use tracing::debug;

/// Solve a single comparison for `var`.
pub fn solve_equation(
    ctx: &mut Context,
    equation: &Equation,
    var: SymbolId,
    options: &SolverOptions,
    assumptions: &mut Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<SolvedEquation, SolveError> {
    solve(
        ctx,
        &Relation::Compare(*equation),
        var,
        options,
        assumptions,
        diagnostics,
        budget,
    )
}

/// Solve a relation for `var`.
pub fn solve(
    ctx: &mut Context,
    relation: &Relation,
    var: SymbolId,
    options: &SolverOptions,
    assumptions: &mut Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<SolvedEquation, SolveError> {
    debug!(
        target = ctx.sym_name(var),
        "solving {}",
        DisplayRelation::new(ctx, relation)
    );
    let shape = classify(ctx, relation, options.comparison_testing)?;
    let mut input = shape_relation(shape);
    if options.ode_mode {
        // Constants of integration have no numeric value; renormalize
        // without numeric collapse before attempting isolation.
        input = eval_relation(ctx, &input, false);
    }
    let target_op = dominant_op(&input);

    let mut first_error: Option<SolveError> = None;
    for (attempt, level) in RelaxLevel::ladder().into_iter().enumerate() {
        if level > options.max_relax_level {
            break;
        }
        budget.check_cancelled()?;
        if attempt > 0 && !level.changes(assumptions.get(var)) {
            continue;
        }

        diagnostics.begin_suppress();
        let outcome = {
            let guard = AssumptionGuard::apply(assumptions, var, level);
            attempt_solve(
                ctx,
                &input,
                var,
                target_op,
                attempt == 0,
                guard.assumptions(),
                diagnostics,
                budget,
            )
        };
        match outcome {
            Ok(solved) => {
                diagnostics.end_suppress(true);
                for condition in &solved.side_conditions {
                    diagnostics.advisory(condition.message(ctx));
                }
                return Ok(solved);
            }
            Err(err) if err.is_fatal() => {
                diagnostics.end_suppress(true);
                return Err(err);
            }
            Err(err) => {
                diagnostics.end_suppress(false);
                debug!(level = ?level, "attempt failed: {err}");
                first_error.get_or_insert(err);
            }
        }
    }

    let first = first_error.unwrap_or(SolveError::UnclassifiedResult);
    let exhausted = SolveError::AssumptionsExhausted {
        var: ctx.sym_name(var).to_string(),
        first: Box::new(first),
    };
    diagnostics.fatal(exhausted.to_string());
    Err(exhausted)
}

fn shape_relation(shape: EquationShape) -> Relation {
    match shape {
        EquationShape::Comparison(eq) => Relation::Compare(eq),
        EquationShape::Conjunction(members) => Relation::All(members),
        EquationShape::Disjunction(branches)
        | EquationShape::DisjunctionOfConjunctions(branches) => Relation::Any(branches),
    }
}

/// Operator of the first comparison in the relation. Isolation results are
/// judged against its comparison class.
fn dominant_op(relation: &Relation) -> RelOp {
    relation
        .comparisons()
        .first()
        .map(|eq| eq.op)
        .unwrap_or(RelOp::Eq)
}

#[allow(clippy::too_many_arguments)]
fn attempt_solve(
    ctx: &mut Context,
    input: &Relation,
    var: SymbolId,
    target_op: RelOp,
    first_attempt: bool,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<SolvedEquation, SolveError> {
    let isolated = isolate_input(ctx, input, var, assumptions, diagnostics, budget)?;
    match isolated {
        Relation::True => Err(SolveError::Tautology {
            var: ctx.sym_name(var).to_string(),
            condition: first_attempt
                .then(|| DisplayRelation::new(ctx, input).to_string()),
        }),
        Relation::False => Err(SolveError::NoSolution {
            var: ctx.sym_name(var).to_string(),
        }),
        Relation::Compare(eq) => finish_comparison(ctx, eq, var, target_op),
        Relation::All(members) => {
            let resolved = resolve_conjunction(ctx, &members, var, target_op)?;
            Ok(SolvedEquation {
                var,
                relation: resolved.relation,
                side_conditions: resolved.side_conditions,
            })
        }
        Relation::Any(branches) => {
            let resolved =
                resolve_disjunction(ctx, &branches, var, target_op, diagnostics, budget)?;
            Ok(SolvedEquation {
                var,
                relation: resolved.relation,
                side_conditions: resolved.side_conditions,
            })
        }
    }
}

/// Judge a single-comparison result against the target.
fn finish_comparison(
    ctx: &Context,
    eq: Equation,
    var: SymbolId,
    target_op: RelOp,
) -> Result<SolvedEquation, SolveError> {
    let lhs_is_var = matches!(ctx.get(eq.lhs), Expr::Variable(s) if *s == var);
    if lhs_is_var && !contains_symbol(ctx, eq.rhs, var) && op_matches(target_op, eq.op) {
        return Ok(SolvedEquation::new(var, Relation::Compare(eq)));
    }
    if contains_symbol(ctx, eq.lhs, var) || contains_symbol(ctx, eq.rhs, var) {
        Err(SolveError::PartialIsolation {
            var: ctx.sym_name(var).to_string(),
        })
    } else {
        // The variable vanished without a decidable residue; the result is
        // a constraint on other symbols, not a solution.
        Err(SolveError::UnclassifiedResult)
    }
}

/// Isolate every comparison leaf of the input relation.
///
/// Inside a disjunction a branch that will not isolate is kept unresolved
/// so the logical resolver can drop it with an advisory instead of failing
/// the whole solve.
fn isolate_input(
    ctx: &mut Context,
    relation: &Relation,
    var: SymbolId,
    assumptions: &Assumptions,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Relation, SolveError> {
    match relation {
        Relation::Compare(eq) => {
            Ok(isolate_equation(ctx, eq, var, assumptions, diagnostics, budget)?)
        }
        Relation::All(members) => {
            let mut out = Vec::with_capacity(members.len());
            for member in members {
                out.push(isolate_input(ctx, member, var, assumptions, diagnostics, budget)?);
            }
            Ok(Relation::and(out))
        }
        Relation::Any(branches) => {
            let mut out = Vec::with_capacity(branches.len());
            for branch in branches {
                budget.check_cancelled()?;
                match isolate_input(ctx, branch, var, assumptions, diagnostics, budget) {
                    Ok(resolved) => out.push(resolved),
                    Err(SolveError::PartialIsolation { .. })
                    | Err(SolveError::UnclassifiedResult) => out.push(branch.clone()),
                    Err(other) => return Err(other),
                }
            }
            Ok(Relation::or(out))
        }
        other => Ok(other.clone()),
    }
}
