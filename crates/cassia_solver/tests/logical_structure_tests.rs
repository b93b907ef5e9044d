//! Conjunction and disjunction handling through whole solves.

use cassia_ast::{Context, DisplayRelation, Equation, RelOp, SymbolId};
use cassia_engine::{Assumptions, Diagnostics, SolveBudget};
use cassia_solver::{solve_equation, SolvedEquation, SolveError, SolverOptions};

struct Outcome {
    solved: Result<SolvedEquation, SolveError>,
    diagnostics: Diagnostics,
}

fn run(ctx: &mut Context, eq: Equation, var: SymbolId) -> Outcome {
    let options = SolverOptions::default();
    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    let solved = solve_equation(
        ctx,
        &eq,
        var,
        &options,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    );
    Outcome {
        solved,
        diagnostics,
    }
}

fn rendered(ctx: &Context, solved: &SolvedEquation) -> String {
    DisplayRelation::new(ctx, &solved.relation).to_string()
}

#[test]
fn even_power_inequality_yields_a_band() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let four = ctx.num(4);
    let sq = ctx.pow2(x, two);

    let outcome = run(&mut ctx, Equation::new(sq, RelOp::Lt, four), sym);
    let solved = outcome.solved.unwrap();
    assert_eq!(rendered(&ctx, &solved), "x < 2 and x > -2");
    assert!(solved.side_conditions.is_empty());
}

#[test]
fn absolute_value_inequality_splits_outward() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let lhs = ctx.call("abs", vec![x]);

    let outcome = run(&mut ctx, Equation::new(lhs, RelOp::Gt, two), sym);
    let solved = outcome.solved.unwrap();
    assert_eq!(rendered(&ctx, &solved), "x > 2 or x < -2");
}

#[test]
fn symbolic_coefficient_sign_split_reports_branch_conditions() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let k = ctx.var("k");
    let one = ctx.num(1);
    let lhs = ctx.mul2(k, x);

    let outcome = run(&mut ctx, Equation::new(lhs, RelOp::Lt, one), sym);
    let solved = outcome.solved.unwrap();
    let text = rendered(&ctx, &solved);
    assert!(text.contains(" or "), "expected a sign split, got {text}");

    let messages: Vec<String> = solved
        .side_conditions
        .iter()
        .map(|sc| sc.message(&ctx))
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("solution 1 requires that"));
    assert!(messages[1].starts_with("solution 2 requires that"));
    assert!(messages.iter().any(|m| m.contains("k > 0")));
    assert!(messages.iter().any(|m| m.contains("k < 0")));

    // The kept attempt surfaces the same conditions as advisories.
    let advisories: Vec<&str> = outcome
        .diagnostics
        .entries()
        .iter()
        .map(|d| d.text.as_str())
        .collect();
    assert!(advisories.iter().any(|t| t.contains("requires that")));
}

#[test]
fn division_by_the_unknown_branches_on_its_sign() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let one = ctx.num(1);
    let two = ctx.num(2);
    let lhs = ctx.div2(one, x);

    let outcome = run(&mut ctx, Equation::new(lhs, RelOp::Lt, two), sym);
    let solved = outcome.solved.unwrap();
    let text = rendered(&ctx, &solved);
    assert!(text.contains("x > 0") || text.contains("x < 0"), "got {text}");
}

#[test]
fn symbolic_divisor_equation_keeps_nonzero_advisory() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let k = ctx.var("k");
    let six = ctx.num(6);
    let lhs = ctx.mul2(k, x);

    let outcome = run(&mut ctx, Equation::new(lhs, RelOp::Eq, six), sym);
    let solved = outcome.solved.unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = 6 / k");
    assert!(outcome
        .diagnostics
        .entries()
        .iter()
        .any(|d| d.text.contains("assuming")));
}

#[test]
fn square_root_band_carries_its_domain_member() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let lhs = ctx.call("sqrt", vec![x]);

    let outcome = run(&mut ctx, Equation::new(lhs, RelOp::Lt, two), sym);
    let solved = outcome.solved.unwrap();
    let text = rendered(&ctx, &solved);
    assert!(text.contains("x < 4"), "got {text}");
    assert!(text.contains("x >= 0"), "got {text}");
}
