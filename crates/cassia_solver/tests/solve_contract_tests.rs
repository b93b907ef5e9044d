//! End-to-end solve behavior for single comparisons.

use cassia_ast::{Context, DisplayRelation, Equation, RelOp, Relation, SymbolId};
use cassia_engine::{eval_relation, substitute_var, Assumptions, Diagnostics, SolveBudget};
use cassia_solver::{solve_equation, SolveError, SolvedEquation, SolverOptions};

fn run(ctx: &mut Context, eq: Equation, var: SymbolId) -> Result<SolvedEquation, SolveError> {
    let options = SolverOptions::default();
    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    solve_equation(
        ctx,
        &eq,
        var,
        &options,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
}

fn rendered(ctx: &Context, solved: &SolvedEquation) -> String {
    DisplayRelation::new(ctx, &solved.relation).to_string()
}

#[test]
fn solves_linear_equation() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let one = ctx.num(1);
    let seven = ctx.num(7);
    let prod = ctx.mul2(two, x);
    let lhs = ctx.add2(prod, one);

    let solved = run(&mut ctx, Equation::new(lhs, RelOp::Eq, seven), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = 3");
}

#[test]
fn solves_quadratic_into_two_branches() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let four = ctx.num(4);
    let sq = ctx.pow2(x, two);

    let solved = run(&mut ctx, Equation::new(sq, RelOp::Eq, four), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = 2 or x = -2");
}

#[test]
fn solves_strict_inequality_with_flip() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let four = ctx.num(4);
    let neg = ctx.neg(two);
    let lhs = ctx.mul2(neg, x);

    // -2x < 4 flips on division by the negative factor.
    let solved = run(&mut ctx, Equation::new(lhs, RelOp::Lt, four), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x > -2");
}

#[test]
fn already_isolated_equation_round_trips() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let seven = ctx.num(7);

    let solved = run(&mut ctx, Equation::new(x, RelOp::Eq, seven), sym).unwrap();
    assert_eq!(
        solved.relation,
        Relation::Compare(Equation::new(x, RelOp::Eq, seven))
    );
}

#[test]
fn solution_substitutes_back_into_the_equation() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let three = ctx.num(3);
    let five = ctx.num(5);
    let one = ctx.num(1);
    let prod = ctx.mul2(three, x);
    let lhs = ctx.sub2(prod, one);
    let eq = Equation::new(lhs, RelOp::Eq, five);

    let solved = run(&mut ctx, eq, sym).unwrap();
    let Relation::Compare(result) = &solved.relation else {
        panic!("expected a single comparison");
    };
    let back_lhs = substitute_var(&mut ctx, eq.lhs, sym, result.rhs);
    let back_rhs = substitute_var(&mut ctx, eq.rhs, sym, result.rhs);
    let check = Relation::Compare(Equation::new(back_lhs, RelOp::Eq, back_rhs));
    assert_eq!(eval_relation(&mut ctx, &check, true), Relation::True);
}

#[test]
fn solves_absolute_value_equation() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let three = ctx.num(3);
    let lhs = ctx.call("abs", vec![x]);

    let solved = run(&mut ctx, Equation::new(lhs, RelOp::Eq, three), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = 3 or x = -3");
}

#[test]
fn solves_exponential_equation() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let five = ctx.num(5);
    let lhs = ctx.call("exp", vec![x]);

    let solved = run(&mut ctx, Equation::new(lhs, RelOp::Eq, five), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = ln(5)");
}

#[test]
fn solves_square_root_equation() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let five = ctx.num(5);
    let lhs = ctx.call("sqrt", vec![x]);

    let solved = run(&mut ctx, Equation::new(lhs, RelOp::Eq, five), sym).unwrap();
    assert_eq!(rendered(&ctx, &solved), "x = 25");
}

#[test]
fn tautology_and_contradiction_are_diagnosed() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let err = run(&mut ctx, Equation::new(x, RelOp::Eq, x), sym).unwrap_err();
    let SolveError::AssumptionsExhausted { first, .. } = err else {
        panic!("expected exhaustion");
    };
    assert!(matches!(*first, SolveError::Tautology { .. }));

    let two = ctx.num(2);
    let nine = ctx.num(9);
    let neg_nine = ctx.neg(nine);
    let sq = ctx.pow2(x, two);
    let err = run(&mut ctx, Equation::new(sq, RelOp::Eq, neg_nine), sym).unwrap_err();
    let SolveError::AssumptionsExhausted { first, .. } = err else {
        panic!("expected exhaustion");
    };
    assert!(matches!(*first, SolveError::NoSolution { .. }));
}

#[test]
fn cancelled_token_aborts_the_solve() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let five = ctx.num(5);
    let lhs = ctx.add2(x, five);

    let options = SolverOptions::default();
    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    budget.token().cancel();
    let err = solve_equation(
        &mut ctx,
        &Equation::new(lhs, RelOp::Eq, five),
        sym,
        &options,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap_err();
    assert_eq!(err, SolveError::Cancelled);
}
