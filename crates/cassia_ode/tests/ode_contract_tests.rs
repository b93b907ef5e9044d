//! End-to-end dsolve behavior across the recognized equation shapes.

use cassia_ast::{BuiltinFn, Context, DisplayEquation, DisplayRelation, Equation, ExprId, RelOp};
use cassia_engine::{Assumptions, Diagnostics, SolveBudget};
use cassia_ode::{dsolve, OdeError};
use cassia_solver::SolvedEquation;

fn run(
    ctx: &mut Context,
    eq: Equation,
    initial: Option<(ExprId, ExprId)>,
) -> Result<SolvedEquation, OdeError> {
    let dep = ctx.sym("y");
    let indep = ctx.sym("x");
    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    dsolve(
        ctx,
        &eq,
        dep,
        indep,
        initial,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
}

fn rendered(ctx: &Context, solved: &SolvedEquation) -> String {
    DisplayRelation::new(ctx, &solved.relation).to_string()
}

#[test]
fn autonomous_equation_solves_to_an_exponential() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);

    let solved = run(&mut ctx, Equation::new(dy, RelOp::Eq, y), None).unwrap();
    assert_eq!(rendered(&ctx, &solved), "y = C * exp(x)");
}

#[test]
fn initial_condition_pins_the_exponential() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let zero = ctx.num(0);
    let one = ctx.num(1);

    let solved = run(&mut ctx, Equation::new(dy, RelOp::Eq, y), Some((zero, one))).unwrap();
    assert_eq!(rendered(&ctx, &solved), "y = exp(x)");
}

#[test]
fn direct_equation_integrates_the_right_side() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let two = ctx.num(2);
    let rhs = ctx.mul2(two, x);

    let solved = run(&mut ctx, Equation::new(dy, RelOp::Eq, rhs), None).unwrap();
    assert_eq!(rendered(&ctx, &solved), "y = x^2 + C");
}

#[test]
fn separable_product_splits_across_both_sides() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let rhs = ctx.mul2(x, y);

    let solved = run(&mut ctx, Equation::new(dy, RelOp::Eq, rhs), None).unwrap();
    // ln(y) = x^2 / 2 + C solved for y, with the constant rescaled.
    let text = rendered(&ctx, &solved);
    assert!(text.starts_with("y = "), "unexpected result: {text}");
    assert!(text.contains("exp"), "unexpected result: {text}");
    assert!(text.contains('C'), "unexpected result: {text}");
}

#[test]
fn bernoulli_equation_is_reduced_and_solved() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let two = ctx.num(2);
    let y_sq = ctx.pow2(y, two);
    let lin = ctx.div2(y, x);
    let quad = ctx.mul2(x, y_sq);
    let rhs = ctx.add2(lin, quad);

    let solved = run(&mut ctx, Equation::new(dy, RelOp::Eq, rhs), None).unwrap();
    let text = rendered(&ctx, &solved);
    assert!(text.contains('y'), "unexpected result: {text}");
    assert!(text.contains('C'), "unexpected result: {text}");
}

#[test]
fn derivative_on_the_right_side_is_found() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);

    let solved = run(&mut ctx, Equation::new(y, RelOp::Eq, dy), None).unwrap();
    assert_eq!(rendered(&ctx, &solved), "y = C * exp(x)");
}

#[test]
fn unrecognized_shape_returns_the_held_equation() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let arg = ctx.add2(x, y);
    let rhs = ctx.call_builtin(BuiltinFn::Sin, vec![arg]);

    let err = run(&mut ctx, Equation::new(dy, RelOp::Eq, rhs), None).unwrap_err();
    let OdeError::ShapeNotRecognized { remaining } = err else {
        panic!("expected an unrecognized shape");
    };
    let text = DisplayEquation::new(&ctx, remaining).to_string();
    assert!(text.contains("diff(y, x)"), "unexpected remainder: {text}");
    assert!(text.contains("sin(x + y)"), "unexpected remainder: {text}");
}

#[test]
fn second_derivative_is_rejected() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let d2y = ctx.call_builtin(BuiltinFn::Diff, vec![dy, x]);

    let err = run(&mut ctx, Equation::new(d2y, RelOp::Eq, y), None).unwrap_err();
    assert_eq!(err, OdeError::HigherOrder);
}

#[test]
fn failure_leaves_a_fatal_diagnostic() {
    let mut ctx = Context::new();
    let y = ctx.var("y");
    let x = ctx.var("x");
    let dep = ctx.sym("y");
    let indep = ctx.sym("x");
    let dy = ctx.call_builtin(BuiltinFn::Diff, vec![y, x]);
    let arg = ctx.add2(x, y);
    let rhs = ctx.call_builtin(BuiltinFn::Sin, vec![arg]);
    let eq = Equation::new(dy, RelOp::Eq, rhs);

    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    let result = dsolve(
        &mut ctx,
        &eq,
        dep,
        indep,
        None,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    );
    assert!(result.is_err());
    assert!(!diagnostics.entries().is_empty());
}
