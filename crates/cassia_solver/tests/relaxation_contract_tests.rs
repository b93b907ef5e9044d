//! Assumption relaxation ladder behavior across whole solves.

use cassia_ast::{Context, DisplayRelation, Equation, RelOp};
use cassia_engine::{
    Assumption, Assumptions, Diagnostics, NumberType, Sign, SolveBudget,
};
use cassia_solver::{solve_equation, RelaxLevel, SolveError, SolverOptions};

#[test]
fn contradictory_sign_fails_then_recovers_with_restoration() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let three = ctx.num(3);
    let neg_three = ctx.neg(three);

    let record = Assumption {
        sign: Sign::Positive,
        number_type: NumberType::Integer,
    };
    let mut assumptions = Assumptions::new();
    assumptions.set(sym, record);

    // Capped at L0 the contradiction is terminal.
    let capped = SolverOptions {
        max_relax_level: RelaxLevel::UseExisting,
        ..SolverOptions::default()
    };
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    let err = solve_equation(
        &mut ctx,
        &Equation::new(x, RelOp::Lt, neg_three),
        sym,
        &capped,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap_err();
    let SolveError::AssumptionsExhausted { first, .. } = err else {
        panic!("expected exhaustion");
    };
    assert!(matches!(*first, SolveError::NoSolution { .. }));
    assert_eq!(assumptions.stored(sym), Some(record));

    // With the full ladder the sign is cleared at L1 and the solve goes
    // through; the stored record comes back exactly.
    let mut diagnostics = Diagnostics::new();
    let solved = solve_equation(
        &mut ctx,
        &Equation::new(x, RelOp::Lt, neg_three),
        sym,
        &SolverOptions::default(),
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap();
    assert_eq!(
        DisplayRelation::new(&ctx, &solved.relation).to_string(),
        "x < -3"
    );
    assert_eq!(assumptions.stored(sym), Some(record));
}

#[test]
fn integer_domain_clears_only_at_the_last_level() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let one = ctx.num(1);
    let two = ctx.num(2);
    let half = ctx.div2(one, two);

    let record = Assumption {
        sign: Sign::Unknown,
        number_type: NumberType::Integer,
    };
    let mut assumptions = Assumptions::new();
    assumptions.set(sym, record);
    let budget = SolveBudget::default();

    // ClearSign leaves the integer domain in place, so x = 1/2 stays
    // inadmissible through L1.
    let capped = SolverOptions {
        max_relax_level: RelaxLevel::ClearSign,
        ..SolverOptions::default()
    };
    let mut diagnostics = Diagnostics::new();
    let err = solve_equation(
        &mut ctx,
        &Equation::new(x, RelOp::Eq, half),
        sym,
        &capped,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap_err();
    let SolveError::AssumptionsExhausted { first, .. } = err else {
        panic!("expected exhaustion");
    };
    assert!(matches!(*first, SolveError::NoSolution { .. }));

    let mut diagnostics = Diagnostics::new();
    let solved = solve_equation(
        &mut ctx,
        &Equation::new(x, RelOp::Eq, half),
        sym,
        &SolverOptions::default(),
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap();
    assert_eq!(
        DisplayRelation::new(&ctx, &solved.relation).to_string(),
        "x = 1/2"
    );
    assert_eq!(assumptions.stored(sym), Some(record));
}

#[test]
fn unassumed_variable_is_never_given_a_lasting_record() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let two = ctx.num(2);
    let sq = ctx.pow2(x, two);
    let rhs = ctx.add2(x, two);

    let mut assumptions = Assumptions::new();
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    // Fails at every level; no record may be left behind.
    let _ = solve_equation(
        &mut ctx,
        &Equation::new(sq, RelOp::Eq, rhs),
        sym,
        &SolverOptions::default(),
        &mut assumptions,
        &mut diagnostics,
        &budget,
    );
    assert_eq!(assumptions.stored(sym), None);
}

#[test]
fn first_failure_diagnosis_survives_relaxed_retries() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let sym = ctx.sym("x");
    let five = ctx.num(5);
    let neg_five = ctx.neg(five);

    let mut assumptions = Assumptions::new();
    assumptions.set(
        sym,
        Assumption {
            sign: Sign::Positive,
            number_type: NumberType::Number,
        },
    );
    let mut diagnostics = Diagnostics::new();
    let budget = SolveBudget::default();
    // L0 diagnoses NoSolution; the relaxed retries succeed, so this solve
    // actually recovers. Cap the ladder to watch the first diagnosis win.
    let capped = SolverOptions {
        max_relax_level: RelaxLevel::UseExisting,
        ..SolverOptions::default()
    };
    let err = solve_equation(
        &mut ctx,
        &Equation::new(x, RelOp::Eq, neg_five),
        sym,
        &capped,
        &mut assumptions,
        &mut diagnostics,
        &budget,
    )
    .unwrap_err();
    match err {
        SolveError::AssumptionsExhausted { var, first } => {
            assert_eq!(var, "x");
            assert!(matches!(*first, SolveError::NoSolution { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
