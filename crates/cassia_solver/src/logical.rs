//! Logical structure resolution.
//!
//! Isolation can return a conjunction (inequality bands, domain members)
//! or a disjunction (even roots, absolute values, sign splits). This module
//! turns those into a solution relation plus side conditions: for an
//! equality the first isolating member wins and the rest become conditions,
//! for inequalities the isolating members form the band and the var-free
//! members become protected standing conditions. Disjunction branches are
//! resolved independently, merged when structurally equal, and a branch
//! that cannot be isolated is dropped rather than failing the whole solve.

use crate::error::SolveError;
use crate::result::SideCondition;
use cassia_ast::traversal::contains_symbol;
use cassia_ast::{Context, DisplayRelation, Equation, Expr, ExprId, RelOp, Relation, SymbolId};
use cassia_engine::{Diagnostics, SolveBudget};

/// Outcome of resolving one logical structure.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub relation: Relation,
    pub side_conditions: Vec<SideCondition>,
}

enum Member {
    /// `var op rhs` with `rhs` free of the target variable.
    Isolating(Equation),
    /// A comparison still mentioning the target variable elsewhere.
    Partial,
    /// A variable-free comparison acting as a condition.
    Condition(Relation),
    /// Not a comparison at all.
    Foreign,
}

fn classify_member(ctx: &Context, member: &Relation, var: SymbolId) -> Member {
    let Relation::Compare(eq) = member else {
        return Member::Foreign;
    };
    let lhs_is_var = matches!(ctx.get(eq.lhs), Expr::Variable(s) if *s == var);
    if lhs_is_var && !contains_symbol(ctx, eq.rhs, var) {
        Member::Isolating(*eq)
    } else if contains_symbol(ctx, eq.lhs, var) || contains_symbol(ctx, eq.rhs, var) {
        Member::Partial
    } else {
        Member::Condition(member.clone())
    }
}

/// Resolve a conjunction of members for `var`.
///
/// `target_op` is the operator of the original input relation and selects
/// the equality path (single candidate, rest become the condition) or the
/// band path (all isolating members kept).
pub(crate) fn resolve_conjunction(
    ctx: &mut Context,
    members: &[Relation],
    var: SymbolId,
    target_op: RelOp,
) -> Result<Resolution, SolveError> {
    let var_name = ctx.sym_name(var).to_string();
    let mut isolating: Vec<Equation> = Vec::new();
    let mut conditions: Vec<Relation> = Vec::new();
    for member in members {
        match classify_member(ctx, member, var) {
            Member::Isolating(eq) if op_matches(target_op, eq.op) => isolating.push(eq),
            Member::Isolating(eq) => conditions.push(Relation::Compare(eq)),
            Member::Partial => {
                return Err(SolveError::PartialIsolation { var: var_name })
            }
            Member::Condition(rel) => conditions.push(rel),
            Member::Foreign => {
                return Err(SolveError::NotAllComparisons { var: var_name })
            }
        }
    }
    if isolating.is_empty() {
        return Err(SolveError::PartialIsolation { var: var_name });
    }

    let (relation, condition) = if target_op == RelOp::Eq {
        // First equality on the variable is the candidate; every other
        // member joins the side condition.
        let winner = isolating[0];
        let mut rest: Vec<Relation> = isolating[1..]
            .iter()
            .map(|eq| Relation::Compare(*eq))
            .collect();
        rest.extend(conditions);
        (Relation::Compare(winner), Relation::and(rest))
    } else {
        // Inequality band: every isolating member is part of the answer,
        // the standing conditions are protected from further rewriting.
        let protected: Vec<Relation> = conditions
            .iter()
            .map(|rel| protect(ctx, rel))
            .collect();
        let band: Vec<Relation> = isolating
            .into_iter()
            .map(Relation::Compare)
            .collect();
        (Relation::and(band), Relation::and(protected))
    };

    let side_conditions = match condition {
        Relation::True => Vec::new(),
        other => vec![SideCondition {
            branch: None,
            relation: other,
        }],
    };
    Ok(Resolution {
        relation,
        side_conditions,
    })
}

/// Resolve a disjunction of branches for `var`.
pub(crate) fn resolve_disjunction(
    ctx: &mut Context,
    branches: &[Relation],
    var: SymbolId,
    target_op: RelOp,
    diagnostics: &mut Diagnostics,
    budget: &SolveBudget,
) -> Result<Resolution, SolveError> {
    struct Branch {
        relation: Relation,
        condition: Option<Relation>,
    }

    let mut resolved: Vec<Branch> = Vec::new();
    let mut saw_partial = false;
    for branch in branches {
        budget.check_cancelled().map_err(SolveError::from)?;
        match branch {
            Relation::All(members) => {
                match resolve_conjunction(ctx, members, var, target_op) {
                    Ok(res) => {
                        let condition = res
                            .side_conditions
                            .into_iter()
                            .next()
                            .map(|sc| sc.relation);
                        resolved.push(Branch {
                            relation: res.relation,
                            condition,
                        });
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        if matches!(err, SolveError::PartialIsolation { .. }) {
                            saw_partial = true;
                        }
                        drop_branch(ctx, branch, diagnostics);
                    }
                }
            }
            Relation::Compare(_) => match classify_member(ctx, branch, var) {
                Member::Isolating(eq) if op_matches(target_op, eq.op) => {
                    resolved.push(Branch {
                        relation: Relation::Compare(eq),
                        condition: None,
                    });
                }
                Member::Condition(rel) => {
                    // A variable-free branch means every value solves the
                    // relation whenever the branch holds.
                    diagnostics.advisory(format!(
                        "any value of {} is a solution when {}",
                        ctx.sym_name(var),
                        DisplayRelation::new(ctx, &rel)
                    ));
                }
                Member::Isolating(_) | Member::Partial => {
                    saw_partial = true;
                    drop_branch(ctx, branch, diagnostics);
                }
                Member::Foreign => unreachable!("branch is a comparison"),
            },
            _ => {
                return Err(SolveError::NotAllComparisons {
                    var: ctx.sym_name(var).to_string(),
                })
            }
        }
    }

    if resolved.is_empty() {
        let var = ctx.sym_name(var).to_string();
        return Err(if saw_partial {
            SolveError::PartialIsolation { var }
        } else {
            SolveError::NotAllComparisons { var }
        });
    }

    // Structurally equal branches merge; their conditions weaken to an OR,
    // and an unconditional duplicate makes the merged branch unconditional.
    let mut merged: Vec<Branch> = Vec::new();
    for branch in resolved {
        match merged.iter_mut().find(|m| m.relation == branch.relation) {
            Some(existing) => {
                existing.condition = match (existing.condition.take(), branch.condition) {
                    (Some(a), Some(b)) => Some(Relation::or(vec![a, b])),
                    _ => None,
                };
            }
            None => merged.push(branch),
        }
    }

    let multi = merged.len() > 1;
    let mut side_conditions = Vec::new();
    for (index, branch) in merged.iter().enumerate() {
        if let Some(condition) = &branch.condition {
            if *condition != Relation::True {
                side_conditions.push(SideCondition {
                    branch: multi.then_some(index),
                    relation: condition.clone(),
                });
            }
        }
    }
    let relation = Relation::or(merged.into_iter().map(|b| b.relation).collect());
    Ok(Resolution {
        relation,
        side_conditions,
    })
}

fn drop_branch(ctx: &Context, branch: &Relation, diagnostics: &mut Diagnostics) {
    diagnostics.advisory(format!(
        "discarding a solution branch that could not be isolated: {}",
        DisplayRelation::new(ctx, branch)
    ));
}

/// Does a result operator belong to the same comparison class as the
/// input operator? Order comparisons may flip during isolation, so any
/// order operator answers an order input.
pub(crate) fn op_matches(target: RelOp, candidate: RelOp) -> bool {
    match target {
        RelOp::Eq => candidate == RelOp::Eq,
        RelOp::Neq => candidate == RelOp::Neq,
        _ => candidate.is_order(),
    }
}

/// Mark a standing condition as settled so later passes leave it alone.
fn protect(ctx: &mut Context, rel: &Relation) -> Relation {
    match rel {
        Relation::Compare(eq) => {
            let lhs = hold_composite(ctx, eq.lhs);
            let rhs = hold_composite(ctx, eq.rhs);
            Relation::Compare(Equation::new(lhs, eq.op, rhs))
        }
        Relation::All(parts) => {
            Relation::All(parts.iter().map(|p| protect(ctx, p)).collect())
        }
        Relation::Any(parts) => {
            Relation::Any(parts.iter().map(|p| protect(ctx, p)).collect())
        }
        other => other.clone(),
    }
}

fn hold_composite(ctx: &mut Context, id: ExprId) -> ExprId {
    match ctx.get(id) {
        Expr::Hold(_) => id,
        e if e.is_leaf() => id,
        _ => ctx.hold(id),
    }
}
