//! Successful solve output.

use cassia_ast::{Context, DisplayRelation, Relation, SymbolId};

/// A constraint that must hold for (part of) the solution to be valid,
/// e.g. the sign condition attached to one branch of a division by a
/// symbolic factor.
#[derive(Debug, Clone, PartialEq)]
pub struct SideCondition {
    /// Zero-based branch index for disjunctive solutions, `None` when the
    /// condition applies to the whole result.
    pub branch: Option<usize>,
    pub relation: Relation,
}

impl SideCondition {
    /// Advisory text in the form reported to the caller.
    pub fn message(&self, ctx: &Context) -> String {
        let rendered = DisplayRelation::new(ctx, &self.relation);
        match self.branch {
            Some(index) => format!("solution {} requires that {}", index + 1, rendered),
            None => format!("the solution requires that {}", rendered),
        }
    }
}

/// A solved relation for one target variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedEquation {
    pub var: SymbolId,
    /// `var op expr` for a single solution, `Any` of such comparisons for
    /// multiple branches, `All` for an inequality band.
    pub relation: Relation,
    pub side_conditions: Vec<SideCondition>,
}

impl SolvedEquation {
    pub fn new(var: SymbolId, relation: Relation) -> Self {
        SolvedEquation {
            var,
            relation,
            side_conditions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassia_ast::{Equation, RelOp};

    #[test]
    fn side_condition_messages_are_ordinal() {
        let mut ctx = Context::new();
        let k = ctx.var("k");
        let zero = ctx.num(0);
        let relation = Relation::Compare(Equation::new(k, RelOp::Gt, zero));

        let branch = SideCondition {
            branch: Some(1),
            relation: relation.clone(),
        };
        assert_eq!(branch.message(&ctx), "solution 2 requires that k > 0");

        let whole = SideCondition {
            branch: None,
            relation,
        };
        assert_eq!(whole.message(&ctx), "the solution requires that k > 0");
    }
}
