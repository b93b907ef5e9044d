//! Comparisons and logical combinations of comparisons.

use crate::context::ExprId;

/// Comparison operator of an equation or inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
}

impl RelOp {
    /// Mirror image of the operator: `a < b` holds iff `b > a`.
    pub const fn flip(&self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Eq,
            RelOp::Neq => RelOp::Neq,
            RelOp::Lt => RelOp::Gt,
            RelOp::Gt => RelOp::Lt,
            RelOp::Leq => RelOp::Geq,
            RelOp::Geq => RelOp::Leq,
        }
    }

    /// Logical negation: `!(a < b)` is `a >= b`.
    pub const fn negate(&self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Neq,
            RelOp::Neq => RelOp::Eq,
            RelOp::Lt => RelOp::Geq,
            RelOp::Gt => RelOp::Leq,
            RelOp::Leq => RelOp::Gt,
            RelOp::Geq => RelOp::Lt,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Neq => "!=",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Leq => "<=",
            RelOp::Geq => ">=",
        }
    }

    /// Does the operator admit `a == b` as satisfying?
    pub const fn allows_equal(&self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Leq | RelOp::Geq)
    }

    /// Strict (`<`, `>`) or non-strict ordering comparison.
    pub const fn is_order(&self) -> bool {
        matches!(self, RelOp::Lt | RelOp::Gt | RelOp::Leq | RelOp::Geq)
    }
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single comparison between two expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Equation {
    pub lhs: ExprId,
    pub rhs: ExprId,
    pub op: RelOp,
}

impl Equation {
    pub fn new(lhs: ExprId, op: RelOp, rhs: ExprId) -> Self {
        Equation { lhs, rhs, op }
    }

    /// Swap sides, flipping the operator so meaning is preserved.
    pub fn swapped(&self) -> Equation {
        Equation {
            lhs: self.rhs,
            rhs: self.lhs,
            op: self.op.flip(),
        }
    }
}

/// Result of resolving an equation's logical structure.
///
/// `All` is conjunction, `Any` disjunction. Solvers normalize nested
/// combinations as they build them, so consumers can match one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Holds for every value of the unknown.
    True,
    /// Holds for no value of the unknown.
    False,
    Compare(Equation),
    All(Vec<Relation>),
    Any(Vec<Relation>),
}

impl Relation {
    /// Conjunction with short-circuit constant folding.
    pub fn and(parts: Vec<Relation>) -> Relation {
        let mut kept = Vec::with_capacity(parts.len());
        for p in parts {
            match p {
                Relation::True => {}
                Relation::False => return Relation::False,
                Relation::All(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Relation::True,
            1 => kept.pop().unwrap(),
            _ => Relation::All(kept),
        }
    }

    /// Disjunction with short-circuit constant folding.
    pub fn or(parts: Vec<Relation>) -> Relation {
        let mut kept = Vec::with_capacity(parts.len());
        for p in parts {
            match p {
                Relation::False => {}
                Relation::True => return Relation::True,
                Relation::Any(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Relation::False,
            1 => kept.pop().unwrap(),
            _ => Relation::Any(kept),
        }
    }

    /// All leaf comparisons, in left-to-right order.
    pub fn comparisons(&self) -> Vec<&Equation> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a Equation>) {
        match self {
            Relation::True | Relation::False => {}
            Relation::Compare(eq) => out.push(eq),
            Relation::All(parts) | Relation::Any(parts) => {
                for p in parts {
                    p.collect_comparisons(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn flip_round_trips() {
        for op in [
            RelOp::Eq,
            RelOp::Neq,
            RelOp::Lt,
            RelOp::Gt,
            RelOp::Leq,
            RelOp::Geq,
        ] {
            assert_eq!(op.flip().flip(), op);
            assert_eq!(op.negate().negate(), op);
        }
    }

    #[test]
    fn and_folds_constants() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let cmp = Relation::Compare(Equation::new(x, RelOp::Eq, one));

        assert_eq!(
            Relation::and(vec![Relation::True, cmp.clone()]),
            cmp.clone()
        );
        assert_eq!(
            Relation::and(vec![Relation::False, cmp.clone()]),
            Relation::False
        );
        assert_eq!(Relation::and(vec![]), Relation::True);
        assert_eq!(
            Relation::or(vec![Relation::False, cmp.clone()]),
            cmp.clone()
        );
        assert_eq!(Relation::or(vec![Relation::True, cmp]), Relation::True);
        assert_eq!(Relation::or(vec![]), Relation::False);
    }

    #[test]
    fn nested_combinations_flatten() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let a = Relation::Compare(Equation::new(x, RelOp::Gt, ctx.num(0)));
        let b = Relation::Compare(Equation::new(x, RelOp::Lt, ctx.num(2)));
        let c = Relation::Compare(Equation::new(x, RelOp::Neq, ctx.num(1)));

        let inner = Relation::and(vec![a.clone(), b.clone()]);
        let outer = Relation::and(vec![inner, c.clone()]);
        assert_eq!(outer, Relation::All(vec![a, b, c]));
    }
}
