//! Human-readable rendering of expressions and relations.
//!
//! Nodes only carry ids, so display goes through wrapper types that borrow
//! the owning [`Context`]. Parentheses are inserted from operator precedence
//! and associativity, never stored in the tree. `Hold` is invisible here.

use crate::context::{Context, ExprId};
use crate::expression::Expr;
use crate::relation::{Equation, Relation};
use num_traits::Signed;
use std::fmt;

/// Binding strength of a node, used to decide parenthesization.
fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Add(_, _) | Expr::Sub(_, _) => 1,
        Expr::Mul(_, _) | Expr::Div(_, _) => 2,
        Expr::Neg(_) => 3,
        Expr::Pow(_, _) => 4,
        Expr::Number(n) if n.is_negative() => 3,
        _ => 5,
    }
}

/// Displayable view of one expression.
pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl<'a> DisplayExpr<'a> {
    pub fn new(context: &'a Context, id: ExprId) -> Self {
        DisplayExpr { context, id }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(self.context, self.id, f)
    }
}

fn write_expr(ctx: &Context, id: ExprId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ctx.get(id) {
        Expr::Number(n) => {
            if n.is_integer() {
                write!(f, "{}", n.numer())
            } else {
                write!(f, "{}/{}", n.numer(), n.denom())
            }
        }
        Expr::Constant(c) => f.write_str(c.name()),
        Expr::Variable(sym) => f.write_str(ctx.sym_name(*sym)),
        Expr::Add(l, r) => {
            write_child(ctx, *l, 1, false, f)?;
            f.write_str(" + ")?;
            write_child(ctx, *r, 1, false, f)
        }
        Expr::Sub(l, r) => {
            write_child(ctx, *l, 1, false, f)?;
            f.write_str(" - ")?;
            // Right side of a subtraction binds tighter: a - (b + c).
            write_child(ctx, *r, 1, true, f)
        }
        Expr::Mul(l, r) => {
            write_child(ctx, *l, 2, false, f)?;
            f.write_str(" * ")?;
            write_child(ctx, *r, 2, false, f)
        }
        Expr::Div(l, r) => {
            write_child(ctx, *l, 2, false, f)?;
            f.write_str(" / ")?;
            write_child(ctx, *r, 2, true, f)
        }
        Expr::Neg(inner) => {
            f.write_str("-")?;
            write_child(ctx, *inner, 3, true, f)
        }
        Expr::Pow(base, exp) => {
            // Power is right associative, so the base needs parens at
            // equal precedence but the exponent does not.
            write_child(ctx, *base, 4, true, f)?;
            f.write_str("^")?;
            write_child(ctx, *exp, 4, false, f)
        }
        Expr::Function(sym, args) => {
            f.write_str(ctx.sym_name(*sym))?;
            f.write_str("(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(ctx, *arg, f)?;
            }
            f.write_str(")")
        }
        Expr::Hold(inner) => write_expr(ctx, *inner, f),
    }
}

fn write_child(
    ctx: &Context,
    id: ExprId,
    parent_prec: u8,
    strict: bool,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let child = ctx.get(id);
    let child_prec = match child {
        Expr::Hold(inner) => precedence(ctx.get(*inner)),
        other => precedence(other),
    };
    let needs_parens = if strict {
        child_prec <= parent_prec
    } else {
        child_prec < parent_prec
    };
    if needs_parens {
        f.write_str("(")?;
        write_expr(ctx, id, f)?;
        f.write_str(")")
    } else {
        write_expr(ctx, id, f)
    }
}

/// Displayable view of a comparison.
pub struct DisplayEquation<'a> {
    pub context: &'a Context,
    pub equation: Equation,
}

impl<'a> DisplayEquation<'a> {
    pub fn new(context: &'a Context, equation: Equation) -> Self {
        DisplayEquation { context, equation }
    }
}

impl fmt::Display for DisplayEquation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            DisplayExpr::new(self.context, self.equation.lhs),
            self.equation.op,
            DisplayExpr::new(self.context, self.equation.rhs)
        )
    }
}

/// Displayable view of a logical combination of comparisons.
pub struct DisplayRelation<'a> {
    pub context: &'a Context,
    pub relation: &'a Relation,
}

impl<'a> DisplayRelation<'a> {
    pub fn new(context: &'a Context, relation: &'a Relation) -> Self {
        DisplayRelation { context, relation }
    }
}

impl fmt::Display for DisplayRelation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_relation(self.context, self.relation, f, false)
    }
}

fn write_relation(
    ctx: &Context,
    rel: &Relation,
    f: &mut fmt::Formatter<'_>,
    nested: bool,
) -> fmt::Result {
    match rel {
        Relation::True => f.write_str("true"),
        Relation::False => f.write_str("false"),
        Relation::Compare(eq) => write!(f, "{}", DisplayEquation::new(ctx, *eq)),
        Relation::All(parts) => write_parts(ctx, parts, " and ", f, nested),
        Relation::Any(parts) => write_parts(ctx, parts, " or ", f, nested),
    }
}

fn write_parts(
    ctx: &Context,
    parts: &[Relation],
    sep: &str,
    f: &mut fmt::Formatter<'_>,
    nested: bool,
) -> fmt::Result {
    if nested {
        f.write_str("(")?;
    }
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write_relation(ctx, p, f, true)?;
    }
    if nested {
        f.write_str(")")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelOp;

    fn render(ctx: &Context, id: ExprId) -> String {
        DisplayExpr::new(ctx, id).to_string()
    }

    #[test]
    fn precedence_inserts_parens() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let two = ctx.num(2);
        let sum = ctx.add2(x, one);
        let prod = ctx.mul2(two, sum);
        assert_eq!(render(&ctx, prod), "2 * (x + 1)");

        let prod2 = ctx.mul2(two, x);
        let sum2 = ctx.add2(prod2, one);
        assert_eq!(render(&ctx, sum2), "2 * x + 1");
    }

    #[test]
    fn subtraction_right_side_parenthesized() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let inner = ctx.sub2(x, one);
        let outer = ctx.sub2(x, inner);
        assert_eq!(render(&ctx, outer), "x - (x - 1)");
    }

    #[test]
    fn power_base_parenthesized() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let two = ctx.num(2);
        let base = ctx.add2(x, one);
        let pow = ctx.pow2(base, two);
        assert_eq!(render(&ctx, pow), "(x + 1)^2");

        let nested = ctx.pow2(x, two);
        let tower = ctx.pow2(nested, two);
        assert_eq!(render(&ctx, tower), "(x^2)^2");
    }

    #[test]
    fn rationals_and_functions() {
        let mut ctx = Context::new();
        use num_bigint::BigInt;
        use num_rational::BigRational;
        let half = ctx.num_rational(BigRational::new(BigInt::from(1), BigInt::from(2)));
        assert_eq!(render(&ctx, half), "1/2");

        let x = ctx.var("x");
        let call = ctx.call("ln", vec![x]);
        assert_eq!(render(&ctx, call), "ln(x)");
    }

    #[test]
    fn hold_is_invisible() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let sum = ctx.add2(x, one);
        let held = ctx.hold(sum);
        let two = ctx.num(2);
        let prod = ctx.mul2(two, held);
        assert_eq!(render(&ctx, prod), "2 * (x + 1)");
    }

    #[test]
    fn relation_rendering() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let zero = ctx.num(0);
        let two = ctx.num(2);
        let rel = Relation::Any(vec![
            Relation::Compare(Equation::new(x, RelOp::Lt, zero)),
            Relation::All(vec![
                Relation::Compare(Equation::new(x, RelOp::Gt, zero)),
                Relation::Compare(Equation::new(x, RelOp::Lt, two)),
            ]),
        ]);
        assert_eq!(
            DisplayRelation::new(&ctx, &rel).to_string(),
            "x < 0 or (x > 0 and x < 2)"
        );
    }
}
