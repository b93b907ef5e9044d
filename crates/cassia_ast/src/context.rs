//! Hash-consed expression arena.
//!
//! All expression nodes live in a [`Context`]. `add` interns structurally:
//! building the same node twice yields the same [`ExprId`], so id equality
//! implies structural equality and subtree sharing is free. Nodes are never
//! mutated in place; rewrites allocate new nodes.

use crate::builtin::BuiltinFn;
use crate::expression::{Constant, Expr};
use crate::symbol::{SymbolId, SymbolTable};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

/// Copyable index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena owning every expression node plus the symbol table.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    interned: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, reusing an existing id when an identical node exists.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interned.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.interned.insert(expr, id);
        id
    }

    /// Borrow the node behind an id.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Intern a name without building a node.
    pub fn sym(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    /// Resolve a symbol id back to its name.
    #[inline]
    pub fn sym_name(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    /// Id of an already-interned name, if any.
    pub fn sym_lookup(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name)
    }

    /// Integer literal node.
    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    /// Exact rational literal node.
    pub fn num_rational(&mut self, n: BigRational) -> ExprId {
        self.add(Expr::Number(n))
    }

    /// Variable node for `name`.
    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    /// Function application by name.
    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Function(sym, args))
    }

    /// Function application for a builtin.
    pub fn call_builtin(&mut self, f: BuiltinFn, args: Vec<ExprId>) -> ExprId {
        self.call(f.name(), args)
    }

    /// The builtin behind a function symbol, if the name is one.
    pub fn builtin_of(&self, sym: SymbolId) -> Option<BuiltinFn> {
        BuiltinFn::from_name(self.symbols.resolve(sym))
    }

    // Convenience constructors used heavily by rewrites.

    pub fn add2(&mut self, l: ExprId, r: ExprId) -> ExprId {
        self.add(Expr::Add(l, r))
    }

    pub fn sub2(&mut self, l: ExprId, r: ExprId) -> ExprId {
        self.add(Expr::Sub(l, r))
    }

    pub fn mul2(&mut self, l: ExprId, r: ExprId) -> ExprId {
        self.add(Expr::Mul(l, r))
    }

    pub fn div2(&mut self, l: ExprId, r: ExprId) -> ExprId {
        self.add(Expr::Div(l, r))
    }

    pub fn pow2(&mut self, base: ExprId, exp: ExprId) -> ExprId {
        self.add(Expr::Pow(base, exp))
    }

    pub fn neg(&mut self, e: ExprId) -> ExprId {
        self.add(Expr::Neg(e))
    }

    pub fn hold(&mut self, e: ExprId) -> ExprId {
        self.add(Expr::Hold(e))
    }

    /// Numeric value of a node, looking through `Neg` and `Hold`.
    pub fn as_number(&self, id: ExprId) -> Option<BigRational> {
        match self.get(id) {
            Expr::Number(n) => Some(n.clone()),
            Expr::Neg(inner) => self.as_number(*inner).map(|n| -n),
            Expr::Hold(inner) => self.as_number(*inner),
            _ => None,
        }
    }

    /// Is this node exactly the variable `name`?
    pub fn is_var(&self, id: ExprId, name: &str) -> bool {
        matches!(self.get(id), Expr::Variable(sym) if self.sym_name(*sym) == name)
    }

    /// Unwrap one `Hold` layer, if present.
    pub fn unwrap_hold(&self, id: ExprId) -> ExprId {
        match self.get(id) {
            Expr::Hold(inner) => *inner,
            _ => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_consing_reuses_ids() {
        let mut ctx = Context::new();
        let x1 = ctx.var("x");
        let x2 = ctx.var("x");
        assert_eq!(x1, x2);

        let one = ctx.num(1);
        let a = ctx.add2(x1, one);
        let b = ctx.add2(x2, one);
        assert_eq!(a, b);
    }

    #[test]
    fn as_number_sees_through_neg() {
        let mut ctx = Context::new();
        let five = ctx.num(5);
        let neg = ctx.neg(five);
        assert_eq!(
            ctx.as_number(neg),
            Some(BigRational::from_integer(BigInt::from(-5)))
        );
        let x = ctx.var("x");
        assert_eq!(ctx.as_number(x), None);
    }

    #[test]
    fn builtin_roundtrip() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let call = ctx.call_builtin(BuiltinFn::Ln, vec![x]);
        match ctx.get(call) {
            Expr::Function(sym, args) => {
                assert_eq!(ctx.builtin_of(*sym), Some(BuiltinFn::Ln));
                assert_eq!(args, &vec![x]);
            }
            other => panic!("expected function node, got {:?}", other),
        }
    }
}
