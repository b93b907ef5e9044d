//! Builtin function names known to the engine.
//!
//! Functions are stored as `Expr::Function(SymbolId, args)`; this enum gives
//! the canonical spellings so call sites never match on raw strings.

/// Builtin functions the evaluator and isolator understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFn {
    Ln,
    Exp,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    /// Two-argument logarithm: `log(base, arg)`.
    Log,
    /// Derivative marker: `diff(y, x)` is "d/dx of y".
    Diff,
}

impl BuiltinFn {
    pub const fn name(&self) -> &'static str {
        match self {
            BuiltinFn::Ln => "ln",
            BuiltinFn::Exp => "exp",
            BuiltinFn::Sqrt => "sqrt",
            BuiltinFn::Abs => "abs",
            BuiltinFn::Sin => "sin",
            BuiltinFn::Cos => "cos",
            BuiltinFn::Tan => "tan",
            BuiltinFn::Arcsin => "arcsin",
            BuiltinFn::Arccos => "arccos",
            BuiltinFn::Arctan => "arctan",
            BuiltinFn::Log => "log",
            BuiltinFn::Diff => "diff",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ln" => Some(BuiltinFn::Ln),
            "exp" => Some(BuiltinFn::Exp),
            "sqrt" => Some(BuiltinFn::Sqrt),
            "abs" => Some(BuiltinFn::Abs),
            "sin" => Some(BuiltinFn::Sin),
            "cos" => Some(BuiltinFn::Cos),
            "tan" => Some(BuiltinFn::Tan),
            "arcsin" => Some(BuiltinFn::Arcsin),
            "arccos" => Some(BuiltinFn::Arccos),
            "arctan" => Some(BuiltinFn::Arctan),
            "log" => Some(BuiltinFn::Log),
            "diff" => Some(BuiltinFn::Diff),
            _ => None,
        }
    }

    /// Inverse of a single-argument builtin, when one exists.
    pub fn inverse(&self) -> Option<BuiltinFn> {
        match self {
            BuiltinFn::Ln => Some(BuiltinFn::Exp),
            BuiltinFn::Exp => Some(BuiltinFn::Ln),
            BuiltinFn::Sin => Some(BuiltinFn::Arcsin),
            BuiltinFn::Cos => Some(BuiltinFn::Arccos),
            BuiltinFn::Tan => Some(BuiltinFn::Arctan),
            BuiltinFn::Arcsin => Some(BuiltinFn::Sin),
            BuiltinFn::Arccos => Some(BuiltinFn::Cos),
            BuiltinFn::Arctan => Some(BuiltinFn::Tan),
            _ => None,
        }
    }
}
