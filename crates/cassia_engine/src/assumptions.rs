//! Per-variable assumption records.
//!
//! A record holds what the caller declared about a variable's sign and
//! number domain. The store is the only state shared mutably across a
//! solve call; the solver layer owns the mutation discipline and restores
//! records after each retry.

use cassia_ast::SymbolId;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Declared sign of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sign {
    #[default]
    Unknown,
    Positive,
    Negative,
    Nonzero,
    Nonnegative,
    Nonpositive,
}

impl Sign {
    /// Does a concrete value satisfy the declared sign?
    pub fn admits(&self, value: &BigRational) -> bool {
        match self {
            Sign::Unknown => true,
            Sign::Positive => value.is_positive(),
            Sign::Negative => value.is_negative(),
            Sign::Nonzero => !value.is_zero(),
            Sign::Nonnegative => !value.is_negative(),
            Sign::Nonpositive => !value.is_positive(),
        }
    }

    pub fn is_known_negative(&self) -> bool {
        matches!(self, Sign::Negative)
    }

    pub fn is_known_positive(&self) -> bool {
        matches!(self, Sign::Positive)
    }
}

/// Declared number domain of a variable, from loosest to strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumberType {
    #[default]
    Number,
    Real,
    Rational,
    Integer,
}

impl NumberType {
    /// Does an exact rational value satisfy the declared domain?
    pub fn admits(&self, value: &BigRational) -> bool {
        match self {
            NumberType::Number | NumberType::Real | NumberType::Rational => true,
            NumberType::Integer => value.is_integer(),
        }
    }
}

/// One variable's assumption record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assumption {
    pub sign: Sign,
    pub number_type: NumberType,
}

impl Assumption {
    pub fn admits(&self, value: &BigRational) -> bool {
        self.sign.admits(value) && self.number_type.admits(value)
    }

    /// Is this record the no-information default?
    pub fn is_default(&self) -> bool {
        *self == Assumption::default()
    }
}

/// Store of assumption records keyed by interned symbol.
#[derive(Debug, Clone, Default)]
pub struct Assumptions {
    records: FxHashMap<SymbolId, Assumption>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for a symbol, defaulted when none was declared.
    pub fn get(&self, sym: SymbolId) -> Assumption {
        self.records.get(&sym).copied().unwrap_or_default()
    }

    /// Stored record, `None` when the symbol has no explicit entry.
    ///
    /// The distinction matters to the restore guard: restoring `None`
    /// must remove a transiently created record, not leave a default one.
    pub fn stored(&self, sym: SymbolId) -> Option<Assumption> {
        self.records.get(&sym).copied()
    }

    pub fn set(&mut self, sym: SymbolId, record: Assumption) {
        self.records.insert(sym, record);
    }

    pub fn remove(&mut self, sym: SymbolId) {
        self.records.remove(&sym);
    }

    /// Write back what [`Assumptions::stored`] returned earlier.
    pub fn restore(&mut self, sym: SymbolId, prior: Option<Assumption>) {
        match prior {
            Some(record) => self.set(sym, record),
            None => self.remove(sym),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn sign_admits() {
        assert!(Sign::Positive.admits(&rat(3)));
        assert!(!Sign::Positive.admits(&rat(0)));
        assert!(!Sign::Positive.admits(&rat(-3)));
        assert!(Sign::Nonnegative.admits(&rat(0)));
        assert!(Sign::Nonzero.admits(&rat(-1)));
        assert!(!Sign::Nonzero.admits(&rat(0)));
    }

    #[test]
    fn integer_type_rejects_fractions() {
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        assert!(NumberType::Rational.admits(&half));
        assert!(!NumberType::Integer.admits(&half));
        assert!(NumberType::Integer.admits(&rat(4)));
    }

    #[test]
    fn restore_removes_transient_records() {
        let mut store = Assumptions::new();
        let sym = 0;
        let prior = store.stored(sym);
        assert_eq!(prior, None);

        store.set(
            sym,
            Assumption {
                sign: Sign::Positive,
                number_type: NumberType::Integer,
            },
        );
        assert!(store.stored(sym).is_some());

        store.restore(sym, prior);
        assert_eq!(store.stored(sym), None);
    }
}
