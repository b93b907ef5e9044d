//! Assumption relaxation ladder.
//!
//! A failed isolation attempt may be an artifact of the variable's declared
//! sign or number domain rather than of the algebra. The ladder retries with
//! progressively weaker records: first as declared, then with the sign
//! cleared, then with sign and type both cleared. The guard restores the
//! stored record exactly, including removing a record that did not exist
//! before the attempt.

use cassia_engine::{Assumption, Assumptions, NumberType, Sign};
use cassia_ast::SymbolId;
use serde::{Deserialize, Serialize};

/// Escalation level for one retry of the isolation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelaxLevel {
    /// Use the variable's declared assumptions unchanged.
    UseExisting,
    /// Clear the sign assumption, keep the number domain.
    ClearSign,
    /// Clear both the sign and the number domain.
    ClearSignAndType,
}

impl RelaxLevel {
    /// Levels in attempt order.
    pub fn ladder() -> [RelaxLevel; 3] {
        [
            RelaxLevel::UseExisting,
            RelaxLevel::ClearSign,
            RelaxLevel::ClearSignAndType,
        ]
    }

    /// Would this level actually change the given record? Retrying at a
    /// level that leaves the record untouched can only repeat the failure.
    pub fn changes(&self, record: Assumption) -> bool {
        match self {
            RelaxLevel::UseExisting => true,
            RelaxLevel::ClearSign => record.sign != Sign::Unknown,
            RelaxLevel::ClearSignAndType => {
                record.sign != Sign::Unknown || record.number_type != NumberType::Number
            }
        }
    }
}

/// Scoped weakening of one variable's assumption record.
///
/// Holds the store mutably for the duration of an attempt and writes the
/// prior record back on drop, so no failure path can leak a weakened or
/// transiently created record.
pub struct AssumptionGuard<'a> {
    store: &'a mut Assumptions,
    var: SymbolId,
    prior: Option<Assumption>,
}

impl<'a> AssumptionGuard<'a> {
    pub fn apply(store: &'a mut Assumptions, var: SymbolId, level: RelaxLevel) -> Self {
        let prior = store.stored(var);
        match level {
            RelaxLevel::UseExisting => {}
            RelaxLevel::ClearSign => {
                let mut record = store.get(var);
                record.sign = Sign::Unknown;
                store.set(var, record);
            }
            RelaxLevel::ClearSignAndType => {
                store.set(var, Assumption::default());
            }
        }
        AssumptionGuard { store, var, prior }
    }

    /// Read access for the attempt running under this guard.
    pub fn assumptions(&self) -> &Assumptions {
        self.store
    }
}

impl Drop for AssumptionGuard<'_> {
    fn drop(&mut self) {
        self.store.restore(self.var, self.prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAR: SymbolId = 0;

    fn positive_integer() -> Assumption {
        Assumption {
            sign: Sign::Positive,
            number_type: NumberType::Integer,
        }
    }

    #[test]
    fn clear_sign_keeps_number_type() {
        let mut store = Assumptions::new();
        store.set(VAR, positive_integer());
        {
            let guard = AssumptionGuard::apply(&mut store, VAR, RelaxLevel::ClearSign);
            let seen = guard.assumptions().get(VAR);
            assert_eq!(seen.sign, Sign::Unknown);
            assert_eq!(seen.number_type, NumberType::Integer);
        }
        assert_eq!(store.stored(VAR), Some(positive_integer()));
    }

    #[test]
    fn clear_both_restores_exactly() {
        let mut store = Assumptions::new();
        store.set(VAR, positive_integer());
        {
            let guard = AssumptionGuard::apply(&mut store, VAR, RelaxLevel::ClearSignAndType);
            assert!(guard.assumptions().get(VAR).is_default());
        }
        assert_eq!(store.stored(VAR), Some(positive_integer()));
    }

    #[test]
    fn transient_record_is_removed_on_drop() {
        let mut store = Assumptions::new();
        assert_eq!(store.stored(VAR), None);
        {
            let guard = AssumptionGuard::apply(&mut store, VAR, RelaxLevel::ClearSign);
            assert!(guard.assumptions().stored(VAR).is_some());
        }
        assert_eq!(store.stored(VAR), None);
    }

    #[test]
    fn changes_reports_useless_levels() {
        assert!(!RelaxLevel::ClearSign.changes(Assumption::default()));
        assert!(RelaxLevel::ClearSign.changes(positive_integer()));
        let integer_only = Assumption {
            sign: Sign::Unknown,
            number_type: NumberType::Integer,
        };
        assert!(!RelaxLevel::ClearSign.changes(integer_only));
        assert!(RelaxLevel::ClearSignAndType.changes(integer_only));
    }
}
