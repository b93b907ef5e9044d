//! Caller-facing solve configuration.

use crate::relax::RelaxLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Highest relaxation level the retry ladder may reach.
    pub max_relax_level: RelaxLevel,
    /// When set, variable-free numeric comparisons collapse to their truth
    /// value during classification and isolation.
    pub comparison_testing: bool,
    /// Differential-equation mode: the caller is isolating an auxiliary
    /// unknown inside an ODE solve and wants constants of integration
    /// treated as absorbable.
    pub ode_mode: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_relax_level: RelaxLevel::ClearSignAndType,
            comparison_testing: true,
            ode_mode: false,
        }
    }
}
