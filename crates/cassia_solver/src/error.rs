//! Solver failure taxonomy.

use cassia_engine::EngineError;
use thiserror::Error;

/// Why a solve attempt (or the whole solve) failed.
///
/// `DepthExceeded` and `Cancelled` abort immediately; the remaining
/// structural diagnoses feed the relaxation retry loop, which keeps the
/// first one it saw and reports it on exhaustion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("the input is not an equation or inequality")]
    NotAnEquation,
    #[error("the relation holds for every value of '{var}'")]
    Tautology {
        var: String,
        /// Rendered statement of what holds, captured on the first
        /// attempt only. Relaxed retries leave it empty.
        condition: Option<String>,
    },
    #[error("the relation has no solution for '{var}'")]
    NoSolution { var: String },
    #[error("'{var}' could not be fully isolated")]
    PartialIsolation { var: String },
    #[error("the rewriter returned a result of unrecognized shape")]
    UnclassifiedResult,
    #[error("every relaxation level failed for '{var}': {first}")]
    AssumptionsExhausted {
        var: String,
        /// Diagnosis from the earliest failed attempt. Later attempts run
        /// under weaker assumptions and produce less specific errors.
        first: Box<SolveError>,
    },
    #[error("not every branch reduced to a comparison on '{var}'")]
    NotAllComparisons { var: String },
    #[error("recursion depth limit of {limit} exceeded")]
    DepthExceeded { limit: u32 },
    #[error("the solve was cancelled")]
    Cancelled,
}

impl SolveError {
    /// Fatal errors abort the retry ladder instead of advancing it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SolveError::NotAnEquation
                | SolveError::DepthExceeded { .. }
                | SolveError::Cancelled
        )
    }
}

impl From<EngineError> for SolveError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DepthExceeded { limit } => SolveError::DepthExceeded { limit },
            EngineError::Cancelled => SolveError::Cancelled,
            EngineError::PartialIsolation { var } => SolveError::PartialIsolation { var },
            EngineError::UnsupportedFunction(_) => SolveError::UnclassifiedResult,
        }
    }
}
