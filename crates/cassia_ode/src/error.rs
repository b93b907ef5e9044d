//! ODE failure taxonomy.

use cassia_ast::Equation;
use cassia_engine::EngineError;
use thiserror::Error;

/// Why a differential-equation solve failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdeError {
    #[error("the equation contains no derivative of '{var}'")]
    NotAnOde { var: String },
    #[error("derivatives of order two or higher are not supported")]
    HigherOrder,
    #[error("unable to solve differential equation")]
    ShapeNotRecognized {
        /// The input equation with the unresolved derivative term held,
        /// so the caller sees exactly what remains.
        remaining: Equation,
    },
    #[error("a required integration step failed")]
    IntegrationFailed,
    #[error("the solution is inconsistent with the supplied initial condition")]
    InitialConditionInconsistent,
    #[error("recursion depth limit of {limit} exceeded")]
    DepthExceeded { limit: u32 },
    #[error("the solve was cancelled")]
    Cancelled,
}

impl From<EngineError> for OdeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DepthExceeded { limit } => OdeError::DepthExceeded { limit },
            EngineError::Cancelled => OdeError::Cancelled,
            EngineError::PartialIsolation { .. } | EngineError::UnsupportedFunction(_) => {
                OdeError::IntegrationFailed
            }
        }
    }
}
