use thiserror::Error;

/// Failures the evaluation layer can hit while rewriting.
///
/// `DepthExceeded` and `Cancelled` come from the budget and are not
/// diagnoses of the input; the solver treats them differently from the
/// structural failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("recursion depth limit of {limit} exceeded")]
    DepthExceeded { limit: u32 },
    #[error("operation cancelled")]
    Cancelled,
    #[error("cannot fully isolate '{var}'")]
    PartialIsolation { var: String },
    #[error("cannot invert function '{0}'")]
    UnsupportedFunction(String),
}
