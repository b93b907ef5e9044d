//! Depth budget and cooperative cancellation.
//!
//! Every recursive entry point takes a [`SolveBudget`] and calls
//! [`SolveBudget::descend`] before recursing. Exhaustion and cancellation
//! surface as typed [`EngineError`] values, never panics.

use crate::error::EngineError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle that lets a caller abort a running solve.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl PartialEq for CancelToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Remaining recursion allowance for one solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveBudget {
    limit: u32,
    remaining: u32,
    token: CancelToken,
}

impl SolveBudget {
    pub const DEFAULT_DEPTH: u32 = 64;

    pub fn new(max_depth: u32) -> Self {
        SolveBudget {
            limit: max_depth,
            remaining: max_depth,
            token: CancelToken::new(),
        }
    }

    pub fn with_token(max_depth: u32, token: CancelToken) -> Self {
        SolveBudget {
            limit: max_depth,
            remaining: max_depth,
            token,
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// One level deeper. Checks cancellation first so an aborted solve
    /// stops at the next recursion boundary.
    pub fn descend(&self) -> Result<SolveBudget, EngineError> {
        self.check_cancelled()?;
        if self.remaining == 0 {
            return Err(EngineError::DepthExceeded { limit: self.limit });
        }
        Ok(SolveBudget {
            limit: self.limit,
            remaining: self.remaining - 1,
            token: self.token.clone(),
        })
    }

    pub fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descend_counts_down_to_error() {
        let budget = SolveBudget::new(2);
        let b1 = budget.descend().unwrap();
        let b2 = b1.descend().unwrap();
        assert_eq!(
            b2.descend(),
            Err(EngineError::DepthExceeded { limit: 2 })
        );
    }

    #[test]
    fn cancellation_wins_over_depth() {
        let token = CancelToken::new();
        let budget = SolveBudget::with_token(8, token.clone());
        assert!(budget.descend().is_ok());
        token.cancel();
        assert_eq!(budget.descend(), Err(EngineError::Cancelled));
    }
}
