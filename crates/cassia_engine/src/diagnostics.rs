//! User-facing diagnostic sink.
//!
//! Distinct from `tracing`: the logger is for developers, this sink feeds
//! the caller's result report. Exploratory attempts run inside a
//! suppression scope so only the attempt that is kept contributes messages.

use serde::Serialize;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The operation failed; the message explains the diagnosis.
    Fatal,
    /// The result stands but carries a caveat.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
}

impl Diagnostic {
    pub fn fatal(text: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Fatal,
            text: text.into(),
        }
    }

    pub fn advisory(text: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Advisory,
            text: text.into(),
        }
    }
}

/// Collecting sink with nested suppression scopes.
#[derive(Debug, Default)]
pub struct Diagnostics {
    kept: Vec<Diagnostic>,
    // One buffer per open suppression scope, innermost last.
    suppressed: SmallVec<[Vec<Diagnostic>; 2]>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match self.suppressed.last_mut() {
            Some(buffer) => buffer.push(diagnostic),
            None => self.kept.push(diagnostic),
        }
    }

    pub fn advisory(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::advisory(text));
    }

    pub fn fatal(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::fatal(text));
    }

    /// Open a scope; everything reported until the matching
    /// [`Diagnostics::end_suppress`] is held back.
    pub fn begin_suppress(&mut self) {
        self.suppressed.push(Vec::new());
    }

    /// Close the innermost scope. With `keep` the held messages flow to
    /// the enclosing scope (or to the kept list); otherwise they are
    /// discarded.
    pub fn end_suppress(&mut self, keep: bool) {
        if let Some(buffer) = self.suppressed.pop() {
            if keep {
                match self.suppressed.last_mut() {
                    Some(parent) => parent.extend(buffer),
                    None => self.kept.extend(buffer),
                }
            }
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.kept
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.kept)
    }
}
