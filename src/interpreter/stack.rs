//! Recursion budget and suspended evaluation steps
//!
//! Guarded steps spend one unit of a per-bounce budget. Once it is spent the
//! step returns [`Outcome::Suspended`] with a [`Continuation`] instead of
//! recursing further; the trampoline resets the budget and resumes it from a
//! shallow native stack.

use std::fmt;

use crate::diagnostics::Span;

use super::error::RuntimeError;
use super::value::Value;
use super::Runtime;

/// Result of driving evaluation as far as the budget allows
pub enum Outcome {
    Done(Value),
    Suspended(Continuation),
    /// Stopped by the debugger before the statement at the span
    Paused(Span, Continuation),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Outcome::Suspended(_) => f.write_str("Suspended(..)"),
            Outcome::Paused(span, _) => f.debug_tuple("Paused").field(span).finish(),
        }
    }
}

pub type Step = Result<Outcome, RuntimeError>;

type Resume = Box<dyn FnOnce(&mut Runtime<'_>) -> Step>;

/// The rest of an evaluation, captured when the budget ran out
pub struct Continuation(Resume);

impl Continuation {
    pub fn new<F>(resume: F) -> Self
    where
        F: FnOnce(&mut Runtime<'_>) -> Step + 'static,
    {
        Self(Box::new(resume))
    }

    pub fn resume(self, runtime: &mut Runtime<'_>) -> Step {
        (self.0)(runtime)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation(..)")
    }
}

/// Per-bounce budget of guarded steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackGuard {
    remaining: i64,
    initial: usize,
    peak: usize,
}

impl Default for StackGuard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUDGET)
    }
}

impl StackGuard {
    pub const DEFAULT_BUDGET: usize = 200;

    pub fn new(budget: usize) -> Self {
        Self {
            remaining: budget as i64,
            initial: budget,
            peak: 0,
        }
    }

    /// Spend one unit. Returns `false` once the budget is overdrawn: exactly
    /// `budget` calls succeed between resets.
    pub fn guard(&mut self) -> bool {
        self.remaining -= 1;
        let used = (self.initial as i64 - self.remaining) as usize;
        self.peak = self.peak.max(used);
        self.remaining >= 0
    }

    pub fn reset(&mut self) {
        self.remaining = self.initial as i64;
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn budget(&self) -> usize {
        self.initial
    }

    /// Highest number of units spent within a single bounce
    pub fn peak_usage(&self) -> usize {
        self.peak
    }
}
