use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expectation {
    Exactly(u64),
    AtLeast(u64),
    Present,
}

impl Expectation {
    #[must_use]
    pub const fn admits(self, observed: Observed) -> bool {
        match (self, observed) {
            (Expectation::Exactly(expected), Observed::Count(count)) => expected == count,
            (Expectation::AtLeast(minimum), Observed::Count(count)) => count >= minimum,
            (Expectation::Present, Observed::Count(_)) => true,
            (
                Expectation::Exactly(_) | Expectation::AtLeast(_) | Expectation::Present,
                Observed::Missing,
            ) => false,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Exactly(value) => write!(f, "exactly {}", value),
            Expectation::AtLeast(value) => write!(f, "at least {}", value),
            Expectation::Present => f.write_str("present"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Observed {
    Count(u64),
    Missing,
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::Count(value) => write!(f, "{}", value),
            Observed::Missing => f.write_str("missing"),
        }
    }
}

/// The remote environment is not in the baseline state the benchmark needs.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("Precondition '{assertion}' violated: expected {expected}, observed {observed}")]
pub struct PreconditionViolation {
    pub assertion: String,
    pub expected: Expectation,
    pub observed: Observed,
}
