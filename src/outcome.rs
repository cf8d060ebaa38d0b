use std::time::Duration;

use crate::failure::Failure;

/// The resolution of a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Outcome {
    Passed,
    Failed(Failure),
    /// The leaf did not resolve within the contained deadline.
    TimedOut(Duration),
    /// The leaf was excluded, pending or filtered out and never ran.
    Skipped,
}

impl Outcome {
    /// Human readable reason for bad outcomes.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Passed | Outcome::Skipped => None,
            Outcome::Failed(failure) => Some(failure.to_string()),
            Outcome::TimedOut(timeout) => Some(format!("timed out after {timeout:?}")),
        }
    }
}
