//! Reporting outcomes.
//!
//! The scheduler forwards every resolved leaf to a [`Reporter`]: exactly one of
//! [`report_pass`](Reporter::report_pass),
//! [`report_failure`](Reporter::report_failure) or
//! [`report_timeout`](Reporter::report_timeout) per executed leaf. Excluded,
//! pending and filtered out leaves are never reported.
//!
//! The scheduler itself returns a [`RunReport`] with the aggregated counters,
//! which doubles as the process exit status through [`Termination`].

use std::{
    process::{ExitCode, Termination},
    time::Duration,
};

use crate::outcome::Outcome;

/// Receiver of leaf outcomes.
pub trait Reporter {
    fn report_pass(&mut self, name: &str);

    fn report_failure(&mut self, name: &str, reason: &str);

    fn report_timeout(&mut self, name: &str, timeout: Duration);

    /// A group level hook (`after`) failed outside of any leaf.
    fn report_hook_failure(&mut self, group: &str, reason: &str) {
        self.report_failure(group, reason);
    }

    /// Whether anything was reported as failed so far.
    fn has_failed(&self) -> bool;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report_pass(&mut self, name: &str) {
        (**self).report_pass(name);
    }

    fn report_failure(&mut self, name: &str, reason: &str) {
        (**self).report_failure(name, reason);
    }

    fn report_timeout(&mut self, name: &str, timeout: Duration) {
        (**self).report_timeout(name, timeout);
    }

    fn report_hook_failure(&mut self, group: &str, reason: &str) {
        (**self).report_hook_failure(group, reason);
    }

    fn has_failed(&self) -> bool {
        (**self).has_failed()
    }
}

/// A [`Reporter`] that keeps everything in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Recorder {
    pub outcomes: Vec<(String, RecordedOutcome)>,
    pub hook_failures: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOutcome {
    Passed,
    Failed(String),
    TimedOut(Duration),
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all reported leaves, in report order.
    pub fn names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RecordedOutcome> {
        self.outcomes
            .iter()
            .find(|(recorded, _)| recorded == name)
            .map(|(_, outcome)| outcome)
    }
}

impl Reporter for Recorder {
    fn report_pass(&mut self, name: &str) {
        self.outcomes.push((name.to_string(), RecordedOutcome::Passed));
    }

    fn report_failure(&mut self, name: &str, reason: &str) {
        self.outcomes
            .push((name.to_string(), RecordedOutcome::Failed(reason.to_string())));
    }

    fn report_timeout(&mut self, name: &str, timeout: Duration) {
        self.outcomes
            .push((name.to_string(), RecordedOutcome::TimedOut(timeout)));
    }

    fn report_hook_failure(&mut self, group: &str, reason: &str) {
        self.hook_failures
            .push((group.to_string(), reason.to_string()));
    }

    fn has_failed(&self) -> bool {
        !self.hook_failures.is_empty()
            || self
                .outcomes
                .iter()
                .any(|(_, outcome)| !matches!(outcome, RecordedOutcome::Passed))
    }
}

/// Aggregated counters of one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
    pub hook_failures: usize,
    pub duration: Duration,
}

impl RunReport {
    pub(crate) fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::TimedOut(_) => self.timed_out += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    /// Number of leaves whose body was scheduled.
    pub fn executed(&self) -> usize {
        self.passed + self.failed + self.timed_out
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.timed_out == 0 && self.hook_failures == 0
    }
}

impl Termination for RunReport {
    fn report(self) -> ExitCode {
        match self.is_success() {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }
}
