//! Walking a [`Suite`] and running its leaves.
//!
//! The scheduler visits the tree depth first in declaration order and runs one
//! leaf at a time. Group `before` hooks fire lazily, right before the first
//! runnable leaf below them, and `after` hooks fire once all children of the
//! group were processed, but only if the `before` of that group fired.
//! Subtrees without a single runnable leaf are skipped entirely, none of their
//! hooks run.

use std::{slice, time::Instant};

use tracing::{debug, debug_span, trace, warn};

use crate::{
    config::RunConfig,
    execution::{ExecutionContext, HookChain},
    failure::Failure,
    outcome::Outcome,
    report::{Reporter, RunReport},
    suite::{Group, HookKind, Leaf, Node, Suite},
};

/// An open group on the way from the root to the current leaf.
struct Frame<'s> {
    group: &'s Group,
    before_fired: bool,
}

pub struct Scheduler<'c, R> {
    config: &'c RunConfig,
    reporter: R,
    report: RunReport,
}

impl<'c, R: Reporter> Scheduler<'c, R> {
    pub fn new(config: &'c RunConfig, reporter: R) -> Self {
        Self {
            config,
            reporter,
            report: RunReport::default(),
        }
    }

    /// Run every runnable leaf of `suite` and report each outcome.
    pub fn run(mut self, suite: &Suite) -> RunReport {
        let now = Instant::now();
        let mut frames = Vec::new();
        self.visit_group(suite.root(), &mut frames);
        self.report.duration = now.elapsed();

        debug!(
            passed = self.report.passed,
            failed = self.report.failed,
            timed_out = self.report.timed_out,
            skipped = self.report.skipped,
            hook_failures = self.report.hook_failures,
            has_failed = self.reporter.has_failed(),
            duration = ?self.report.duration,
            "run finished"
        );
        self.report
    }

    fn visit_group<'s>(&mut self, group: &'s Group, frames: &mut Vec<Frame<'s>>) {
        if !group.has_runnable(self.config.matcher()) {
            let skipped = group.leaves().count();
            debug!(group = group.full_name(), skipped, "no runnable leaves, skipping group");
            self.report.skipped += skipped;
            return;
        }

        frames.push(Frame {
            group,
            before_fired: false,
        });
        for child in group.children() {
            match child {
                Node::Group(child) => self.visit_group(child, frames),
                Node::Leaf(leaf) => self.visit_leaf(leaf, frames),
            }
        }

        if let Some(frame) = frames.pop()
            && frame.before_fired
        {
            self.fire_after(frame.group);
        }
    }

    fn visit_leaf(&mut self, leaf: &Leaf, frames: &mut [Frame<'_>]) {
        if !leaf.is_runnable(self.config.matcher()) {
            trace!(leaf = leaf.full_name(), mode = ?leaf.mode(), "leaf not runnable");
            self.report.count(&Outcome::Skipped);
            return;
        }

        let span = debug_span!("leaf", name = leaf.full_name());
        let _enter = span.enter();

        let outcome = match self.fire_before(frames) {
            Ok(()) => ExecutionContext::new(leaf.full_name(), self.config)
                .run_leaf(leaf, &hook_chain(frames)),
            Err(failure) => Outcome::Failed(failure),
        };
        self.record(leaf.full_name(), outcome);
    }

    /// Fire every `before` hook not fired yet, outermost first.
    ///
    /// A failure stops the walk. The failed hook counts as fired, deeper ones
    /// stay pending for the next leaf.
    fn fire_before(&self, frames: &mut [Frame<'_>]) -> Result<(), Failure> {
        for frame in frames.iter_mut().filter(|frame| !frame.before_fired) {
            frame.before_fired = true;
            let Some(hook) = frame.group.hooks().get(HookKind::Before) else {
                continue;
            };

            trace!(group = frame.group.full_name(), "firing before hook");
            ExecutionContext::new(frame.group.full_name(), self.config)
                .run_hooks(HookKind::Before, slice::from_ref(hook))?;
        }
        Ok(())
    }

    fn fire_after(&mut self, group: &Group) {
        let Some(hook) = group.hooks().get(HookKind::After) else {
            return;
        };

        trace!(group = group.full_name(), "firing after hook");
        let result = ExecutionContext::new(group.full_name(), self.config)
            .run_hooks(HookKind::After, slice::from_ref(hook));
        if let Err(failure) = result {
            warn!(group = group.full_name(), %failure, "after hook failed");
            self.reporter
                .report_hook_failure(group.full_name(), &failure.to_string());
            self.report.hook_failures += 1;
        }
    }

    fn record(&mut self, name: &str, outcome: Outcome) {
        match (&outcome, outcome.reason()) {
            (Outcome::Skipped, _) => (),
            (Outcome::TimedOut(timeout), _) => {
                debug!(leaf = name, ?timeout, "leaf timed out");
                self.reporter.report_timeout(name, *timeout);
            }
            (_, Some(reason)) => {
                debug!(leaf = name, %reason, "leaf failed");
                self.reporter.report_failure(name, &reason);
            }
            (_, None) => {
                debug!(leaf = name, "leaf passed");
                self.reporter.report_pass(name);
            }
        }
        self.report.count(&outcome);
    }
}

/// Collect the per leaf hooks of all open groups.
fn hook_chain(frames: &[Frame<'_>]) -> HookChain {
    let outer_first = |kind: HookKind| -> Vec<_> {
        frames
            .iter()
            .filter_map(|frame| frame.group.hooks().get(kind).cloned())
            .collect()
    };
    HookChain {
        before_each: outer_first(HookKind::BeforeEach),
        just_before_each: outer_first(HookKind::JustBeforeEach),
        after_each: frames
            .iter()
            .rev()
            .filter_map(|frame| frame.group.hooks().get(HookKind::AfterEach).cloned())
            .collect(),
    }
}
