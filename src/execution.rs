//! Per leaf execution.
//!
//! An [`ExecutionContext`] runs exactly one leaf (or one group hook) to a
//! definitive [`Outcome`]. Every unit of work, synchronous or not, runs on its
//! own thread while the execution context waits for the first of three
//! signals:
//!
//! - the task finished (for asynchronous leaves: the [`Done`] capability was
//!   invoked),
//! - the task failed, through [`Ctx::fail`], a failed assertion or a plain panic,
//! - the deadline elapsed.
//!
//! A task that loses the race is abandoned, never joined or killed. Anything
//! it sends afterwards lands in a channel nobody listens to anymore, so it can
//! not change an outcome that was already resolved.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, at, never, select, unbounded};
use tracing::{debug, trace, warn};

use crate::{
    config::RunConfig,
    context::{Abort, Completion, Ctx, Done, Phase, Signal, lock},
    failure::{Failure, payload_as_string},
    outcome::Outcome,
    suite::{Body, Hook, HookKind, Leaf},
};

/// The hooks surrounding one leaf, already in execution order.
#[derive(Default, Clone)]
pub struct HookChain {
    /// `before_each` hooks, outermost group first.
    pub before_each: Vec<Hook>,
    /// `just_before_each` hooks, outermost group first.
    pub just_before_each: Vec<Hook>,
    /// `after_each` hooks, innermost group first.
    pub after_each: Vec<Hook>,
}

impl HookChain {
    fn setup(&self) -> Vec<(HookKind, Hook)> {
        let before_each = self
            .before_each
            .iter()
            .map(|hook| (HookKind::BeforeEach, Arc::clone(hook)));
        let just_before_each = self
            .just_before_each
            .iter()
            .map(|hook| (HookKind::JustBeforeEach, Arc::clone(hook)));
        before_each.chain(just_before_each).collect()
    }
}

/// Runs a single leaf or hook under a deadline.
///
/// The timeout override a leaf sets through [`Ctx::set_timeout`] lives here,
/// so it never outlives the leaf that set it.
#[derive(Debug)]
pub struct ExecutionContext {
    name: Arc<str>,
    timeout: Arc<Mutex<Duration>>,
}

impl ExecutionContext {
    pub fn new(name: impl Into<Arc<str>>, config: &RunConfig) -> Self {
        Self {
            name: name.into(),
            timeout: Arc::new(Mutex::new(config.default_timeout())),
        }
    }

    /// The deadline currently applied, including any override.
    pub fn timeout(&self) -> Duration {
        *lock(&self.timeout)
    }

    /// Run `leaf` surrounded by `chain`.
    ///
    /// The setup hooks and the body run as one task. The `after_each` hooks run
    /// as a second task once the body resolved, whatever its outcome. A teardown
    /// failure only turns a passing leaf into a failing one.
    pub fn run_leaf(&self, leaf: &Leaf, chain: &HookChain) -> Outcome {
        let Some(body) = leaf.body() else {
            return Outcome::Skipped;
        };

        let setup = chain.setup();
        let outcome = match body {
            Body::Sync(body) => {
                let body = Arc::clone(body);
                match self.spawn(Phase::Body, move |ctx| {
                    run_setup(ctx, &setup);
                    body(ctx);
                }) {
                    Ok(signals) => self.race(signals, None),
                    Err(failure) => Outcome::Failed(failure),
                }
            }
            Body::Async(body) => {
                let body = Arc::clone(body);
                let (completion, completions) = unbounded();
                let done = Done::new(completion);
                match self.spawn(Phase::Body, move |ctx| {
                    run_setup(ctx, &setup);
                    body(ctx, done);
                }) {
                    Ok(signals) => self.race(signals, Some(completions)),
                    Err(failure) => Outcome::Failed(failure),
                }
            }
        };

        match (outcome, self.run_hooks(HookKind::AfterEach, &chain.after_each)) {
            (outcome, Ok(())) => outcome,
            (Outcome::Passed, Err(failure)) => Outcome::Failed(failure),
            (outcome, Err(failure)) => {
                warn!(leaf = %self.name, %failure, "teardown failure masked by earlier outcome");
                outcome
            }
        }
    }

    /// Run `hooks` in order as one task.
    ///
    /// Failures and timeouts are attributed to `kind`.
    pub fn run_hooks(&self, kind: HookKind, hooks: &[Hook]) -> Result<(), Failure> {
        if hooks.is_empty() {
            return Ok(());
        }

        let hooks = hooks.to_vec();
        let signals = self.spawn(Phase::Hook(kind), move |ctx| {
            for hook in &hooks {
                trace!(task = ctx.name(), hook = %kind, "firing hook");
                hook(ctx);
            }
        })?;

        match self.race(signals, None) {
            Outcome::Passed | Outcome::Skipped => Ok(()),
            Outcome::Failed(failure) => Err(failure.in_hook(kind)),
            Outcome::TimedOut(timeout) => Err(Failure::TimeoutExceeded(timeout).in_hook(kind)),
        }
    }

    fn spawn<W>(&self, phase: Phase, work: W) -> Result<Receiver<Signal>, Failure>
    where
        W: FnOnce(&Ctx) + Send + 'static,
    {
        let (tx, signals) = unbounded();
        let ctx = Ctx::new(Arc::clone(&self.name), Arc::clone(&self.timeout), phase, tx);

        let spawned = thread::Builder::new()
            .name(format!("kispec: {}", self.name))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| work(&ctx)));
                match result {
                    Ok(()) => ctx.finish(),
                    // The failure was already signaled before unwinding.
                    Err(payload) if payload.is::<Abort>() => (),
                    Err(payload) => {
                        let failure = ctx.attribute(Failure::Panicked(payload_as_string(payload)));
                        ctx.signal_failure(failure);
                    }
                }
            });

        match spawned {
            Ok(_) => {
                trace!(task = %self.name, ?phase, "task spawned");
                Ok(signals)
            }
            Err(err) => {
                warn!(task = %self.name, %err, "could not spawn task");
                Err(Failure::Spawn(err.to_string()))
            }
        }
    }

    fn race(
        &self,
        signals: Receiver<Signal>,
        completions: Option<Receiver<Completion>>,
    ) -> Outcome {
        let asynchronous = completions.is_some();
        let mut signals = signals;
        let mut completions = completions.unwrap_or_else(never);
        let mut completed = false;
        // The task returned or is gone, it can not signal a failure of its own anymore.
        let mut task_ended = false;
        let mut done_dropped = false;
        let mut deadline = deadline_after(self.timeout());

        loop {
            let event = select! {
                recv(signals) -> signal => Event::Signal(signal.ok()),
                recv(completions) -> completion => Event::Completion(completion.ok()),
                recv(deadline.map(at).unwrap_or_else(never)) -> _ => Event::Deadline,
            };

            match event {
                Event::Signal(Some(Signal::Finished)) if !asynchronous => return Outcome::Passed,
                Event::Signal(Some(Signal::Finished)) if done_dropped => {
                    return dropped_done(&signals);
                }
                Event::Signal(Some(Signal::Finished)) => {
                    trace!(leaf = %self.name, "body returned, awaiting completion");
                    task_ended = true;
                }
                Event::Signal(Some(Signal::Failed(failure))) => return Outcome::Failed(failure),
                Event::Signal(Some(Signal::Timeout(timeout))) => {
                    trace!(leaf = %self.name, ?timeout, "deadline reset");
                    deadline = deadline_after(timeout);
                }
                Event::Signal(None) if done_dropped => return dropped_done(&signals),
                // Every handle to the task is gone, only the other arms can resolve now.
                Event::Signal(None) => {
                    signals = never();
                    task_ended = true;
                }

                Event::Completion(Some(_)) if completed => {
                    return Outcome::Failed(Failure::CompletionMisuse(String::from(
                        "done invoked more than once",
                    )));
                }
                Event::Completion(Some(Ok(()))) => completed = true,
                Event::Completion(Some(Err(reason))) => {
                    return Outcome::Failed(Failure::CompletionMisuse(reason));
                }
                Event::Completion(None) if completed => {
                    return match pending_failure(&signals) {
                        Some(failure) => Outcome::Failed(failure),
                        None => Outcome::Passed,
                    };
                }
                Event::Completion(None) if task_ended => return dropped_done(&signals),
                // A panicking body drops its `Done` before the panic is signaled.
                Event::Completion(None) => {
                    completions = never();
                    done_dropped = true;
                }

                Event::Deadline if completed => return Outcome::Passed,
                Event::Deadline => {
                    let timeout = self.timeout();
                    debug!(task = %self.name, ?timeout, "deadline elapsed, abandoning task");
                    return Outcome::TimedOut(timeout);
                }
            }
        }
    }
}

enum Event {
    Signal(Option<Signal>),
    Completion(Option<Completion>),
    Deadline,
}

/// `None` when the deadline lies too far in the future to be represented.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn run_setup(ctx: &Ctx, setup: &[(HookKind, Hook)]) {
    for (kind, hook) in setup {
        trace!(leaf = ctx.name(), hook = %kind, "firing hook");
        ctx.enter(Phase::Hook(*kind));
        hook(ctx);
    }
    ctx.enter(Phase::Body);
}

fn dropped_done(signals: &Receiver<Signal>) -> Outcome {
    match pending_failure(signals) {
        Some(failure) => Outcome::Failed(failure),
        None => Outcome::Failed(Failure::CompletionMisuse(String::from(
            "done dropped without being invoked",
        ))),
    }
}

/// A failure that was signaled but not yet received, it takes precedence over
/// the completion capability being dropped by the same unwind.
fn pending_failure(signals: &Receiver<Signal>) -> Option<Failure> {
    signals.try_iter().find_map(|signal| match signal {
        Signal::Failed(failure) => Some(failure),
        _ => None,
    })
}
