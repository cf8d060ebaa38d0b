//! The handles a running leaf talks to.
//!
//! Every hook and body receives a [`Ctx`]. It is the only way for user code to
//! reach the [`ExecutionContext`](crate::execution::ExecutionContext) that is
//! running it: failing the leaf, asserting on values and overriding the
//! leaf's timeout all go through it.
//!
//! Failing is a non-local exit. [`Ctx::fail`] first signals the failure to the
//! execution context and then unwinds the current thread with a private
//! payload, so no further statement of the failing code runs. The unwind is
//! caught at the task boundary and never reaches the scheduler. When called
//! from a thread the body spawned itself, the unwind simply ends that thread.
//!
//! Asynchronous leaves additionally receive a [`Done`], the completion
//! capability they use to report their own finish.

use std::{
    any::Any,
    error::Error,
    fmt::Debug,
    panic,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crossbeam_channel::Sender;

use crate::{
    assertion::Assertion,
    failure::{Failure, describe_reason},
    suite::HookKind,
};

/// Messages from a running task to its execution context.
#[derive(Debug)]
pub(crate) enum Signal {
    /// The task's work returned normally.
    Finished,
    Failed(Failure),
    /// The leaf overrode its timeout, the deadline restarts from now.
    Timeout(Duration),
}

/// What the task is currently executing, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Hook(HookKind),
    Body,
}

/// Unwind payload of [`Ctx::fail`]. The failure itself travels as a [`Signal`].
pub(crate) struct Abort;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the execution of the current leaf.
///
/// `Ctx` is cheap to clone and can be moved into threads spawned by the body.
#[derive(Debug, Clone)]
pub struct Ctx {
    name: Arc<str>,
    timeout: Arc<Mutex<Duration>>,
    phase: Arc<Mutex<Phase>>,
    signals: Sender<Signal>,
}

impl Ctx {
    pub(crate) fn new(
        name: Arc<str>,
        timeout: Arc<Mutex<Duration>>,
        phase: Phase,
        signals: Sender<Signal>,
    ) -> Self {
        Self {
            name,
            timeout,
            phase: Arc::new(Mutex::new(phase)),
            signals,
        }
    }

    /// The fully qualified name of the leaf (or group, for `before` and `after`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fail the current leaf and stop executing the calling code.
    ///
    /// String and error like reasons are reported verbatim, anything else is
    /// reported through its [`Debug`] representation.
    pub fn fail<R: Any + Debug + Send>(&self, reason: R) -> ! {
        self.abort(Failure::Explicit(describe_reason(&reason)))
    }

    /// Fail the current leaf with the [`Display`](std::fmt::Display) message of `err`.
    ///
    /// [`fail`](Self::fail) only recognizes boxed errors, plain error values
    /// passed there are reported through their [`Debug`] representation.
    pub fn fail_error<E: Error>(&self, err: E) -> ! {
        self.abort(Failure::Explicit(err.to_string()))
    }

    /// Bind `value` for a comparison; a failed comparison fails the leaf like [`fail`](Self::fail).
    pub fn assert<T>(&self, value: T) -> Assertion<'_, T> {
        Assertion::new(self, value)
    }

    /// The deadline currently applied to this leaf.
    pub fn timeout(&self) -> Duration {
        *lock(&self.timeout)
    }

    /// Override the timeout of this leaf.
    ///
    /// The deadline restarts from the moment of the call. The override only
    /// applies to the leaf that sets it; the next leaf starts with the
    /// configured default again.
    pub fn set_timeout(&self, timeout: Duration) {
        *lock(&self.timeout) = timeout;
        let _ = self.signals.send(Signal::Timeout(timeout));
    }

    pub(crate) fn abort(&self, failure: Failure) -> ! {
        self.signal_failure(self.attribute(failure));
        panic::resume_unwind(Box::new(Abort))
    }

    pub(crate) fn signal_failure(&self, failure: Failure) {
        // The execution context may already have moved on, the failure is
        // discarded in that case.
        let _ = self.signals.send(Signal::Failed(failure));
    }

    pub(crate) fn attribute(&self, failure: Failure) -> Failure {
        match *lock(&self.phase) {
            Phase::Hook(hook) => failure.in_hook(hook),
            Phase::Body => failure,
        }
    }

    pub(crate) fn enter(&self, phase: Phase) {
        *lock(&self.phase) = phase;
    }

    pub(crate) fn finish(&self) {
        let _ = self.signals.send(Signal::Finished);
    }
}

pub(crate) type Completion = Result<(), String>;

/// The completion capability of an asynchronous leaf.
///
/// Invoking it consumes the handle. It can be cloned to be shared between
/// threads, but only the first invocation counts: a second one before the
/// leaf resolved fails the leaf. If every handle is dropped without being
/// invoked, the leaf fails right away instead of waiting for its deadline.
#[derive(Debug, Clone)]
pub struct Done {
    completion: Sender<Completion>,
}

impl Done {
    pub(crate) fn new(completion: Sender<Completion>) -> Self {
        Self { completion }
    }

    /// Report that the leaf finished successfully.
    pub fn done(self) {
        let _ = self.completion.send(Ok(()));
    }

    /// Report that the leaf finished with a failure.
    ///
    /// The leaf fails with [`Failure::CompletionMisuse`] carrying `reason`.
    /// Unlike [`Ctx::fail`] this does not unwind, the calling code keeps running.
    pub fn fail<R: Any + Debug + Send>(self, reason: R) {
        let _ = self.completion.send(Err(describe_reason(&reason)));
    }
}
