//! Failure reasons for a single leaf.
//!
//! Every way a leaf (or one of the hooks in its chain) can go wrong is a
//! [`Failure`]. Failures are always scoped to exactly one leaf: they resolve
//! that leaf's [`Outcome`](crate::outcome::Outcome) and never escape the
//! [`ExecutionContext`](crate::execution::ExecutionContext) that produced them.

use std::{any::Any, borrow::Cow, error::Error, fmt::Debug, time::Duration};

use crate::suite::HookKind;

/// Why a leaf failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Failure {
    /// A comparison made through [`Assertion`](crate::assertion::Assertion) did not hold.
    #[error("{0}")]
    AssertionMismatch(String),

    /// [`Ctx::fail`](crate::context::Ctx::fail) or
    /// [`Ctx::fail_error`](crate::context::Ctx::fail_error) was called.
    #[error("{0}")]
    Explicit(String),

    /// The body panicked without going through the failure signal.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The completion capability of an asynchronous leaf was invoked more than
    /// once, dropped without being invoked, or invoked with a failure through
    /// [`Done::fail`](crate::context::Done::fail).
    #[error("{0}")]
    CompletionMisuse(String),

    /// A hook did not finish within its deadline.
    #[error("timed out after {0:?}")]
    TimeoutExceeded(Duration),

    /// The failure happened inside a hook of the leaf's chain.
    #[error("{hook} hook failed: {reason}")]
    Hook { hook: HookKind, reason: Box<Failure> },

    /// The task running the leaf could not be started.
    #[error("could not spawn task: {0}")]
    Spawn(String),
}

impl Failure {
    /// Wrap this failure as coming from `hook`.
    ///
    /// Failures that are already attributed to a hook are kept as they are.
    pub fn in_hook(self, hook: HookKind) -> Self {
        match self {
            failure @ Failure::Hook { .. } => failure,
            failure => Failure::Hook {
                hook,
                reason: Box::new(failure),
            },
        }
    }
}

/// Turn an arbitrary failure value into a human readable reason.
///
/// String and error like values are used verbatim, everything else is
/// rendered through its [`Debug`] representation.
pub fn describe_reason<R: Any + Debug>(reason: &R) -> String {
    let any = reason as &dyn Any;
    if let Some(s) = any.downcast_ref::<&'static str>() {
        return s.to_string();
    }
    if let Some(s) = any.downcast_ref::<String>() {
        return s.clone();
    }
    if let Some(s) = any.downcast_ref::<Cow<'static, str>>() {
        return s.to_string();
    }
    if let Some(failure) = any.downcast_ref::<Failure>() {
        return failure.to_string();
    }
    if let Some(err) = any.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return err.to_string();
    }
    if let Some(err) = any.downcast_ref::<Box<dyn Error>>() {
        return err.to_string();
    }
    format!("{reason:?}")
}

/// Convert a panic payload into a string.
///
/// This matches the common payload types produced by `panic!` (`&'static str` and `String`).
/// Other payload types are formatted as a generic placeholder.
pub fn payload_as_string(payload: Box<dyn Any + Send + 'static>) -> String {
    payload
        .downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|payload| payload.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}
