//! Value assertions.
//!
//! An [`Assertion`] binds a value to the [`Ctx`] of the running leaf. When a
//! comparison does not hold, the leaf fails with a
//! [`Failure::AssertionMismatch`] exactly like an explicit
//! [`Ctx::fail`] would, so nothing after the failed assertion runs.

use std::fmt::Debug;

use crate::{context::Ctx, failure::Failure};

#[derive(Debug)]
#[must_use = "an assertion does nothing until a comparison is called"]
pub struct Assertion<'c, T> {
    ctx: &'c Ctx,
    value: T,
}

impl<'c, T> Assertion<'c, T> {
    pub(crate) fn new(ctx: &'c Ctx, value: T) -> Self {
        Self { ctx, value }
    }

    fn mismatch(&self, message: String) -> ! {
        self.ctx.abort(Failure::AssertionMismatch(message))
    }
}

impl<T: Debug> Assertion<'_, T> {
    pub fn equal<U: Debug>(self, expected: U)
    where
        T: PartialEq<U>,
    {
        if self.value != expected {
            self.mismatch(format!("{:?} does not equal {expected:?}", self.value));
        }
    }

    pub fn not_equal<U: Debug>(self, unexpected: U)
    where
        T: PartialEq<U>,
    {
        if self.value == unexpected {
            self.mismatch(format!("{:?} is equal to {unexpected:?}", self.value));
        }
    }
}

impl Assertion<'_, bool> {
    pub fn is_true(self) {
        if !self.value {
            self.mismatch(String::from("false expected to be true"));
        }
    }

    pub fn is_false(self) {
        if self.value {
            self.mismatch(String::from("true expected to be false"));
        }
    }
}

impl<V: Debug> Assertion<'_, Option<V>> {
    pub fn is_some(self) {
        if self.value.is_none() {
            self.mismatch(String::from("None expected to be Some"));
        }
    }

    pub fn is_none(self) {
        if let Some(value) = &self.value {
            self.mismatch(format!("Some({value:?}) expected to be None"));
        }
    }
}
