//! A nested `describe`/`it` test engine.
//!
//! Suites are declared as a tree of named groups and leaves through a
//! [`Registrar`](suite::Registrar), then executed depth first by a
//! [`Scheduler`](scheduler::Scheduler). Every leaf runs on its own thread
//! under a deadline and resolves to exactly one [`Outcome`](outcome::Outcome),
//! which is handed to a [`Reporter`](report::Reporter).
//!
//! ```
//! use kispec::prelude::*;
//!
//! let suite = Suite::build(|s| {
//!     s.describe("Math", |s| {
//!         s.it("adds", |ctx| ctx.assert(1 + 1).equal(2));
//!         s.it_async("adds later", |ctx, done| {
//!             ctx.assert(2 + 2).equal(4);
//!             done.done();
//!         });
//!     });
//! })
//! .unwrap();
//!
//! let mut recorder = Recorder::new();
//! let report = suite.run(&RunConfig::default(), &mut recorder);
//! assert_eq!(report.passed, 2);
//! assert!(!recorder.has_failed());
//! ```

pub mod assertion;
pub mod config;
pub mod context;
pub mod execution;
pub mod failure;
pub mod matcher;
pub mod outcome;
pub mod report;
pub mod scheduler;
pub mod suite;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use crate::{
        config::RunConfig,
        context::{Ctx, Done},
        execution::{ExecutionContext, HookChain},
        failure::Failure,
        matcher::Matcher,
        outcome::Outcome,
        report::{RecordedOutcome, Recorder, Reporter, RunReport},
        scheduler::Scheduler,
        suite::{BuildError, HookKind, Registrar, Suite},
    };
}
