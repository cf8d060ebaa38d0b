use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    config::RunConfig,
    context::{Ctx, lock},
    report::{Recorder, RunReport},
    suite::{Hook, Suite},
};

/// A config with a timeout generous enough for loaded CI machines.
pub fn config() -> RunConfig {
    RunConfig::default().with_timeout(Duration::from_secs(2))
}

pub fn hook(f: impl Fn(&Ctx) + Send + Sync + 'static) -> Hook {
    Arc::new(f)
}

/// Run `suite` into a fresh [`Recorder`].
pub fn run(suite: &Suite, config: &RunConfig) -> (RunReport, Recorder) {
    let mut recorder = Recorder::new();
    let report = suite.run(config, &mut recorder);
    (report, recorder)
}

/// Shared, ordered log of executed steps.
#[derive(Debug, Default, Clone)]
pub struct Trace(Arc<Mutex<Vec<&'static str>>>);

impl Trace {
    pub fn push(&self, step: &'static str) {
        lock(&self.0).push(step);
    }

    /// A hook or body recording `step` when called.
    pub fn step(&self, step: &'static str) -> impl Fn(&Ctx) + Send + Sync + 'static {
        let trace = self.clone();
        move |_| trace.push(step)
    }

    pub fn hook(&self, step: &'static str) -> Hook {
        Arc::new(self.step(step))
    }

    pub fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *lock(&self.0))
    }
}
