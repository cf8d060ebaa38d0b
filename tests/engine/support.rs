use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use kispec::prelude::*;

pub fn config() -> RunConfig {
    RunConfig::default().with_timeout(Duration::from_secs(2))
}

pub fn run(suite: &Suite, config: &RunConfig) -> (RunReport, Recorder) {
    let mut recorder = Recorder::new();
    let report = suite.run(config, &mut recorder);
    (report, recorder)
}

pub fn failed(reason: &str) -> RecordedOutcome {
    RecordedOutcome::Failed(reason.to_string())
}

#[derive(Debug, Default, Clone)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, step: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(step.into());
    }

    pub fn step(&self, step: &'static str) -> impl Fn(&Ctx) + Send + Sync + 'static {
        let trace = self.clone();
        move |_| trace.push(step)
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
