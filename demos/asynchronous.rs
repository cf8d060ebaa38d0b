use std::{thread, time::Duration};

use kispec::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<RunReport, BuildError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("kispec=debug"))
        .compact()
        .init();

    let suite = Suite::build(|s| {
        s.describe("Asynchronous", |s| {
            s.it_async("finishes from another thread", |_, done| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    done.done();
                });
            });

            s.it_async("asserts from another thread", |ctx, done| {
                let ctx = ctx.clone();
                thread::spawn(move || {
                    ctx.assert(6 * 7).equal(42);
                    done.done();
                });
            });

            s.it_async("reports a failure through done", |_, done| {
                done.fail("expected to fail");
            });

            s.skip().it_async("never runs", |_, done| done.done());
        });
    })?;

    let config = RunConfig::default().with_timeout(Duration::from_millis(500));
    let mut recorder = Recorder::new();
    let report = suite.run(&config, &mut recorder);

    for (name, outcome) in &recorder.outcomes {
        println!("{name}: {outcome:?}");
    }
    Ok(report)
}
