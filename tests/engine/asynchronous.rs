use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use kispec::prelude::*;
use pretty_assertions::assert_eq;

use crate::support::*;

#[test]
fn async_suite() {
    let suite = Suite::build(|s| {
        s.describe("Async", |s| {
            s.it_async("completes later", |_, done| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    done.done();
                });
            });
            s.it_async("completes with a reason", |_, done| {
                thread::spawn(move || done.fail("Error"));
            });
            s.it_async("completes twice", |_, done| {
                let again = done.clone();
                done.done();
                again.done();
            });
            s.it_async("asserts in a task", |ctx, done| {
                let ctx = ctx.clone();
                thread::spawn(move || {
                    ctx.assert(1 + 1).equal(2);
                    done.done();
                });
            });
        });
    })
    .unwrap();

    let (report, recorder) = run(&suite, &config());

    assert_eq!(
        recorder.outcomes,
        [
            (String::from("Async/completes later"), RecordedOutcome::Passed),
            (String::from("Async/completes with a reason"), failed("Error")),
            (
                String::from("Async/completes twice"),
                failed("done invoked more than once")
            ),
            (String::from("Async/asserts in a task"), RecordedOutcome::Passed),
        ]
    );
    assert_eq!((report.passed, report.failed), (2, 2));
}

#[test]
#[allow(unreachable_code)]
fn fail_inside_a_task_aborts_immediately() {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reached);
    let suite = Suite::build(move |s| {
        s.describe("Async", |s| {
            s.it_async("fails", move |ctx, done| {
                let ctx = ctx.clone();
                let flag = Arc::clone(&flag);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10));
                    ctx.fail("Something");
                    flag.store(true, Ordering::SeqCst);
                    done.done();
                });
            });
        });
    })
    .unwrap();

    let (_, recorder) = run(&suite, &config());

    assert_eq!(recorder.get("Async/fails"), Some(&failed("Something")));
    thread::sleep(Duration::from_millis(50));
    assert!(!reached.load(Ordering::SeqCst));
}

#[test]
fn dropping_done_fails_the_leaf() {
    let suite = Suite::build(|s| {
        s.describe("Async", |s| s.it_async("forgets", |_, done| drop(done)));
    })
    .unwrap();

    let (_, recorder) = run(&suite, &config());

    assert_eq!(
        recorder.get("Async/forgets"),
        Some(&failed("done dropped without being invoked"))
    );
}
