use std::{thread, time::Duration};

use kispec::prelude::*;
use pretty_assertions::assert_eq;

use crate::support::*;

#[test]
#[cfg_attr(all(ci, target_os = "macos"), ignore = "too slow on macos")]
fn slow_leaves_time_out() {
    let suite = Suite::build(|s| {
        s.describe("Timeout", |s| {
            s.it("sync", |_| thread::sleep(Duration::from_millis(300)));
            s.it_async("async", |_, done| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(300));
                    done.done();
                });
            });
        });
    })
    .unwrap();

    let config = RunConfig::default().with_timeout(Duration::from_millis(20));
    let (report, recorder) = run(&suite, &config);

    assert_eq!(
        recorder.outcomes,
        [
            (
                String::from("Timeout/sync"),
                RecordedOutcome::TimedOut(Duration::from_millis(20))
            ),
            (
                String::from("Timeout/async"),
                RecordedOutcome::TimedOut(Duration::from_millis(20))
            ),
        ]
    );
    assert_eq!(report.timed_out, 2);
    assert!(!report.is_success());
}

#[test]
#[cfg_attr(all(ci, target_os = "macos"), ignore = "too slow on macos")]
fn override_applies_to_one_leaf_only() {
    let suite = Suite::build(|s| {
        s.describe("Override", |s| {
            s.it("slow but allowed", |ctx| {
                ctx.set_timeout(Duration::from_secs(2));
                thread::sleep(Duration::from_millis(100));
            });
            s.it("back to default", |_| thread::sleep(Duration::from_millis(300)));
        });
    })
    .unwrap();

    let config = RunConfig::default().with_timeout(Duration::from_millis(20));
    let (_, recorder) = run(&suite, &config);

    assert_eq!(
        recorder.outcomes,
        [
            (String::from("Override/slow but allowed"), RecordedOutcome::Passed),
            (
                String::from("Override/back to default"),
                RecordedOutcome::TimedOut(Duration::from_millis(20))
            ),
        ]
    );
}

#[test]
fn skipped_leaves_are_not_timed() {
    let suite = Suite::build(|s| {
        s.describe("Skip", |s| {
            s.skip().it("would time out", |_| thread::sleep(Duration::from_secs(5)));
            s.it("fast", |_| {});
        });
    })
    .unwrap();

    let config = RunConfig::default().with_timeout(Duration::from_millis(50));
    let (report, recorder) = run(&suite, &config);

    assert_eq!(recorder.names(), ["Skip/fast"]);
    assert_eq!(report.skipped, 1);
    assert!(report.is_success());
}
