use kispec::prelude::*;
use pretty_assertions::assert_eq;

use crate::support::*;

#[test]
fn just_before_each_runs_after_all_before_each() {
    let trace = Trace::default();
    let t = trace.clone();
    let suite = Suite::build(move |s| {
        s.describe("Outer", |s| {
            s.before(t.step("outer-before"));
            s.before_each(t.step("outer-beforeEach"));
            s.just_before_each(t.step("outer-justBeforeEach"));
            s.it("leaf", t.step("outer-leaf"));

            s.describe("Nested", |s| {
                s.before_each(t.step("nested-beforeEach"));
                s.just_before_each(t.step("nested-justBeforeEach"));
                s.it("leaf", t.step("nested-leaf"));
            });
        });
    })
    .unwrap();

    let (report, _) = run(&suite, &config());

    assert_eq!(
        trace.take(),
        [
            "outer-before",
            "outer-beforeEach",
            "outer-justBeforeEach",
            "outer-leaf",
            "outer-beforeEach",
            "nested-beforeEach",
            "outer-justBeforeEach",
            "nested-justBeforeEach",
            "nested-leaf",
        ]
    );
    assert_eq!(report.passed, 2);
}

#[test]
fn hooks_of_empty_groups_do_not_run() {
    let trace = Trace::default();
    let t = trace.clone();
    let suite = Suite::build(move |s| {
        s.describe("Numbers", |s| {
            s.before(t.step("numbers-before"));
            s.after(t.step("numbers-after"));
            s.describe("Letters", |s| {
                s.before(t.step("letters-before"));
                s.before_each(t.step("letters-beforeEach"));
                s.after_each(t.step("letters-afterEach"));
                s.after(t.step("letters-after"));
            });
            s.it("runs", t.step("leaf"));
        });
    })
    .unwrap();

    run(&suite, &config());

    assert_eq!(trace.take(), ["numbers-before", "leaf", "numbers-after"]);
}

#[test]
fn after_each_runs_innermost_first_even_on_failure() {
    let trace = Trace::default();
    let t = trace.clone();
    let suite = Suite::build(move |s| {
        s.describe("Outer", |s| {
            s.after_each(t.step("outer-afterEach"));
            s.after(t.step("outer-after"));
            s.describe("Inner", |s| {
                s.after_each(t.step("inner-afterEach"));
                s.it("fails", |ctx| ctx.fail("body failed"));
            });
        });
    })
    .unwrap();

    let (report, recorder) = run(&suite, &config());

    assert_eq!(
        trace.take(),
        ["inner-afterEach", "outer-afterEach", "outer-after"]
    );
    assert_eq!(recorder.get("Outer/Inner/fails"), Some(&failed("body failed")));
    assert_eq!(report.failed, 1);
}

#[test]
fn failing_before_each_skips_the_body() {
    let trace = Trace::default();
    let t = trace.clone();
    let suite = Suite::build(move |s| {
        s.describe("Setup", |s| {
            s.before_each(|ctx| ctx.assert(ctx.name()).equal("Setup/second"));
            s.it("first", t.step("first"));
            s.it("second", t.step("second"));
        });
    })
    .unwrap();

    let (_, recorder) = run(&suite, &config());

    assert_eq!(trace.take(), ["second"]);
    assert_eq!(
        recorder.outcomes,
        [
            (
                String::from("Setup/first"),
                failed(r#"before_each hook failed: "Setup/first" does not equal "Setup/second""#)
            ),
            (String::from("Setup/second"), RecordedOutcome::Passed),
        ]
    );
}

#[test]
fn failing_after_fails_the_run() {
    let suite = Suite::build(|s| {
        s.describe("Teardown", |s| {
            s.after(|ctx| ctx.fail("could not clean up"));
            s.it("passes", |_| {});
        });
    })
    .unwrap();

    let (report, recorder) = run(&suite, &config());

    assert_eq!(recorder.get("Teardown/passes"), Some(&RecordedOutcome::Passed));
    assert_eq!(
        recorder.hook_failures,
        [(
            String::from("Teardown"),
            String::from("after hook failed: could not clean up")
        )]
    );
    assert!(recorder.has_failed());
    assert!(!report.is_success());
}
