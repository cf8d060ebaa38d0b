use std::{
    io::{self, Stdout, Write},
    process::ExitCode,
    time::Duration,
};

use kispec::prelude::*;
use tracing_subscriber::EnvFilter;

struct ConsoleReporter {
    out: Stdout,
    failed: bool,
}

impl ConsoleReporter {
    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        let _ = writeln!(self.out, "{line}");
    }
}

impl Reporter for ConsoleReporter {
    fn report_pass(&mut self, name: &str) {
        self.line(format_args!("ok      {name}"));
    }

    fn report_failure(&mut self, name: &str, reason: &str) {
        self.failed = true;
        self.line(format_args!("FAILED  {name}: {reason}"));
    }

    fn report_timeout(&mut self, name: &str, timeout: Duration) {
        self.failed = true;
        self.line(format_args!("TIMEOUT {name} after {timeout:?}"));
    }

    fn has_failed(&self) -> bool {
        self.failed
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .compact()
        .init();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let suite = Suite::build(|s| {
        s.describe("Numbers", |s| {
            s.before_each(|ctx| ctx.assert(ctx.name().starts_with("Numbers/")).is_true());

            s.it("adds", |ctx| ctx.assert(1 + 1).equal(2));
            s.it("compares", |ctx| ctx.assert(2).not_equal(3));
            s.it_pending("divides by zero");

            s.describe("Parsing", |s| {
                s.it("parses integers", |ctx| ctx.assert("42".parse::<u8>().ok()).equal(Some(42)));
                s.xit("parses floats", |ctx| ctx.fail("not supported yet"));
            });
        });

        s.describe("Slow", |s| {
            s.it("is granted more time", |ctx| {
                ctx.set_timeout(Duration::from_secs(1));
                std::thread::sleep(Duration::from_millis(50));
            });
        });
    });

    let suite = match suite {
        Ok(suite) => suite,
        Err(err) => {
            eprintln!("invalid suite: {err}");
            return ExitCode::FAILURE;
        }
    };

    let report = suite.run(
        &config,
        ConsoleReporter {
            out: io::stdout(),
            failed: false,
        },
    );
    println!(
        "{} passed, {} failed, {} timed out, {} skipped in {:?}",
        report.passed, report.failed, report.timed_out, report.skipped, report.duration
    );
    std::process::Termination::report(report)
}
