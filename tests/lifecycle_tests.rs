mod common;

use common::{run, EventLog};
use pretty_assertions::assert_eq;
use testify::{expect, ReportEvent, SuiteRegistry};

#[test]
fn hooks_bracket_tests_and_nested_suites() {
    let log = EventLog::new();
    let mut registry = SuiteRegistry::new();
    registry
        .describe("outer", |s| {
            s.before_all(log.recorder("outer:beforeAll"))?;
            s.after_all(log.recorder("outer:afterAll"))?;
            s.before_each(log.recorder("outer:beforeEach"))?;
            s.after_each(log.recorder("outer:afterEach"))?;
            s.it("a", log.recorder("test:a"))?;
            s.describe("inner", |s| {
                s.before_all(log.recorder("inner:beforeAll"))?;
                s.after_all(log.recorder("inner:afterAll"))?;
                s.before_each(log.recorder("inner:beforeEach"))?;
                s.after_each(log.recorder("inner:afterEach"))?;
                s.it("b", log.recorder("test:b"))
            })?;
            s.it("c", log.recorder("test:c"))
        })
        .unwrap();

    let (summary, _) = run(&registry);
    assert_eq!(summary.passed, 3);
    assert_eq!(
        log.entries(),
        vec![
            "outer:beforeAll",
            "outer:beforeEach",
            "test:a",
            "outer:afterEach",
            "inner:beforeAll",
            "outer:beforeEach",
            "inner:beforeEach",
            "test:b",
            "inner:afterEach",
            "outer:afterEach",
            "inner:afterAll",
            "outer:beforeEach",
            "test:c",
            "outer:afterEach",
            "outer:afterAll",
        ]
    );
}

#[test]
fn before_all_runs_once_before_any_test() {
    let log = EventLog::new();
    let mut registry = SuiteRegistry::new();
    registry
        .describe("suite", |s| {
            s.before_all(log.recorder("beforeAll"))?;
            for name in ["one", "two", "three"] {
                s.it(name, log.recorder(name))?;
            }
            Ok(())
        })
        .unwrap();

    run(&registry);
    assert_eq!(log.count("beforeAll"), 1);
    assert_eq!(log.position("beforeAll"), Some(0));
}

#[test]
fn after_each_runs_even_when_the_body_fails() {
    let log = EventLog::new();
    let mut registry = SuiteRegistry::new();
    registry
        .describe("outer", |s| {
            s.after_each(log.recorder("outer:afterEach"))?;
            s.describe("inner", |s| {
                s.after_each(log.recorder("inner:afterEach"))?;
                s.it("fails", || expect(1).to_be(2))
            })
        })
        .unwrap();

    let (summary, _) = run(&registry);
    assert_eq!(summary.failed, 1);
    assert_eq!(log.entries(), vec!["inner:afterEach", "outer:afterEach"]);
}

#[test]
fn hooks_of_one_kind_run_in_registration_order() {
    let log = EventLog::new();
    let mut registry = SuiteRegistry::new();
    registry
        .describe("suite", |s| {
            s.before_each(log.recorder("first"))?;
            s.before_each(log.recorder("second"))?;
            s.it("t", log.recorder("body"))
        })
        .unwrap();

    run(&registry);
    assert_eq!(log.entries(), vec!["first", "second", "body"]);
}

#[test]
fn results_follow_declaration_order() {
    let mut registry = SuiteRegistry::new();
    registry
        .describe("suite", |s| {
            s.it("a", || Ok(()))?;
            s.it("b", || Ok(()))?;
            s.it("c", || Ok(()))
        })
        .unwrap();

    let (_, reporter) = run(&registry);
    let names: Vec<_> = reporter
        .results()
        .into_iter()
        .map(|r| r.test_name.clone())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn sibling_suites_never_interleave() {
    let log = EventLog::new();
    let mut registry = SuiteRegistry::new();
    for name in ["first", "second"] {
        registry
            .describe(name, |s| {
                s.before_all(log.recorder(&format!("{name}:beforeAll")))?;
                s.it("t", log.recorder(&format!("{name}:test")))?;
                s.after_all(log.recorder(&format!("{name}:afterAll")))
            })
            .unwrap();
    }

    run(&registry);
    assert_eq!(
        log.entries(),
        vec![
            "first:beforeAll",
            "first:test",
            "first:afterAll",
            "second:beforeAll",
            "second:test",
            "second:afterAll",
        ]
    );
}

#[test]
fn suite_events_nest() {
    let mut registry = SuiteRegistry::new();
    registry
        .describe("outer", |s| {
            s.describe("inner", |s| s.it("t", || Ok(())))
        })
        .unwrap();

    let (_, reporter) = run(&registry);
    let trace: Vec<String> = reporter
        .events()
        .iter()
        .map(|event| match event {
            ReportEvent::SuiteStart(s) => format!("start {} @{}", s.path, s.depth),
            ReportEvent::SuiteEnd(s) => format!("end {}", s.path),
            ReportEvent::TestResult(r) => format!("test {}", r.test_name),
            ReportEvent::HookFailure(f) => format!("hook {}", f.hook),
            ReportEvent::RunSummary(s) => format!("summary {}", s.total),
        })
        .collect();
    assert_eq!(
        trace,
        vec![
            "start outer @0",
            "start outer > inner @1",
            "test t",
            "end outer > inner",
            "end outer",
            "summary 1",
        ]
    );
}
