//! Reporter interface and the events the engine emits.
//!
//! Reporters only render. They receive events in execution order and never
//! alter counts or ordering.

use serde::Serialize;

use crate::results::{ExecutionResult, HookFailure, RunSummary};

pub mod console;
pub mod json;
pub mod recording;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use recording::RecordingReporter;

/// A suite as seen by reporters. Root suites have depth 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteInfo {
    pub name: String,
    pub path: String,
    pub depth: usize,
}

pub trait Reporter {
    fn suite_start(&mut self, suite: &SuiteInfo);

    fn test_result(&mut self, result: &ExecutionResult);

    /// A BeforeAll/AfterAll fault that is not tied to a single test.
    fn hook_failure(&mut self, failure: &HookFailure);

    fn suite_end(&mut self, suite: &SuiteInfo);

    fn run_summary(&mut self, summary: &RunSummary);
}

/// One reporter callback, owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    SuiteStart(SuiteInfo),
    TestResult(ExecutionResult),
    HookFailure(HookFailure),
    SuiteEnd(SuiteInfo),
    RunSummary(RunSummary),
}

impl ReportEvent {
    /// Routes the event to the matching reporter callback.
    pub fn dispatch(&self, reporter: &mut dyn Reporter) {
        match self {
            ReportEvent::SuiteStart(suite) => reporter.suite_start(suite),
            ReportEvent::TestResult(result) => reporter.test_result(result),
            ReportEvent::HookFailure(failure) => reporter.hook_failure(failure),
            ReportEvent::SuiteEnd(suite) => reporter.suite_end(suite),
            ReportEvent::RunSummary(summary) => reporter.run_summary(summary),
        }
    }
}

/// Formats nanoseconds as milliseconds with two decimals, e.g. `0.12ms`.
pub fn format_millis(nanos: u64) -> String {
    format!("{:.2}ms", nanos as f64 / 1_000_000.0)
}
