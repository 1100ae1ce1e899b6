//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use testify::{
    Config, Engine, Outcome, RecordingReporter, RunSummary, SuiteRegistry, TestStatus,
};

/// Ordered record of hook and test invocations, shared by the closures
/// registered in one test.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// A body that records `label` and succeeds.
    pub fn recorder(&self, label: &str) -> impl Fn() -> Outcome + 'static {
        let log = self.clone();
        let label = label.to_string();
        move || {
            log.push(label.clone());
            Ok(())
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

pub fn run(registry: &SuiteRegistry) -> (RunSummary, RecordingReporter) {
    run_with(registry, &Config::default())
}

pub fn run_with(registry: &SuiteRegistry, config: &Config) -> (RunSummary, RecordingReporter) {
    let mut reporter = RecordingReporter::new();
    let summary = Engine::new(registry, config)
        .run(&mut reporter)
        .expect("registry is not declaring");
    (summary, reporter)
}

/// `(test name, status)` in emission order.
pub fn statuses(reporter: &RecordingReporter) -> Vec<(String, TestStatus)> {
    reporter
        .results()
        .into_iter()
        .map(|r| (r.test_name.clone(), r.status))
        .collect()
}
