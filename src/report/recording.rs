//! In-memory reporter for programmatic inspection.

use super::{ReportEvent, Reporter, SuiteInfo};
use crate::results::{ExecutionResult, HookFailure, RunSummary};

#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ReportEvent> {
        self.events
    }

    /// Test results in emission order.
    pub fn results(&self) -> Vec<&ExecutionResult> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::TestResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    pub fn hook_failures(&self) -> Vec<&HookFailure> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::HookFailure(failure) => Some(failure),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.events.iter().rev().find_map(|event| match event {
            ReportEvent::RunSummary(summary) => Some(summary),
            _ => None,
        })
    }

    /// Replays the recorded events into another reporter.
    pub fn replay(&self, reporter: &mut dyn Reporter) {
        for event in &self.events {
            event.dispatch(reporter);
        }
    }
}

impl Reporter for RecordingReporter {
    fn suite_start(&mut self, suite: &SuiteInfo) {
        self.events.push(ReportEvent::SuiteStart(suite.clone()));
    }

    fn test_result(&mut self, result: &ExecutionResult) {
        self.events.push(ReportEvent::TestResult(result.clone()));
    }

    fn hook_failure(&mut self, failure: &HookFailure) {
        self.events.push(ReportEvent::HookFailure(failure.clone()));
    }

    fn suite_end(&mut self, suite: &SuiteInfo) {
        self.events.push(ReportEvent::SuiteEnd(suite.clone()));
    }

    fn run_summary(&mut self, summary: &RunSummary) {
        self.events.push(ReportEvent::RunSummary(summary.clone()));
    }
}
