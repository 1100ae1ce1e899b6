//! JSON-lines output: one object per reporter event.

use std::io::{self, Write};

use super::{ReportEvent, Reporter, SuiteInfo};
use crate::results::{ExecutionResult, HookFailure, RunSummary};

pub struct JsonReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn emit(&mut self, event: &ReportEvent) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out));
        if let Err(err) = written {
            self.error.get_or_insert(err);
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn suite_start(&mut self, suite: &SuiteInfo) {
        self.emit(&ReportEvent::SuiteStart(suite.clone()));
    }

    fn test_result(&mut self, result: &ExecutionResult) {
        self.emit(&ReportEvent::TestResult(result.clone()));
    }

    fn hook_failure(&mut self, failure: &HookFailure) {
        self.emit(&ReportEvent::HookFailure(failure.clone()));
    }

    fn suite_end(&mut self, suite: &SuiteInfo) {
        self.emit(&ReportEvent::SuiteEnd(suite.clone()));
    }

    fn run_summary(&mut self, summary: &RunSummary) {
        self.emit(&ReportEvent::RunSummary(summary.clone()));
        if let Err(err) = self.out.flush() {
            self.error.get_or_insert(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::results::TestStatus;

    #[test]
    fn each_event_is_one_tagged_line() {
        let mut reporter = JsonReporter::new(Vec::new());
        let suite = SuiteInfo {
            name: "math".into(),
            path: "math".into(),
            depth: 0,
        };
        reporter.suite_start(&suite);
        reporter.test_result(&ExecutionResult {
            suite_name: "math".into(),
            suite_path: "math".into(),
            test_name: "adds".into(),
            status: TestStatus::Passed,
            duration_nanos: 10,
            diagnostic: None,
            cause: None,
            secondary: None,
        });
        reporter.suite_end(&suite);
        reporter.run_summary(&RunSummary::default());

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["event"], "suite_start");
        assert_eq!(lines[1]["event"], "test_result");
        assert_eq!(lines[1]["status"], "passed");
        assert_eq!(lines[1]["test_name"], "adds");
        assert_eq!(lines[3]["event"], "run_summary");
        assert_eq!(lines[3]["total"], 0);
    }
}
