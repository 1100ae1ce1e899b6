//! Result records produced during the execution phase.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::errors::Fault;
use crate::lifecycle::HookKind;

/// Final classification of one executed test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Errored,
}

impl TestStatus {
    /// Short word used by reporters.
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Skipped => "SKIP",
            TestStatus::Errored => "ERROR",
        }
    }

    /// Failed and Errored tests fail the run; Skipped never does.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::Errored)
    }

    /// Classifies a body outcome.
    pub fn classify(fault: Option<&Fault>) -> TestStatus {
        match fault {
            None => TestStatus::Passed,
            Some(Fault::Assertion(_)) => TestStatus::Failed,
            Some(Fault::Skipped { .. }) => TestStatus::Skipped,
            Some(_) => TestStatus::Errored,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured detail of why a test did not pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureCause {
    Assertion {
        expected: Option<String>,
        actual: Option<String>,
    },
    Fault {
        kind: String,
    },
    Hook {
        hook: HookKind,
        kind: String,
    },
    Skip,
}

impl FailureCause {
    pub fn from_fault(fault: &Fault) -> Self {
        match fault {
            Fault::Assertion(failure) => FailureCause::Assertion {
                expected: failure.expected.clone(),
                actual: failure.actual.clone(),
            },
            Fault::Skipped { .. } => FailureCause::Skip,
            other => FailureCause::Fault {
                kind: other.kind().to_string(),
            },
        }
    }

    pub fn from_hook(hook: HookKind, fault: &Fault) -> Self {
        match fault {
            Fault::Skipped { .. } => FailureCause::Skip,
            other => FailureCause::Hook {
                hook,
                kind: other.kind().to_string(),
            },
        }
    }
}

/// Outcome of one executed test. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub suite_name: String,
    /// Full suite path, e.g. `outer > inner`.
    pub suite_path: String,
    pub test_name: String,
    pub status: TestStatus,
    pub duration_nanos: u64,
    pub diagnostic: Option<String>,
    pub cause: Option<FailureCause>,
    /// Cleanup fault recorded after the status was already decided.
    pub secondary: Option<String>,
}

impl ExecutionResult {
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.duration_nanos)
    }

    /// `suite path > test name`, the string filters match against.
    pub fn full_name(&self) -> String {
        format!("{} > {}", self.suite_path, self.test_name)
    }
}

/// A lifecycle hook fault that is not attached to any single test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookFailure {
    pub suite_name: String,
    pub hook: HookKind,
    pub kind: String,
    pub message: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub hook_failures: usize,
    pub total_duration_nanos: u64,
}

impl RunSummary {
    pub fn record(&mut self, result: &ExecutionResult) {
        self.total += 1;
        match result.status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Errored => self.errored += 1,
        }
    }

    pub fn record_hook_failure(&mut self) {
        self.hook_failures += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.errored > 0 || self.hook_failures > 0
    }

    /// 0 when every test passed or was skipped and no hook failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.total_duration_nanos)
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }
}

/// Saturating conversion for elapsed times.
pub(crate) fn nanos(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssertionFailure;

    fn result(status: TestStatus) -> ExecutionResult {
        ExecutionResult {
            suite_name: "s".into(),
            suite_path: "s".into(),
            test_name: "t".into(),
            status,
            duration_nanos: 0,
            diagnostic: None,
            cause: None,
            secondary: None,
        }
    }

    #[test]
    fn classify_maps_fault_categories() {
        assert_eq!(TestStatus::classify(None), TestStatus::Passed);
        let assertion = Fault::from(AssertionFailure::new("nope"));
        assert_eq!(TestStatus::classify(Some(&assertion)), TestStatus::Failed);
        assert_eq!(TestStatus::classify(Some(&Fault::skip("later"))), TestStatus::Skipped);
        let other = Fault::raise("Runtime", "boom");
        assert_eq!(TestStatus::classify(Some(&other)), TestStatus::Errored);
    }

    #[test]
    fn skipped_tests_do_not_fail_the_run() {
        let mut summary = RunSummary::default();
        summary.record(&result(TestStatus::Passed));
        summary.record(&result(TestStatus::Skipped));
        assert_eq!(summary.total, 2);
        assert_eq!(summary.exit_code(), 0);

        summary.record(&result(TestStatus::Errored));
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn hook_failures_fail_the_run() {
        let mut summary = RunSummary::default();
        summary.record_hook_failure();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 1);
    }
}
