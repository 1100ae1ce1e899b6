//! Execution engine.
//!
//! Walks a frozen [`SuiteRegistry`] depth-first in declaration order and
//! brackets every suite and test with its lifecycle hooks:
//!
//! ```text
//! suite:  Pending -> BeforeAllRunning -> ExecutingTests -> AfterAllRunning -> Done
//! test:   NotStarted -> BeforeEachRunning -> Running -> AfterEachRunning -> Finished
//! ```
//!
//! Nested suites run entirely inside their parent's `ExecutingTests` window,
//! so a parent's AfterAll never fires before a child's. Every fault raised by
//! user code (panics included) is caught here and turned into a status.

use std::fmt;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::errors::{Fault, UsageError};
use crate::lifecycle::HookKind;
use crate::registry::{Member, SuiteId, SuiteRegistry, TestCase, TestMode};
use crate::report::{Reporter, SuiteInfo};
use crate::results::{nanos, ExecutionResult, FailureCause, HookFailure, RunSummary, TestStatus};

pub const REASON_STOPPED: &str = "stopped after first failure";
pub const REASON_NOT_FOCUSED: &str = "not marked 'only' in 'only' mode";
pub const REASON_MARKED_SKIP: &str = "marked 'skip'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitePhase {
    Pending,
    BeforeAllRunning,
    ExecutingTests,
    AfterAllRunning,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    NotStarted,
    BeforeEachRunning,
    Running,
    AfterEachRunning,
    Finished(TestStatus),
}

fn advance<P: fmt::Debug + Copy>(scope: &'static str, name: &str, phase: &mut P, next: P) {
    trace!(scope, subject = name, from = ?*phase, to = ?next, "phase transition");
    *phase = next;
}

/// A BeforeAll fault inherited by every test below the failing suite.
struct Aborted {
    suite: String,
    fault: Fault,
}

impl Aborted {
    fn status(&self) -> TestStatus {
        if self.fault.is_skip() {
            TestStatus::Skipped
        } else {
            TestStatus::Errored
        }
    }

    fn diagnostic(&self) -> String {
        if self.fault.is_skip() {
            return self.fault.summary();
        }
        format!(
            "{} hook in '{}' failed: {}",
            HookKind::BeforeAll,
            self.suite,
            self.fault.summary()
        )
    }
}

/// Decides, before any hook runs, whether a test is skipped.
pub(crate) struct Selection {
    focused: bool,
    filter: Option<String>,
    stop_on_failure: bool,
    stopped: bool,
}

impl Selection {
    pub(crate) fn new(registry: &SuiteRegistry, config: &Config) -> Self {
        Self::from_parts(registry.has_focused(), config)
    }

    pub(crate) fn from_parts(focused: bool, config: &Config) -> Self {
        Self {
            focused,
            filter: config.normalized_filter(),
            stop_on_failure: config.stop_on_failure,
            stopped: false,
        }
    }

    /// Checked in order: stop, focus, skip mark, filter.
    pub(crate) fn skip_reason(&self, mode: TestMode, full_name: &str) -> Option<String> {
        if self.stopped {
            return Some(REASON_STOPPED.to_string());
        }
        self.deselect_reason(mode, full_name)
    }

    /// Whether focus, skip mark and filter let the test run. Unlike
    /// [`Selection::skip_reason`] this does not depend on earlier outcomes.
    pub(crate) fn selects(&self, mode: TestMode, full_name: &str) -> bool {
        self.deselect_reason(mode, full_name).is_none()
    }

    fn deselect_reason(&self, mode: TestMode, full_name: &str) -> Option<String> {
        if self.focused && mode != TestMode::Only {
            return Some(REASON_NOT_FOCUSED.to_string());
        }
        if mode == TestMode::Skip {
            return Some(REASON_MARKED_SKIP.to_string());
        }
        if let Some(filter) = &self.filter {
            if !full_name.to_lowercase().contains(filter.as_str()) {
                return Some(format!("filtered out by substring: {}", filter));
            }
        }
        None
    }

    /// Records a failure; stops the run when configured to.
    pub(crate) fn observe_failure(&mut self) {
        if self.stop_on_failure && !self.stopped {
            debug!("stopping after first failure");
            self.stopped = true;
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Mutable state of one run.
struct Run<'r> {
    reporter: &'r mut dyn Reporter,
    summary: RunSummary,
    selection: Selection,
}

/// Runs the suites of one registry under one configuration.
pub struct Engine<'a> {
    registry: &'a SuiteRegistry,
    config: &'a Config,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a SuiteRegistry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    /// Runs every root suite and reports to `reporter`.
    ///
    /// Fails only when called while a suite is still being declared; test
    /// and hook faults never escape.
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<RunSummary, UsageError> {
        self.run_roots(self.registry.roots(), reporter)
    }

    /// Runs the given root suites only. Used by bridges that drive a subset.
    pub fn run_roots(
        &self,
        roots: &[SuiteId],
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary, UsageError> {
        if let Some(active) = self.registry.active() {
            return Err(UsageError::still_declaring(&self.registry.suite(active).name));
        }
        let mut run = Run {
            reporter,
            summary: RunSummary::default(),
            selection: Selection::new(self.registry, self.config),
        };
        debug!(
            suites = self.registry.suite_count(),
            tests = self.registry.test_count(),
            focused = run.selection.focused,
            "starting run"
        );

        let started = Instant::now();
        for root in roots {
            self.run_suite(*root, &mut run, None);
        }
        run.summary.total_duration_nanos = nanos(started.elapsed());

        let summary = run.summary;
        debug!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            errored = summary.errored,
            hook_failures = summary.hook_failures,
            "run finished"
        );
        run.reporter.run_summary(&summary);
        Ok(summary)
    }

    fn run_suite(&self, id: SuiteId, run: &mut Run<'_>, inherited: Option<&Aborted>) {
        let suite = self.registry.suite(id);
        let info = SuiteInfo {
            name: suite.name.clone(),
            path: self.registry.path(id),
            depth: self.registry.ancestry(id).len() - 1,
        };
        let mut phase = SuitePhase::Pending;
        debug!(suite = %info.path, "suite start");
        run.reporter.suite_start(&info);

        let selected = self.selects_any(id, &run.selection);
        if !selected {
            debug!(suite = %info.path, "no selected tests, skipping suite hooks");
        }
        // Suites under an aborted ancestor, reached after a stop, or with no
        // selected test in their subtree run no hooks.
        let bracketed = selected && inherited.is_none() && !run.selection.is_stopped();
        let mut own = None;
        if bracketed {
            advance("suite", &info.path, &mut phase, SuitePhase::BeforeAllRunning);
            if let Err(fault) = suite.hooks.run_all(HookKind::BeforeAll) {
                warn!(suite = %info.path, fault = %fault.summary(), "beforeAll hook failed");
                if !fault.is_skip() {
                    self.hook_failed(run, &suite.name, HookKind::BeforeAll, &fault);
                }
                own = Some(Aborted {
                    suite: suite.name.clone(),
                    fault,
                });
            }
        }
        let aborted = inherited.or(own.as_ref());

        advance("suite", &info.path, &mut phase, SuitePhase::ExecutingTests);
        for member in suite.members() {
            match *member {
                Member::Test(index) => self.run_test(id, &suite.tests[index], run, aborted),
                Member::Suite(child) => self.run_suite(child, run, aborted),
            }
        }

        if bracketed {
            advance("suite", &info.path, &mut phase, SuitePhase::AfterAllRunning);
            if let Err(fault) = suite.hooks.run_all(HookKind::AfterAll) {
                warn!(suite = %info.path, fault = %fault.summary(), "afterAll hook failed");
                self.hook_failed(run, &suite.name, HookKind::AfterAll, &fault);
            }
        }
        advance("suite", &info.path, &mut phase, SuitePhase::Done);
        debug!(suite = %info.path, "suite end");
        run.reporter.suite_end(&info);
    }

    fn selects_any(&self, id: SuiteId, selection: &Selection) -> bool {
        let suite = self.registry.suite(id);
        let path = self.registry.path(id);
        suite
            .tests
            .iter()
            .any(|case| selection.selects(case.mode, &format!("{} > {}", path, case.name)))
            || suite
                .children
                .iter()
                .any(|child| self.selects_any(*child, selection))
    }

    fn hook_failed(&self, run: &mut Run<'_>, suite: &str, hook: HookKind, fault: &Fault) {
        run.summary.record_hook_failure();
        // BeforeAll faults stop the run through the tests they error.
        if hook == HookKind::AfterAll {
            run.selection.observe_failure();
        }
        run.reporter.hook_failure(&HookFailure {
            suite_name: suite.to_string(),
            hook,
            kind: fault.kind().to_string(),
            message: fault.summary(),
        });
    }

    fn run_test(
        &self,
        suite_id: SuiteId,
        case: &TestCase,
        run: &mut Run<'_>,
        aborted: Option<&Aborted>,
    ) {
        let suite = self.registry.suite(suite_id);
        let suite_path = self.registry.path(suite_id);
        let full_name = format!("{} > {}", suite_path, case.name);
        let mut result = ExecutionResult {
            suite_name: suite.name.clone(),
            suite_path,
            test_name: case.name.clone(),
            status: TestStatus::Skipped,
            duration_nanos: 0,
            diagnostic: None,
            cause: None,
            secondary: None,
        };

        if let Some(reason) = run.selection.skip_reason(case.mode, &full_name) {
            trace!(test = %full_name, %reason, "skipping");
            result.diagnostic = Some(reason);
            result.cause = Some(FailureCause::Skip);
            return self.finish(run, result);
        }
        if let Some(aborted) = aborted {
            result.status = aborted.status();
            result.diagnostic = Some(aborted.diagnostic());
            result.cause = Some(FailureCause::from_hook(HookKind::BeforeAll, &aborted.fault));
            return self.finish(run, result);
        }

        let chain = self.registry.ancestry(suite_id);
        let mut phase = TestPhase::NotStarted;

        advance("test", &full_name, &mut phase, TestPhase::BeforeEachRunning);
        let prepared = chain.iter().try_for_each(|id| {
            self.registry
                .suite(*id)
                .hooks
                .run_all(HookKind::BeforeEach)
        });
        match prepared {
            Err(fault) => {
                result.status = TestStatus::classify(Some(&fault));
                if result.status != TestStatus::Skipped {
                    result.status = TestStatus::Errored;
                }
                result.diagnostic = Some(hook_diagnostic(HookKind::BeforeEach, &fault));
                result.cause = Some(FailureCause::from_hook(HookKind::BeforeEach, &fault));
            }
            Ok(()) => {
                advance("test", &full_name, &mut phase, TestPhase::Running);
                let started = Instant::now();
                let outcome = case.action.invoke();
                result.duration_nanos = nanos(started.elapsed());
                result.status = TestStatus::classify(outcome.as_ref().err());
                if let Err(fault) = outcome {
                    result.diagnostic = Some(fault.summary());
                    result.cause = Some(FailureCause::from_fault(&fault));
                }
            }
        }

        advance("test", &full_name, &mut phase, TestPhase::AfterEachRunning);
        let mut cleanup: Option<Fault> = None;
        for id in chain.iter().rev() {
            if let Err(fault) = self.registry.suite(*id).hooks.run_all(HookKind::AfterEach) {
                if cleanup.is_none() {
                    cleanup = Some(fault);
                } else {
                    warn!(
                        test = %full_name,
                        fault = %fault.summary(),
                        "later afterEach fault dropped"
                    );
                }
            }
        }
        if let Some(fault) = cleanup {
            if result.status == TestStatus::Passed {
                result.status = if fault.is_skip() {
                    TestStatus::Skipped
                } else {
                    TestStatus::Errored
                };
                result.diagnostic = Some(hook_diagnostic(HookKind::AfterEach, &fault));
                result.cause = Some(FailureCause::from_hook(HookKind::AfterEach, &fault));
            } else {
                warn!(
                    test = %full_name,
                    fault = %fault.summary(),
                    "afterEach fault after unsuccessful test"
                );
                result.secondary = Some(hook_diagnostic(HookKind::AfterEach, &fault));
            }
        }

        advance("test", &full_name, &mut phase, TestPhase::Finished(result.status));
        self.finish(run, result);
    }

    fn finish(&self, run: &mut Run<'_>, result: ExecutionResult) {
        trace!(test = %result.full_name(), status = %result.status, "test finished");
        run.summary.record(&result);
        if result.status.is_failure() {
            run.selection.observe_failure();
        }
        run.reporter.test_result(&result);
    }
}

pub(crate) fn hook_diagnostic(hook: HookKind, fault: &Fault) -> String {
    if fault.is_skip() {
        fault.summary()
    } else {
        format!("{} hook failed: {}", hook, fault.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{skip, AssertionFailure};
    use crate::report::{RecordingReporter, ReportEvent};

    fn run(registry: &SuiteRegistry, config: &Config) -> (RunSummary, Vec<ReportEvent>) {
        let mut reporter = RecordingReporter::new();
        let summary = Engine::new(registry, config).run(&mut reporter).unwrap();
        (summary, reporter.into_events())
    }

    #[test]
    fn statuses_follow_fault_categories() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("s", |s| {
                s.it("passes", || Ok(()))?;
                s.it("fails", || Err(AssertionFailure::new("nope").into()))?;
                s.it("skips", || skip("not today"))?;
                s.it("errors", || Err(Fault::raise("Runtime", "boom")))
            })
            .unwrap();
        let (summary, _) = run(&registry, &Config::default());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn running_during_declaration_is_rejected() {
        let mut registry = SuiteRegistry::new();
        registry.begin_suite("open");
        let mut reporter = RecordingReporter::new();
        let err = Engine::new(&registry, &Config::default())
            .run(&mut reporter)
            .unwrap_err();
        assert!(err.message.contains("open"));
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn filter_matches_suite_path_case_insensitively() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("Parser", |s| {
                s.it("reads numbers", || Ok(()))?;
                s.describe("Strings", |s| s.it("reads quotes", || Ok(())))
            })
            .unwrap();
        let config = Config {
            filter: Some("parser > STRINGS".into()),
            ..Config::default()
        };
        let (summary, events) = run(&registry, &config);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.skipped, 1);
        let skipped = events.iter().find_map(|e| match e {
            ReportEvent::TestResult(r) if r.status == TestStatus::Skipped => Some(r.clone()),
            _ => None,
        });
        let skipped = skipped.unwrap();
        assert_eq!(skipped.test_name, "reads numbers");
        assert_eq!(
            skipped.diagnostic.as_deref(),
            Some("filtered out by substring: parser > strings")
        );
    }
}
