//! Runnable-suite backends.
//!
//! [`RunnableSuite`] is the seam between "something that can run and report"
//! and the concrete backend. [`NativeSuites`] drives the [`Engine`] directly.
//! [`XUnitSuite`] translates the registry into the class-based shape used by
//! xUnit-style runners and executes that shape:
//!
//! - one [`XUnitClass`] per suite, named `<Sanitized>_<index>_TestifySpec`
//! - one `test_<snake_name>` method per test
//! - `set_up_before_class` / `tear_down_after_class` from the suite's own
//!   BeforeAll / AfterAll hooks
//! - `set_up` / `tear_down` from the accumulated BeforeEach (outer to inner)
//!   and AfterEach (inner to outer) chains
//!
//! Classes are flat, so ancestor BeforeAll hooks do not run for nested
//! classes.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, warn};

use crate::action::Action;
use crate::config::Config;
use crate::engine::{hook_diagnostic, Engine, Selection};
use crate::errors::{Outcome, UsageError};
use crate::lifecycle::HookKind;
use crate::registry::{SuiteRegistry, TestMode};
use crate::report::{Reporter, SuiteInfo};
use crate::results::{nanos, ExecutionResult, FailureCause, HookFailure, RunSummary, TestStatus};

pub const CLASS_SUFFIX: &str = "TestifySpec";

/// Anything that can execute its tests and report them.
pub trait RunnableSuite {
    fn run(&self, config: &Config, reporter: &mut dyn Reporter) -> Result<RunSummary, UsageError>;
}

/// The native engine over a registry.
pub struct NativeSuites<'a> {
    registry: &'a SuiteRegistry,
}

impl<'a> NativeSuites<'a> {
    pub fn new(registry: &'a SuiteRegistry) -> Self {
        Self { registry }
    }
}

impl RunnableSuite for NativeSuites<'_> {
    fn run(&self, config: &Config, reporter: &mut dyn Reporter) -> Result<RunSummary, UsageError> {
        Engine::new(self.registry, config).run(reporter)
    }
}

#[derive(Debug, Clone)]
pub struct XUnitMethod {
    /// Generated method name, e.g. `test_adds_numbers`.
    pub name: String,
    /// The test's declared name.
    pub test_name: String,
    pub mode: TestMode,
    pub body: Action,
}

#[derive(Debug, Clone)]
pub struct XUnitClass {
    pub name: String,
    pub suite_name: String,
    pub suite_path: String,
    pub depth: usize,
    pub set_up_before_class: Vec<Action>,
    pub tear_down_after_class: Vec<Action>,
    pub set_up: Vec<Action>,
    pub tear_down: Vec<Action>,
    pub methods: Vec<XUnitMethod>,
}

impl XUnitClass {
    pub fn method(&self, name: &str) -> Option<&XUnitMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// The registry translated into xUnit classes, in depth-first order.
#[derive(Debug, Clone)]
pub struct XUnitSuite {
    classes: Vec<XUnitClass>,
    focused: bool,
}

impl XUnitSuite {
    pub fn from_registry(registry: &SuiteRegistry) -> Result<Self, UsageError> {
        if let Some(active) = registry.active() {
            return Err(UsageError::still_declaring(&registry.suite(active).name));
        }
        let classes = registry
            .walk()
            .into_iter()
            .enumerate()
            .map(|(index, id)| {
                let suite = registry.suite(id);
                let chain = registry.ancestry(id);
                let collect = |kind: HookKind| -> Vec<Action> {
                    chain
                        .iter()
                        .flat_map(|s| registry.suite(*s).hooks.hooks(kind).iter().cloned())
                        .collect()
                };
                let mut tear_down = collect(HookKind::AfterEach);
                tear_down.reverse();

                let mut taken = HashSet::new();
                let methods = suite
                    .tests
                    .iter()
                    .enumerate()
                    .map(|(i, test)| {
                        let mut name = method_name(&test.name, i);
                        if !taken.insert(name.clone()) {
                            name = format!("{}_{}", name, i);
                            taken.insert(name.clone());
                        }
                        XUnitMethod {
                            name,
                            test_name: test.name.clone(),
                            mode: test.mode,
                            body: test.action.clone(),
                        }
                    })
                    .collect();

                XUnitClass {
                    name: class_name(&suite.name, index),
                    suite_name: suite.name.clone(),
                    suite_path: registry.path(id),
                    depth: chain.len() - 1,
                    set_up_before_class: suite.hooks.hooks(HookKind::BeforeAll).to_vec(),
                    tear_down_after_class: suite.hooks.hooks(HookKind::AfterAll).to_vec(),
                    set_up: collect(HookKind::BeforeEach),
                    tear_down,
                    methods,
                }
            })
            .collect();
        Ok(Self {
            classes,
            focused: registry.has_focused(),
        })
    }

    pub fn classes(&self) -> &[XUnitClass] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&XUnitClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    fn run_class(
        &self,
        class: &XUnitClass,
        selection: &mut Selection,
        summary: &mut RunSummary,
        reporter: &mut dyn Reporter,
    ) {
        let info = SuiteInfo {
            name: class.suite_name.clone(),
            path: class.suite_path.clone(),
            depth: class.depth,
        };
        debug!(class = %class.name, methods = class.methods.len(), "running class");
        reporter.suite_start(&info);

        let selected = class.methods.iter().any(|method| {
            selection.selects(
                method.mode,
                &format!("{} > {}", class.suite_path, method.test_name),
            )
        });
        let bracketed = selected && !selection.is_stopped();
        let before = if bracketed {
            run_each(&class.set_up_before_class)
        } else {
            Ok(())
        };
        if let Err(fault) = &before {
            if !fault.is_skip() {
                summary.record_hook_failure();
                reporter.hook_failure(&HookFailure {
                    suite_name: class.suite_name.clone(),
                    hook: HookKind::BeforeAll,
                    kind: fault.kind().to_string(),
                    message: fault.summary(),
                });
            }
        }

        for method in &class.methods {
            let full_name = format!("{} > {}", class.suite_path, method.test_name);
            let mut result = ExecutionResult {
                suite_name: class.suite_name.clone(),
                suite_path: class.suite_path.clone(),
                test_name: method.test_name.clone(),
                status: TestStatus::Skipped,
                duration_nanos: 0,
                diagnostic: None,
                cause: None,
                secondary: None,
            };
            if let Some(reason) = selection.skip_reason(method.mode, &full_name) {
                result.diagnostic = Some(reason);
                result.cause = Some(FailureCause::Skip);
            } else if let Err(fault) = &before {
                result.status = if fault.is_skip() {
                    TestStatus::Skipped
                } else {
                    TestStatus::Errored
                };
                result.diagnostic = Some(hook_diagnostic(HookKind::BeforeAll, fault));
                result.cause = Some(FailureCause::from_hook(HookKind::BeforeAll, fault));
            } else {
                self.run_method(class, method, &mut result);
            }
            summary.record(&result);
            if result.status.is_failure() {
                selection.observe_failure();
            }
            reporter.test_result(&result);
        }

        if bracketed {
            if let Err(fault) = run_all(&class.tear_down_after_class) {
                warn!(
                    class = %class.name,
                    fault = %fault.summary(),
                    "tear_down_after_class failed"
                );
                summary.record_hook_failure();
                selection.observe_failure();
                reporter.hook_failure(&HookFailure {
                    suite_name: class.suite_name.clone(),
                    hook: HookKind::AfterAll,
                    kind: fault.kind().to_string(),
                    message: fault.summary(),
                });
            }
        }
        reporter.suite_end(&info);
    }

    /// set_up, method, tear_down; on any fault tear_down is attempted once
    /// more and its own faults are dropped.
    fn run_method(&self, class: &XUnitClass, method: &XUnitMethod, result: &mut ExecutionResult) {
        let mut elapsed = 0;
        let outcome = run_each(&class.set_up)
            .and_then(|()| {
                let started = Instant::now();
                let body = method.body.invoke();
                elapsed = nanos(started.elapsed());
                body
            })
            .and_then(|()| run_all(&class.tear_down));
        result.duration_nanos = elapsed;
        result.status = TestStatus::classify(outcome.as_ref().err());
        if let Err(fault) = outcome {
            if let Err(secondary) = run_all(&class.tear_down) {
                warn!(
                    method = %method.name,
                    fault = %secondary.summary(),
                    "tear_down failed after failure"
                );
            }
            result.diagnostic = Some(fault.summary());
            result.cause = Some(FailureCause::from_fault(&fault));
        }
    }
}

impl RunnableSuite for XUnitSuite {
    fn run(&self, config: &Config, reporter: &mut dyn Reporter) -> Result<RunSummary, UsageError> {
        let mut selection = Selection::from_parts(self.focused, config);
        let mut summary = RunSummary::default();
        let started = Instant::now();
        for class in &self.classes {
            self.run_class(class, &mut selection, &mut summary, reporter);
        }
        summary.total_duration_nanos = nanos(started.elapsed());
        reporter.run_summary(&summary);
        Ok(summary)
    }
}

/// Runs actions in order, stopping at the first fault.
fn run_each(actions: &[Action]) -> Outcome {
    actions.iter().try_for_each(Action::invoke)
}

/// Runs every action and returns the first fault.
fn run_all(actions: &[Action]) -> Outcome {
    let mut first = Ok(());
    for action in actions {
        if let Err(fault) = action.invoke() {
            if first.is_ok() {
                first = Err(fault);
            }
        }
    }
    first
}

fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

fn starts_like_identifier(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// `"Math basics"` at index 0 becomes `Math_basics_0_TestifySpec`.
pub fn class_name(suite_name: &str, index: usize) -> String {
    let mut base = sanitize(suite_name);
    if base.is_empty() {
        base = "Suite".to_string();
    }
    if !starts_like_identifier(&base) {
        base = format!("T_{}", base);
    }
    format!("{}_{}_{}", base, index, CLASS_SUFFIX)
}

/// `"adds numbers correctly"` becomes `test_adds_numbers_correctly`.
pub fn method_name(test_name: &str, index: usize) -> String {
    let mut base = sanitize(&test_name.to_lowercase());
    if base.is_empty() {
        base = format!("case_{}", index);
    }
    if !starts_like_identifier(&base) {
        base = format!("t_{}", base);
    }
    format!("test_{}", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_are_sanitized_and_indexed() {
        assert_eq!(class_name("Math basics", 0), "Math_basics_0_TestifySpec");
        assert_eq!(class_name("a -- b", 3), "a_b_3_TestifySpec");
        assert_eq!(class_name("9 lives", 1), "T_9_lives_1_TestifySpec");
        assert_eq!(class_name("", 2), "Suite_2_TestifySpec");
    }

    #[test]
    fn method_names_are_snake_case() {
        assert_eq!(method_name("Adds numbers correctly", 0), "test_adds_numbers_correctly");
        assert_eq!(method_name("2 + 2", 1), "test_t_2_2");
        assert_eq!(method_name("???", 4), "test__");
        assert_eq!(method_name("", 5), "test_case_5");
    }

    #[test]
    fn run_all_keeps_going_after_a_fault() {
        use std::cell::Cell;
        use std::rc::Rc;

        use crate::errors::Fault;

        let ran = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ran);
        let actions = vec![
            Action::new(|| Err(Fault::raise("First", "one"))),
            Action::new(move || {
                counter.set(counter.get() + 1);
                Ok(())
            }),
        ];
        let err = run_all(&actions).unwrap_err();
        assert_eq!(err.kind(), "First");
        assert_eq!(ran.get(), 1);
    }
}
