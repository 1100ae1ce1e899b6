//! Testify: describe/it suites with lifecycle hooks, fluent expectations and
//! console reporting.
//!
//! A run has two phases. During declaration, `describe`/`it` and the hook
//! functions build a [`SuiteRegistry`]. During execution, the [`Engine`]
//! walks it depth-first, brackets every suite and test with its hooks and
//! hands each [`ExecutionResult`] to a [`Reporter`].
//!
//! ```rust
//! use testify::{expect, RecordingReporter, Testify};
//!
//! let mut t = Testify::new();
//! t.describe("math", |s| {
//!     s.it("adds", || expect(2 + 2).to_be(4))?;
//!     s.it("compares", || expect(5).to_be_greater_than(3))
//! })
//! .unwrap();
//!
//! let summary = t.run(&mut RecordingReporter::new()).unwrap();
//! assert_eq!(summary.passed, 2);
//! assert_eq!(summary.exit_code(), 0);
//! ```

pub mod action;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod expect;
pub mod harness;
pub mod lifecycle;
pub mod registry;
pub mod report;
pub mod results;
pub mod value;

pub use crate::action::Action;
pub use crate::bridge::{NativeSuites, RunnableSuite, XUnitClass, XUnitSuite};
pub use crate::config::{ColorMode, Config, ConfigOverrides, OutputFormat};
pub use crate::engine::Engine;
pub use crate::errors::{
    skip, ArgumentError, AssertionFailure, ConfigError, Fault, Outcome, UsageError,
};
pub use crate::expect::{expect, expect_fn, Expectation};
pub use crate::harness::{Backend, RunError, Testify};
pub use crate::lifecycle::HookKind;
pub use crate::registry::{SuiteId, SuiteRegistry, TestMode};
pub use crate::report::{
    ConsoleReporter, JsonReporter, RecordingReporter, ReportEvent, Reporter, SuiteInfo,
};
pub use crate::results::{ExecutionResult, FailureCause, HookFailure, RunSummary, TestStatus};
pub use crate::value::{Object, Value};
