//! The `Testify` facade: a registry plus a configuration, with the
//! registration DSL and the run entry points in one place.
//!
//! ```rust,no_run
//! use testify::{expect, Testify};
//!
//! let mut t = Testify::new();
//! t.describe("math", |s| {
//!     s.before_each(|| Ok(()))?;
//!     s.it("adds", || expect(1 + 1).to_be(2))
//! })
//! .unwrap();
//! t.run_and_exit();
//! ```

use std::io;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::bridge::{NativeSuites, RunnableSuite, XUnitSuite};
use crate::config::{Config, OutputFormat};
use crate::errors::{Outcome, UsageError};
use crate::expect::{expect, Expectation};
use crate::registry::SuiteRegistry;
use crate::report::{ConsoleReporter, JsonReporter, Reporter};
use crate::results::RunSummary;
use crate::value::Value;

/// Which backend executes the registered suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Native,
    XUnit,
}

/// Errors surfaced by the facade's run entry points.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Usage(#[from] UsageError),

    #[error("failed to write report")]
    #[diagnostic(code(testify::report::io))]
    Io(#[from] io::Error),
}

#[derive(Debug, Default)]
pub struct Testify {
    registry: SuiteRegistry,
    config: Config,
    backend: Backend,
}

impl Testify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn registry(&self) -> &SuiteRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SuiteRegistry {
        &mut self.registry
    }

    // ------------------------------------------------------------------------
    // Registration DSL
    // ------------------------------------------------------------------------

    pub fn describe<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: FnOnce(&mut SuiteRegistry) -> Outcome,
    {
        self.registry.describe(name, body)
    }

    pub fn it<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.it(name, body)
    }

    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.test(name, body)
    }

    pub fn it_skip<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.it_skip(name, body)
    }

    pub fn it_only<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.it_only(name, body)
    }

    pub fn before_all<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.before_all(body)
    }

    pub fn after_all<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.after_all(body)
    }

    pub fn before_each<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.before_each(body)
    }

    pub fn after_each<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.registry.after_each(body)
    }

    pub fn expect(&self, value: impl Into<Value>) -> Expectation {
        expect(value)
    }

    // ------------------------------------------------------------------------
    // Running
    // ------------------------------------------------------------------------

    /// Runs everything registered so far with the configured backend.
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<RunSummary, UsageError> {
        debug!(backend = ?self.backend, "running registered suites");
        match self.backend {
            Backend::Native => NativeSuites::new(&self.registry).run(&self.config, reporter),
            Backend::XUnit => {
                XUnitSuite::from_registry(&self.registry)?.run(&self.config, reporter)
            }
        }
    }

    /// Runs and renders to stdout in the configured format.
    pub fn run_console(&self) -> Result<RunSummary, RunError> {
        match self.config.format {
            OutputFormat::Console => {
                let mut reporter = ConsoleReporter::stdout(self.config.colors.color_choice())
                    .verbose(self.config.verbose);
                let summary = self.run(&mut reporter)?;
                reporter.take_error().map_or(Ok(summary), |e| Err(e.into()))
            }
            OutputFormat::Json => {
                let mut reporter = JsonReporter::stdout();
                let summary = self.run(&mut reporter)?;
                reporter.take_error().map_or(Ok(summary), |e| Err(e.into()))
            }
        }
    }

    /// Runs, renders to stdout and exits with 0 when no test failed or
    /// errored and no hook failed, 1 otherwise.
    pub fn run_and_exit(&self) -> ! {
        let code = match self.run_console() {
            Ok(summary) => summary.exit_code(),
            Err(err) => {
                eprintln!("{:?}", miette::Report::new(err));
                1
            }
        };
        std::process::exit(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;

    #[test]
    fn top_level_it_is_a_usage_error() {
        let mut t = Testify::new();
        let err = t.it("orphan", || Ok(())).unwrap_err();
        assert_eq!(err.kind(), "UsageError");
    }

    #[test]
    fn both_backends_agree_on_flat_suites() {
        let mut t = Testify::new();
        t.describe("s", |s| {
            s.it("ok", || expect(1).to_be(1))?;
            s.it("bad", || expect(1).to_be(2))
        })
        .unwrap();

        let native = t.run(&mut RecordingReporter::new()).unwrap();
        let t = t.backend(Backend::XUnit);
        let xunit = t.run(&mut RecordingReporter::new()).unwrap();
        assert_eq!(native.passed, xunit.passed);
        assert_eq!(native.failed, xunit.failed);
        assert_eq!(xunit.exit_code(), 1);
    }
}
