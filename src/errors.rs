//! Testify error taxonomy.
//!
//! Every test body, hook and declaration body returns an [`Outcome`]. The
//! engine inspects the [`Fault`] variant to decide a test's status:
//!
//! - [`AssertionFailure`]: an expectation predicate did not hold (test Failed)
//! - [`ArgumentError`]: a matcher was handed a subject it cannot evaluate
//! - [`UsageError`]: the registration DSL was misused
//! - `Skipped`: an explicit skip signal (test Skipped)
//! - `Unexpected`: anything else raised by user code, including caught panics
//!
//! All types derive `miette::Diagnostic` so they render with codes and help
//! text when surfaced outside the engine (declaration errors, config errors).

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type returned by every test, hook and declaration body.
pub type Outcome = Result<(), Fault>;

/// The single error type flowing out of user code.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum Fault {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Usage(#[from] UsageError),

    #[error("skipped: {reason}")]
    #[diagnostic(code(testify::skip))]
    Skipped { reason: String },

    #[error("{kind}: {message}")]
    #[diagnostic(code(testify::unexpected))]
    Unexpected { kind: String, message: String },
}

impl Fault {
    /// Builds an unexpected fault of a caller-chosen kind, e.g. `"InvalidArgument"`.
    pub fn raise(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Fault::Unexpected {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Wraps any error as an unexpected fault named after its Rust type.
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        let full = std::any::type_name::<E>();
        let kind = full.rsplit("::").next().unwrap_or(full);
        Fault::raise(kind, err.to_string())
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Fault::Skipped {
            reason: reason.into(),
        }
    }

    /// The kind name `to_throw_kind` matches against.
    pub fn kind(&self) -> &str {
        match self {
            Fault::Assertion(_) => "AssertionFailure",
            Fault::Argument(_) => "ArgumentError",
            Fault::Usage(_) => "UsageError",
            Fault::Skipped { .. } => "Skipped",
            Fault::Unexpected { kind, .. } => kind,
        }
    }

    /// Message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Fault::Assertion(e) => e.message.clone(),
            Fault::Argument(e) => e.message.clone(),
            Fault::Usage(e) => e.message.clone(),
            Fault::Skipped { reason } => reason.clone(),
            Fault::Unexpected { message, .. } => message.clone(),
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Fault::Assertion(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Fault::Skipped { .. })
    }

    /// One-line rendering for reports: assertion messages and skip reasons
    /// as-is, everything else prefixed with its kind.
    pub fn summary(&self) -> String {
        match self {
            Fault::Assertion(e) => e.message.clone(),
            Fault::Skipped { reason } => reason.clone(),
            Fault::Unexpected { .. } => self.to_string(),
            other => format!("{}: {}", other.kind(), other),
        }
    }
}

/// Convenience for test bodies: `return skip("not on this platform");`
pub fn skip(reason: impl Into<String>) -> Outcome {
    Err(Fault::skip(reason))
}

/// An expectation predicate did not hold.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(testify::assertion))]
pub struct AssertionFailure {
    pub message: String,
    /// Rendered expected value, when the matcher has one.
    pub expected: Option<String>,
    /// Rendered actual value.
    pub actual: Option<String>,
    pub negated: bool,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            negated: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentErrorKind {
    TypeMismatch,
    NotCallable,
}

/// A matcher was invoked with a subject or operand it cannot evaluate.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("{matcher}: {message}")]
#[diagnostic(
    code(testify::argument),
    help("check the subject passed to expect() matches what the matcher accepts")
)]
pub struct ArgumentError {
    pub kind: ArgumentErrorKind,
    pub matcher: &'static str,
    pub message: String,
}

impl ArgumentError {
    pub fn type_mismatch(matcher: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ArgumentErrorKind::TypeMismatch,
            matcher,
            message: message.into(),
        }
    }

    pub fn not_callable(matcher: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ArgumentErrorKind::NotCallable,
            matcher,
            message: message.into(),
        }
    }
}

/// Misuse of the registration DSL.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(testify::usage),
    help("register tests and hooks inside a describe() block")
)]
pub struct UsageError {
    pub message: String,
}

impl UsageError {
    pub fn no_active_suite(what: &str) -> Self {
        Self {
            message: format!("no active suite: cannot register {what} outside describe()"),
        }
    }

    pub fn still_declaring(suite: &str) -> Self {
        Self {
            message: format!("cannot run while suite '{suite}' is still being declared"),
        }
    }

    pub fn unbalanced_end() -> Self {
        Self {
            message: "end_suite called with no suite being declared".to_string(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    #[diagnostic(code(testify::config::not_found))]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(testify::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {source}")]
    #[diagnostic(
        code(testify::config::parse),
        help("config files are YAML maps, e.g. `stop_on_failure: true`")
    )]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_name_each_category() {
        assert_eq!(Fault::from(AssertionFailure::new("x")).kind(), "AssertionFailure");
        assert_eq!(
            Fault::from(ArgumentError::type_mismatch("to_contain", "x")).kind(),
            "ArgumentError"
        );
        assert_eq!(Fault::from(UsageError::unbalanced_end()).kind(), "UsageError");
        assert_eq!(Fault::skip("later").kind(), "Skipped");
        assert_eq!(Fault::raise("InvalidArgument", "bad").kind(), "InvalidArgument");
    }

    #[test]
    fn from_error_uses_short_type_name() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let fault = Fault::from_error(err);
        assert_eq!(fault.kind(), "Error");
        assert_eq!(fault.message(), "disk gone");
    }

    #[test]
    fn summary_prefixes_non_assertion_kinds() {
        let failure = Fault::from(AssertionFailure::new("Expected 1 to be (===) 2"));
        assert_eq!(failure.summary(), "Expected 1 to be (===) 2");
        assert_eq!(Fault::raise("Runtime", "boom").summary(), "Runtime: boom");
        assert_eq!(
            Fault::from(ArgumentError::type_mismatch("to_contain", "bad")).summary(),
            "ArgumentError: to_contain: bad"
        );
        assert_eq!(Fault::skip("later").summary(), "later");
    }

    #[test]
    fn unexpected_display_includes_kind() {
        let fault = Fault::raise("Runtime", "boom");
        assert_eq!(fault.to_string(), "Runtime: boom");
    }
}
