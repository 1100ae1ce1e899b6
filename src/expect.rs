//! Fluent expectations.
//!
//! An [`Expectation`] wraps one captured [`Value`] (the subject) and exposes
//! chainable matchers. Each matcher returns an [`Outcome`] so test bodies can
//! use `?`:
//!
//! ```rust
//! use testify::expect;
//! # fn body() -> testify::Outcome {
//! expect(5).to_be_greater_than(3)?;
//! expect("hello world").to_contain("world")?;
//! expect(vec!["alpha", "beta"]).not().to_contain("gamma")?;
//! # Ok(())
//! # }
//! # body().unwrap();
//! ```
//!
//! A failed predicate yields [`Fault::Assertion`]. A subject the matcher cannot
//! evaluate yields [`Fault::Argument`]; argument errors are never inverted by
//! [`Expectation::not`].

use std::cmp::Ordering;

use crate::errors::{ArgumentError, AssertionFailure, Fault, Outcome};
use crate::value::Value;

/// Captures `value` as the subject of an expectation.
pub fn expect(value: impl Into<Value>) -> Expectation {
    Expectation::new(value.into())
}

/// Captures a closure as the subject, for use with [`Expectation::to_throw`].
pub fn expect_fn<F>(f: F) -> Expectation
where
    F: Fn() -> Outcome + 'static,
{
    Expectation::new(Value::callable(f))
}

/// A captured subject plus the polarity of subsequent checks.
#[derive(Debug, Clone)]
pub struct Expectation {
    subject: Value,
    negated: bool,
    message: Option<String>,
}

impl Expectation {
    pub fn new(subject: Value) -> Self {
        Self {
            subject,
            negated: false,
            message: None,
        }
    }

    /// Replaces the generated failure message of every later check.
    /// An empty message keeps the generated one.
    pub fn with_message(&self, message: impl Into<String>) -> Expectation {
        let message = message.into();
        Expectation {
            message: (!message.is_empty()).then_some(message),
            ..self.clone()
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn subject(&self) -> &Value {
        &self.subject
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Returns a new view with inverted polarity. The receiver is unchanged.
    pub fn not(&self) -> Expectation {
        Expectation {
            negated: !self.negated,
            ..self.clone()
        }
    }

    // ------------------------------------------------------------------------
    // Equality
    // ------------------------------------------------------------------------

    /// Strict equality: no coercion, objects and callables by identity.
    pub fn to_be(&self, expected: impl Into<Value>) -> Outcome {
        let expected = expected.into();
        let passed = self.subject.strict_eq(&expected);
        self.check(passed, format!("to be (===) {}", expected), Some(&expected))
    }

    /// Loose equality: type-coercing for scalars, structural for composites.
    pub fn to_equal(&self, expected: impl Into<Value>) -> Outcome {
        let expected = expected.into();
        let passed = self.subject.loose_eq(&expected);
        self.check(passed, format!("to equal (==) {}", expected), Some(&expected))
    }

    /// Loose structural equality restricted to list and map subjects.
    pub fn to_match_array(&self, expected: impl Into<Value>) -> Outcome {
        if !matches!(self.subject, Value::List(_) | Value::Map(_)) {
            return Err(self.type_mismatch("to_match_array", "a List or Map"));
        }
        let expected = expected.into();
        let passed = self.subject.loose_eq(&expected);
        self.check(passed, format!("to match array {}", expected), Some(&expected))
    }

    // ------------------------------------------------------------------------
    // Booleans and nil
    // ------------------------------------------------------------------------

    pub fn to_be_true(&self) -> Outcome {
        let passed = matches!(self.subject, Value::Bool(true));
        self.check(passed, "to be true".to_string(), Some(&Value::Bool(true)))
    }

    pub fn to_be_false(&self) -> Outcome {
        let passed = matches!(self.subject, Value::Bool(false));
        self.check(passed, "to be false".to_string(), Some(&Value::Bool(false)))
    }

    pub fn to_be_null(&self) -> Outcome {
        self.check(self.subject.is_nil(), "to be null".to_string(), Some(&Value::Nil))
    }

    pub fn to_be_defined(&self) -> Outcome {
        self.check(!self.subject.is_nil(), "to be defined".to_string(), None)
    }

    pub fn to_be_truthy(&self) -> Outcome {
        self.check(self.subject.is_truthy(), "to be truthy".to_string(), None)
    }

    pub fn to_be_falsy(&self) -> Outcome {
        self.check(!self.subject.is_truthy(), "to be falsy".to_string(), None)
    }

    // ------------------------------------------------------------------------
    // Numeric ordering
    // ------------------------------------------------------------------------

    pub fn to_be_greater_than(&self, n: impl Into<Value>) -> Outcome {
        self.compare("to_be_greater_than", "greater than", n.into(), |o| {
            o == Ordering::Greater
        })
    }

    pub fn to_be_greater_than_or_equal(&self, n: impl Into<Value>) -> Outcome {
        self.compare("to_be_greater_than_or_equal", "greater than or equal to", n.into(), |o| {
            o != Ordering::Less
        })
    }

    pub fn to_be_less_than(&self, n: impl Into<Value>) -> Outcome {
        self.compare("to_be_less_than", "less than", n.into(), |o| o == Ordering::Less)
    }

    pub fn to_be_less_than_or_equal(&self, n: impl Into<Value>) -> Outcome {
        self.compare("to_be_less_than_or_equal", "less than or equal to", n.into(), |o| {
            o != Ordering::Greater
        })
    }

    // ------------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------------

    /// Substring containment for strings, strict element membership for lists
    /// and map values.
    pub fn to_contain(&self, item: impl Into<Value>) -> Outcome {
        let item = item.into();
        let passed = match (&self.subject, &item) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::String(_), other) => {
                return Err(ArgumentError::type_mismatch(
                    "to_contain",
                    format!("a String subject needs a String item, got {}", other.type_name()),
                )
                .into())
            }
            (Value::List(items), _) => items.iter().any(|v| v.strict_eq(&item)),
            (Value::Map(map), _) => map.values().any(|v| v.strict_eq(&item)),
            _ => return Err(self.type_mismatch("to_contain", "a String, List or Map")),
        };
        self.check(passed, format!("to contain {}", item), Some(&item))
    }

    /// Strings are measured in Unicode code points, collections by element count.
    pub fn to_have_length(&self, n: usize) -> Outcome {
        let Some(actual) = self.subject.length() else {
            return Err(self.type_mismatch("to_have_length", "a String, List or Map"));
        };
        self.check(
            actual == n,
            format!("to have length {} (actual length {})", n, actual),
            Some(&Value::from(n)),
        )
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// Objects match on class name, other values on their type name.
    pub fn to_be_instance_of(&self, kind: &str) -> Outcome {
        let passed = match &self.subject {
            Value::Object(obj) => obj.class == kind,
            other => other.type_name() == kind,
        };
        self.check(passed, format!("to be an instance of {}", kind), None)
    }

    // ------------------------------------------------------------------------
    // Faults
    // ------------------------------------------------------------------------

    /// Passes when invoking the callable subject raises any fault.
    pub fn to_throw(&self) -> Outcome {
        self.throws(None)
    }

    /// Passes when invoking the callable subject raises a fault of `kind`.
    pub fn to_throw_kind(&self, kind: &str) -> Outcome {
        self.throws(Some(kind))
    }

    fn throws(&self, kind: Option<&str>) -> Outcome {
        let Value::Callable(action) = &self.subject else {
            return Err(ArgumentError::not_callable(
                "to_throw",
                format!("subject must be callable, got {}", self.subject.type_name()),
            )
            .into());
        };
        let raised = action.invoke().err();
        let expected = kind.map(|k| k.to_string());
        let message = match (self.negated, kind, &raised) {
            (false, _, None) => Some("expected exception but none was thrown".to_string()),
            (false, Some(k), Some(fault)) if fault.kind() != k => Some(format!(
                "expected exception of kind {} but {} was thrown: {}",
                k,
                fault.kind(),
                fault.message()
            )),
            (false, _, Some(_)) => None,
            (true, None, Some(fault)) => Some(format!(
                "expected no exception but {} was thrown: {}",
                fault.kind(),
                fault.message()
            )),
            (true, Some(k), Some(fault)) if fault.kind() == k => Some(format!(
                "expected no exception of kind {} but one was thrown: {}",
                k,
                fault.message()
            )),
            (true, _, _) => None,
        };
        match message {
            None => Ok(()),
            Some(message) => Err(AssertionFailure {
                message: self.message.clone().unwrap_or(message),
                expected,
                actual: raised.map(|f| f.kind().to_string()),
                negated: self.negated,
            }
            .into()),
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn check(&self, passed: bool, description: String, expected: Option<&Value>) -> Outcome {
        if passed != self.negated {
            return Ok(());
        }
        let not = if self.negated { "not " } else { "" };
        let message = match &self.message {
            Some(custom) => custom.clone(),
            None => format!("Expected {} {}{}", self.subject, not, description),
        };
        Err(AssertionFailure {
            message,
            expected: expected.map(|v| v.to_string()),
            actual: Some(self.subject.to_string()),
            negated: self.negated,
        }
        .into())
    }

    fn compare(
        &self,
        matcher: &'static str,
        relation: &str,
        operand: Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> Outcome {
        let ordering = match (&self.subject, &operand) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))
            }
            _ => {
                return Err(ArgumentError::type_mismatch(
                    matcher,
                    format!(
                        "numeric comparison needs numbers, got {} and {}",
                        self.subject.type_name(),
                        operand.type_name()
                    ),
                )
                .into())
            }
        };
        let passed = ordering.is_some_and(accept);
        self.check(passed, format!("to be {} {}", relation, operand), Some(&operand))
    }

    fn type_mismatch(&self, matcher: &'static str, wanted: &str) -> Fault {
        ArgumentError::type_mismatch(
            matcher,
            format!("subject must be {}, got {}", wanted, self.subject.type_name()),
        )
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_returns_a_new_view() {
        let original = expect(1);
        let negated = original.not();
        assert!(!original.is_negated());
        assert!(negated.is_negated());
        assert!(!negated.not().is_negated());
    }

    #[test]
    fn negated_failure_mentions_not() {
        let err = expect(3).not().to_be(3).unwrap_err();
        match err {
            Fault::Assertion(failure) => {
                assert!(failure.negated);
                assert_eq!(failure.message, "Expected 3 not to be (===) 3");
            }
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn argument_errors_ignore_polarity() {
        let err = expect("five").not().to_be_greater_than(3).unwrap_err();
        assert!(matches!(err, Fault::Argument(_)));
    }
}
