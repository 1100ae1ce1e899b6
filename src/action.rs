//! Zero-argument actions: test bodies, hook bodies and callable subjects.
//!
//! Everything the engine runs is an [`Action`]: a shared closure that takes no
//! arguments and reports success or a [`Fault`]. Panics escaping the closure are
//! caught here and turned into an unexpected fault of kind `"panic"`, so the
//! engine only ever sees `Outcome` values.
//!
//! Catching does not silence the process panic hook: with the default hook a
//! panicking body still prints `thread '...' panicked at ...` to stderr. The
//! CLI front end installs a hook that consults [`is_invoking`] and logs those
//! panics through `tracing` instead.

use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::errors::{Fault, Outcome};

/// Kind name given to faults produced from a caught panic.
pub const PANIC_KIND: &str = "panic";

thread_local! {
    static INVOKING: Cell<usize> = Cell::new(0);
}

/// True while the current thread is inside [`Action::invoke`], i.e. while a
/// panic would be caught and reported as a fault.
pub fn is_invoking() -> bool {
    INVOKING.with(|depth| depth.get() > 0)
}

/// A shared, zero-argument callback that may fail.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn() -> Outcome>);

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Outcome + 'static,
    {
        Self(Rc::new(f))
    }

    /// Runs the closure, converting a panic into [`Fault::Unexpected`].
    pub fn invoke(&self) -> Outcome {
        INVOKING.with(|depth| depth.set(depth.get() + 1));
        let caught = catch_unwind(AssertUnwindSafe(|| (self.0)()));
        INVOKING.with(|depth| depth.set(depth.get() - 1));
        match caught {
            Ok(outcome) => outcome,
            Err(payload) => Err(Fault::raise(PANIC_KIND, panic_message(payload.as_ref()))),
        }
    }

    /// Identity comparison: two actions are the same only if they share a closure.
    pub fn ptr_eq(&self, other: &Action) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test body panicked".to_string()
    }
}
