//! Per-suite lifecycle hooks.

use std::fmt;

use serde::Serialize;

use crate::action::Action;
use crate::errors::Outcome;

/// The four hook kinds a suite can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl HookKind {
    pub const ALL: [HookKind; 4] = [
        HookKind::BeforeAll,
        HookKind::AfterAll,
        HookKind::BeforeEach,
        HookKind::AfterEach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::BeforeAll => "beforeAll",
            HookKind::AfterAll => "afterAll",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
        }
    }

    fn slot(self) -> usize {
        match self {
            HookKind::BeforeAll => 0,
            HookKind::AfterAll => 1,
            HookKind::BeforeEach => 2,
            HookKind::AfterEach => 3,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered hook callbacks for one suite, one list per [`HookKind`].
///
/// Mutated only while the owning suite is being declared.
#[derive(Debug, Clone, Default)]
pub struct LifecycleRegistry {
    hooks: [Vec<Action>; 4],
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: HookKind, callback: Action) {
        self.hooks[kind.slot()].push(callback);
    }

    pub fn hooks(&self, kind: HookKind) -> &[Action] {
        &self.hooks[kind.slot()]
    }

    pub fn len(&self, kind: HookKind) -> usize {
        self.hooks[kind.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.iter().all(Vec::is_empty)
    }

    /// Runs every callback of `kind` in registration order, stopping at the
    /// first fault and returning it.
    pub fn run_all(&self, kind: HookKind) -> Outcome {
        for hook in self.hooks(kind) {
            hook.invoke()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::errors::Fault;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> Action {
        let log = Rc::clone(log);
        Action::new(move || {
            log.borrow_mut().push(label);
            Ok(())
        })
    }

    #[test]
    fn run_all_preserves_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = LifecycleRegistry::new();
        hooks.add(HookKind::BeforeEach, recorder(&log, "first"));
        hooks.add(HookKind::BeforeEach, recorder(&log, "second"));
        hooks.add(HookKind::AfterEach, recorder(&log, "after"));

        hooks.run_all(HookKind::BeforeEach).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn run_all_stops_at_first_fault() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = LifecycleRegistry::new();
        hooks.add(HookKind::BeforeAll, recorder(&log, "ran"));
        hooks.add(
            HookKind::BeforeAll,
            Action::new(|| Err(Fault::raise("Setup", "database offline"))),
        );
        hooks.add(HookKind::BeforeAll, recorder(&log, "never"));

        let err = hooks.run_all(HookKind::BeforeAll).unwrap_err();
        assert_eq!(err.kind(), "Setup");
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[test]
    fn kinds_are_kept_apart() {
        let mut hooks = LifecycleRegistry::new();
        assert!(hooks.is_empty());
        hooks.add(HookKind::AfterAll, Action::new(|| Ok(())));
        assert_eq!(hooks.len(HookKind::AfterAll), 1);
        assert_eq!(hooks.len(HookKind::BeforeAll), 0);
        assert!(hooks.run_all(HookKind::BeforeAll).is_ok());
    }
}
