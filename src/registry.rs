//! Suite registry: the declaration-phase tree of suites, tests and hooks.
//!
//! Suites live in an arena owned by [`SuiteRegistry`] and refer to their
//! parent by [`SuiteId`], so ownership is strictly top-down. The suite being
//! declared is tracked on an explicit stack: `begin_suite` pushes, `end_suite`
//! pops, and tests or hooks always attach to the top of the stack.
//!
//! ```rust
//! use testify::{expect, SuiteRegistry};
//!
//! let mut registry = SuiteRegistry::new();
//! registry
//!     .describe("math", |s| {
//!         s.it("adds", || expect(1 + 1).to_be(2))?;
//!         s.describe("nested", |s| s.it("subtracts", || expect(3 - 1).to_be(2)))
//!     })
//!     .unwrap();
//! assert_eq!(registry.test_count(), 2);
//! ```

use serde::Serialize;
use tracing::trace;

use crate::action::Action;
use crate::errors::{Fault, Outcome, UsageError};
use crate::lifecycle::{HookKind, LifecycleRegistry};

/// Index of a suite inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(usize);

impl SuiteId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a test participates in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    #[default]
    Normal,
    /// Registered as skipped; never runs.
    Skip,
    /// Focused; when any focused test exists, only focused tests run.
    Only,
}

/// A registered test. Immutable once registered.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub action: Action,
    pub mode: TestMode,
}

/// An entry of a suite in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Test(usize),
    Suite(SuiteId),
}

#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub parent: Option<SuiteId>,
    pub tests: Vec<TestCase>,
    pub hooks: LifecycleRegistry,
    pub children: Vec<SuiteId>,
    members: Vec<Member>,
}

impl Suite {
    fn new(name: String, parent: Option<SuiteId>) -> Self {
        Self {
            name,
            parent,
            tests: Vec::new(),
            hooks: LifecycleRegistry::new(),
            children: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Tests and nested suites interleaved in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

/// Caller-owned registry of every declared suite.
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    suites: Vec<Suite>,
    roots: Vec<SuiteId>,
    active: Vec<SuiteId>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Declaration primitives
    // ------------------------------------------------------------------------

    /// Opens a suite as a child of the active suite (or as a root) and makes
    /// it active.
    pub fn begin_suite(&mut self, name: impl Into<String>) -> SuiteId {
        let id = SuiteId(self.suites.len());
        let parent = self.active.last().copied();
        let name = name.into();
        trace!(suite = %name, parent = ?parent, "begin suite");
        self.suites.push(Suite::new(name, parent));
        match parent {
            Some(parent) => {
                let p = &mut self.suites[parent.0];
                p.children.push(id);
                p.members.push(Member::Suite(id));
            }
            None => self.roots.push(id),
        }
        self.active.push(id);
        id
    }

    /// Closes the active suite.
    pub fn end_suite(&mut self) -> Result<SuiteId, UsageError> {
        self.active.pop().ok_or_else(UsageError::unbalanced_end)
    }

    pub fn add_test(&mut self, name: impl Into<String>, action: Action) -> Result<(), UsageError> {
        self.add_test_with_mode(name, action, TestMode::Normal)
    }

    pub fn add_test_with_mode(
        &mut self,
        name: impl Into<String>,
        action: Action,
        mode: TestMode,
    ) -> Result<(), UsageError> {
        let id = self.require_active("a test")?;
        let suite = &mut self.suites[id.0];
        suite.members.push(Member::Test(suite.tests.len()));
        suite.tests.push(TestCase {
            name: name.into(),
            action,
            mode,
        });
        Ok(())
    }

    pub fn add_hook(&mut self, kind: HookKind, action: Action) -> Result<(), UsageError> {
        let id = self.require_active("a hook")?;
        self.suites[id.0].hooks.add(kind, action);
        Ok(())
    }

    fn require_active(&self, what: &str) -> Result<SuiteId, UsageError> {
        self.active
            .last()
            .copied()
            .ok_or_else(|| UsageError::no_active_suite(what))
    }

    // ------------------------------------------------------------------------
    // Registration DSL
    // ------------------------------------------------------------------------

    /// Declares a suite and runs `body` with it active. The suite is closed
    /// even when `body` fails; the failure is then returned.
    pub fn describe<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: FnOnce(&mut SuiteRegistry) -> Outcome,
    {
        self.begin_suite(name);
        let declared = body(self);
        self.end_suite()?;
        declared
    }

    pub fn it<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        Ok(self.add_test(name, Action::new(body))?)
    }

    /// Synonym for [`SuiteRegistry::it`].
    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.it(name, body)
    }

    pub fn it_skip<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        Ok(self.add_test_with_mode(name, Action::new(body), TestMode::Skip)?)
    }

    pub fn it_only<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        Ok(self.add_test_with_mode(name, Action::new(body), TestMode::Only)?)
    }

    /// Synonym for [`SuiteRegistry::it_skip`].
    pub fn xit<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.it_skip(name, body)
    }

    /// Synonym for [`SuiteRegistry::it_only`].
    pub fn fit<F>(&mut self, name: impl Into<String>, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.it_only(name, body)
    }

    pub fn before_all<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.hook(HookKind::BeforeAll, body)
    }

    pub fn after_all<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.hook(HookKind::AfterAll, body)
    }

    pub fn before_each<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.hook(HookKind::BeforeEach, body)
    }

    pub fn after_each<F>(&mut self, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.hook(HookKind::AfterEach, body)
    }

    fn hook<F>(&mut self, kind: HookKind, body: F) -> Outcome
    where
        F: Fn() -> Outcome + 'static,
    {
        self.add_hook(kind, Action::new(body)).map_err(Fault::from)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn suite(&self, id: SuiteId) -> &Suite {
        &self.suites[id.0]
    }

    pub fn roots(&self) -> &[SuiteId] {
        &self.roots
    }

    /// The suite currently being declared, if any.
    pub fn active(&self) -> Option<SuiteId> {
        self.active.last().copied()
    }

    pub fn is_declaring(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }

    /// True when any test was registered with [`TestMode::Only`].
    pub fn has_focused(&self) -> bool {
        self.suites
            .iter()
            .flat_map(|s| &s.tests)
            .any(|t| t.mode == TestMode::Only)
    }

    /// Suites from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: SuiteId) -> Vec<SuiteId> {
        let mut chain = vec![id];
        let mut cursor = self.suite(id).parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.suite(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Display path such as `outer > inner`.
    pub fn path(&self, id: SuiteId) -> String {
        self.ancestry(id)
            .into_iter()
            .map(|s| self.suite(s).name.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Every suite in depth-first declaration order.
    pub fn walk(&self) -> Vec<SuiteId> {
        let mut out = Vec::with_capacity(self.suites.len());
        for root in &self.roots {
            self.walk_from(*root, &mut out);
        }
        out
    }

    fn walk_from(&self, id: SuiteId, out: &mut Vec<SuiteId>) {
        out.push(id);
        for child in &self.suite(id).children {
            self.walk_from(*child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Outcome {
        Ok(())
    }

    #[test]
    fn adding_a_test_without_a_suite_is_a_usage_error() {
        let mut registry = SuiteRegistry::new();
        let err = registry.it("orphan", noop).unwrap_err();
        assert!(matches!(err, Fault::Usage(_)));
        assert!(err.to_string().contains("no active suite"));

        let err = registry.before_each(noop).unwrap_err();
        assert!(matches!(err, Fault::Usage(_)));
    }

    #[test]
    fn nested_suites_record_parent_and_order() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("outer", |s| {
                s.it("a", noop)?;
                s.describe("inner", |s| s.it("b", noop))?;
                s.it("c", noop)
            })
            .unwrap();

        let outer = registry.roots()[0];
        let suite = registry.suite(outer);
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.children.len(), 1);
        let inner = suite.children[0];
        assert_eq!(
            suite.members(),
            &[Member::Test(0), Member::Suite(inner), Member::Test(1)]
        );
        assert_eq!(registry.suite(inner).parent, Some(outer));
        assert_eq!(registry.path(inner), "outer > inner");
        assert_eq!(registry.ancestry(inner), vec![outer, inner]);
        assert!(!registry.is_declaring());
    }

    #[test]
    fn describe_closes_the_suite_when_the_body_fails() {
        let mut registry = SuiteRegistry::new();
        let err = registry
            .describe("broken", |_| Err(Fault::raise("Declaration", "bad fixture")))
            .unwrap_err();
        assert_eq!(err.kind(), "Declaration");
        assert!(!registry.is_declaring());
    }

    #[test]
    fn unbalanced_end_is_rejected() {
        let mut registry = SuiteRegistry::new();
        assert!(registry.end_suite().is_err());
    }

    #[test]
    fn duplicate_test_names_are_kept() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("dupes", |s| {
                s.it("same", noop)?;
                s.it("same", noop)
            })
            .unwrap();
        assert_eq!(registry.test_count(), 2);
    }

    #[test]
    fn walk_is_depth_first() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("a", |s| {
                s.describe("a1", |_| Ok(()))?;
                s.describe("a2", |_| Ok(()))
            })
            .unwrap();
        registry.describe("b", |_| Ok(())).unwrap();
        let names: Vec<_> = registry
            .walk()
            .into_iter()
            .map(|id| registry.suite(id).name.clone())
            .collect();
        assert_eq!(names, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn focused_tests_are_detected() {
        let mut registry = SuiteRegistry::new();
        registry.describe("s", |s| s.it("plain", noop)).unwrap();
        assert!(!registry.has_focused());
        registry.describe("t", |s| s.it_only("focus", noop)).unwrap();
        assert!(registry.has_focused());
    }

    #[test]
    fn short_aliases_set_the_mode() {
        let mut registry = SuiteRegistry::new();
        registry
            .describe("s", |s| {
                s.xit("skipped", noop)?;
                s.fit("focused", noop)
            })
            .unwrap();
        let modes: Vec<_> = registry
            .suite(registry.roots()[0])
            .tests
            .iter()
            .map(|t| t.mode)
            .collect();
        assert_eq!(modes, vec![TestMode::Skip, TestMode::Only]);
    }
}
