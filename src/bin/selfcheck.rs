// Runs the framework's own example suites through the public DSL.
// Usage: cargo run --bin selfcheck -- [--filter TEXT] [--format json] [--verbose]
//
// SELFCHECK_BROKEN=failing adds a suite with a failing and an erroring test.
// SELFCHECK_BROKEN=undeclared registers a test outside any describe().

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use testify::{cli, expect, expect_fn, skip, Fault, Object, Outcome, Testify, Value};

fn main() {
    cli::main_with(register)
}

const BROKEN_VAR: &str = "SELFCHECK_BROKEN";

fn register(t: &mut Testify) -> Outcome {
    match std::env::var(BROKEN_VAR).as_deref() {
        Ok("failing") => t.describe("Broken", |s| {
            s.it("fails an assertion", || expect(1 + 1).to_be(3))?;
            s.it("raises a fault", || Err(Fault::raise("Runtime", "boom")))
        })?,
        Ok("undeclared") => t.it("outside any suite", || Ok(()))?,
        _ => {}
    }

    t.describe("Math basics", |s| {
        s.it("adds numbers correctly", || expect(2 + 2).to_be(4))?;
        s.it("compares across int and float loosely", || {
            expect(5).to_equal(5.0)?;
            expect(5).not().to_be(5.0)
        })?;
        s.test("orders numbers", || {
            expect(5).to_be_greater_than(3)?;
            expect(3).to_be_less_than_or_equal(3)?;
            expect(2.5).to_be_greater_than_or_equal(2)
        })?;
        s.it_skip("rounds halves to even", || expect(2.5).to_be(2))
    })?;

    t.describe("Strings and lists", |s| {
        s.it("finds substrings", || expect("hello world").to_contain("world"))?;
        s.it("counts code points", || expect("héllo").to_have_length(5))?;
        s.it("checks membership strictly", || {
            let names = vec!["alpha", "beta"];
            expect(names.clone()).to_contain("beta")?;
            expect(names).not().to_contain("gamma")
        })?;
        s.it("matches arrays loosely", || {
            expect(vec![Value::from(1), Value::from("2")]).to_match_array(vec![1, 2])
        })
    })?;

    t.describe("Lifecycle", |s| {
        let setups = Rc::new(Cell::new(0));
        let log = Rc::new(RefCell::new(Vec::new()));

        let counter = Rc::clone(&setups);
        s.before_all(move || {
            counter.set(counter.get() + 1);
            Ok(())
        })?;
        let entries = Rc::clone(&log);
        s.before_each(move || {
            entries.borrow_mut().push("outer");
            Ok(())
        })?;

        let counter = Rc::clone(&setups);
        s.it("ran beforeAll once", move || expect(counter.get()).to_be(1))?;

        let entries = Rc::clone(&log);
        s.describe("nested", move |s| {
            let inner = Rc::clone(&entries);
            s.before_each(move || {
                inner.borrow_mut().push("inner");
                Ok(())
            })?;
            let seen = Rc::clone(&entries);
            s.it("runs outer hooks first", move || {
                let seen = seen.borrow();
                expect(seen[seen.len() - 2..].to_vec()).to_equal(vec!["outer", "inner"])
            })
        })?;

        let counter = Rc::clone(&setups);
        s.after_all(move || expect(counter.get()).to_be(1))
    })?;

    t.describe("Faults", |s| {
        s.it("detects a raised kind", || {
            expect_fn(|| Err(Fault::raise("InvalidArgument", "bad input")))
                .to_throw_kind("InvalidArgument")
        })?;
        s.it("detects a quiet callable", || expect_fn(|| Ok(())).not().to_throw())?;
        s.it("treats panics as faults", || {
            expect_fn(|| -> Outcome { panic!("kaboom") }).to_throw_kind("panic")
        })?;
        s.it("can skip itself", || skip("nothing to check on this platform"))
    })?;

    t.describe("Objects", |s| {
        s.it("compares by identity", || {
            let point = Object::new("Point").with_field("x", 1).into_value();
            expect(point.clone()).to_be(point.clone())?;
            expect(point).to_be_instance_of("Point")
        })?;
        s.it("distinguishes equal objects", || {
            let a = Object::new("Point").with_field("x", 1).into_value();
            let b = Object::new("Point").with_field("x", 1).into_value();
            expect(a.clone()).not().to_be(b.clone())?;
            expect(a).to_equal(b)
        })
    })
}
