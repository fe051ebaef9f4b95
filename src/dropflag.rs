//! This module is for testing only

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::thread::LocalKey;

pub type DropFlag<T> = Rc<RefCell<T>>;

pub struct Droppable {
    pub dropflag: DropFlag<bool>,
}

impl Drop for Droppable {
    fn drop(&mut self) {
        *self.dropflag.borrow_mut() = true;
    }
}

thread_local! {
    static LIVE: Cell<isize> = Cell::new(0);
    static CLONES_LEFT: Cell<usize> = Cell::new(usize::MAX);
    static DEFAULTS_LEFT: Cell<usize> = Cell::new(usize::MAX);
}

fn spend(budget: &'static LocalKey<Cell<usize>>, what: &str) {
    budget.with(|left| {
        if left.get() == 0 {
            panic!("{} budget exhausted", what);
        }
        left.set(left.get() - 1);
    });
}

/// Element type that counts its live instances per thread, and whose `Clone`
/// and `Default` can be made to panic after a number of successful calls.
///
/// Each test runs on its own thread, so counters start fresh.
pub struct Tracked {
    value: i32,
}

impl Tracked {
    pub fn new(value: i32) -> Tracked {
        LIVE.with(|live| live.set(live.get() + 1));
        Tracked { value }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Instances constructed and not yet dropped on this thread.
    pub fn live() -> isize {
        LIVE.with(Cell::get)
    }

    /// Lets `n` more clones succeed, then panics.
    pub fn fail_clone_after(n: usize) {
        CLONES_LEFT.with(|left| left.set(n));
    }

    /// Lets `n` more default constructions succeed, then panics.
    pub fn fail_default_after(n: usize) {
        DEFAULTS_LEFT.with(|left| left.set(n));
    }

    pub fn reset_budgets() {
        Tracked::fail_clone_after(usize::MAX);
        Tracked::fail_default_after(usize::MAX);
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        spend(&CLONES_LEFT, "clone");
        Tracked::new(self.value)
    }
}

impl Default for Tracked {
    fn default() -> Self {
        spend(&DEFAULTS_LEFT, "default");
        Tracked::new(0)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

#[test]
fn dropflag() {
    let flag = DropFlag::new(RefCell::new(false));
    let droppable = Droppable { dropflag: flag.clone() };
    assert_eq!(false, *flag.borrow());
    std::mem::drop(droppable);
    assert_eq!(true, *flag.borrow());
}

#[test]
fn tracked_counts_and_fails_on_budget() {
    let a = Tracked::new(5);
    Tracked::fail_clone_after(1);
    let b = a.clone();
    assert_eq!(2, Tracked::live());
    assert!(std::panic::catch_unwind(|| b.clone()).is_err());
    assert_eq!(2, Tracked::live());
    Tracked::reset_budgets();
    drop(a);
    drop(b);
    assert_eq!(0, Tracked::live());
}
