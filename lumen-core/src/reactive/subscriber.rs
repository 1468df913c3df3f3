//! Subscriber types for the reactive system.
//!
//! A Subscriber (sometimes called a watcher) wraps a zero-argument
//! computation and remembers which dependencies that computation read. The
//! render function of an instance and every computed definition each get
//! exactly one subscriber, created once and re-run for the instance's
//! lifetime.
//!
//! # Eager and lazy
//!
//! Both kinds share the same `get`/`update`/`depend` core and differ only in
//! what a notification does:
//!
//! - **Eager** subscribers (renders) re-run their getter immediately and
//!   unconditionally.
//! - **Lazy** subscribers (computeds) only set their `dirty` flag; the next
//!   read of the computed re-runs the getter.
//!
//! # Dependency bookkeeping
//!
//! Each evaluation starts with an empty "recorded" list. Reads during the
//! evaluation append to it (once per dependency), and when the getter returns
//! the list replaces the previous one. Subscription on the dependency side
//! happens only the first time a dependency id is ever seen, so dependencies
//! that a later evaluation no longer reads stay subscribed.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::dependency::{DepId, Dependency};
use super::runtime::Runtime;
use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Each subscriber (render or computed) gets a unique ID when created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter so ids stay unique across runtimes.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// How a subscriber reacts to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberKind {
    /// Re-run immediately.
    Eager,

    /// Mark dirty and re-run on next read.
    Lazy {
        /// Whether the cached value is stale.
        dirty: bool,
    },
}

type Getter = Box<dyn Fn() -> Result<Value>>;

/// A computation that tracks the reactive cells it reads.
pub struct Subscriber {
    id: SubscriberId,
    runtime: Rc<Runtime>,
    kind: Cell<SubscriberKind>,
    getter: Getter,

    /// Every dependency this subscriber has ever subscribed to.
    dep_ids: RefCell<HashSet<DepId>>,

    /// Dependencies read by the last completed evaluation.
    deps: RefCell<Vec<Rc<Dependency>>>,

    /// Dependencies read so far by the evaluation in progress.
    new_deps: RefCell<Vec<Rc<Dependency>>>,

    value: RefCell<Value>,
    run_count: Cell<usize>,
}

impl Subscriber {
    /// Create an eager subscriber and evaluate it once.
    ///
    /// The initial evaluation establishes the first set of dependencies; an
    /// error from it is returned and the subscriber is discarded.
    pub fn eager<F>(runtime: Rc<Runtime>, getter: F) -> Result<Rc<Self>>
    where
        F: Fn() -> Result<Value> + 'static,
    {
        let subscriber = Self::build(runtime, SubscriberKind::Eager, Box::new(getter));
        subscriber.get()?;
        Ok(subscriber)
    }

    /// Create a lazy subscriber. Nothing runs until the first evaluation.
    pub fn lazy<F>(runtime: Rc<Runtime>, getter: F) -> Rc<Self>
    where
        F: Fn() -> Result<Value> + 'static,
    {
        Self::build(runtime, SubscriberKind::Lazy { dirty: true }, Box::new(getter))
    }

    fn build(runtime: Rc<Runtime>, kind: SubscriberKind, getter: Getter) -> Rc<Self> {
        Rc::new(Self {
            id: SubscriberId::new(),
            runtime,
            kind: Cell::new(kind),
            getter,
            dep_ids: RefCell::new(HashSet::new()),
            deps: RefCell::new(Vec::new()),
            new_deps: RefCell::new(Vec::new()),
            value: RefCell::new(Value::Null),
            run_count: Cell::new(0),
        })
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The runtime this subscriber tracks against.
    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// Current kind, including the dirty flag for lazy subscribers.
    pub fn kind(&self) -> SubscriberKind {
        self.kind.get()
    }

    /// Whether notifications defer recomputation.
    pub fn is_lazy(&self) -> bool {
        matches!(self.kind.get(), SubscriberKind::Lazy { .. })
    }

    /// Whether a lazy subscriber's cached value is stale. Always false for
    /// eager subscribers.
    pub fn is_dirty(&self) -> bool {
        matches!(self.kind.get(), SubscriberKind::Lazy { dirty: true })
    }

    /// Evaluate the getter with this subscriber installed in the tracker.
    ///
    /// The tracker's previous occupant is restored before this returns, and
    /// the dependencies read during this call become the recorded set.
    pub fn get(self: &Rc<Self>) -> Result<Value> {
        let result = {
            let _tracking = self.runtime.tracker().enter(Rc::clone(self));
            (self.getter)()
        };

        let recorded = std::mem::take(&mut *self.new_deps.borrow_mut());
        *self.deps.borrow_mut() = recorded;
        self.run_count.set(self.run_count.get() + 1);

        let value = result?;
        *self.value.borrow_mut() = value.clone();
        Ok(value)
    }

    /// React to a change in one of the dependencies.
    pub fn update(self: &Rc<Self>) -> Result<()> {
        match self.kind.get() {
            SubscriberKind::Eager => {
                self.get()?;
            }
            SubscriberKind::Lazy { .. } => {
                self.kind.set(SubscriberKind::Lazy { dirty: true });
            }
        }
        Ok(())
    }

    /// Recompute a lazy subscriber's value and clear its dirty flag.
    ///
    /// On error the flag stays set so the next read retries.
    pub fn evaluate(self: &Rc<Self>) -> Result<()> {
        self.get()?;
        if self.is_lazy() {
            self.kind.set(SubscriberKind::Lazy { dirty: false });
        }
        Ok(())
    }

    /// Subscribe the tracker's active subscriber to every dependency this
    /// subscriber recorded.
    ///
    /// Reading a computed from a render makes the render depend on the
    /// computed's inputs directly, so a write to those inputs re-runs the
    /// render as well as dirtying the computed.
    pub fn depend(&self) {
        let deps = self.deps.borrow().clone();
        for dep in &deps {
            dep.depend();
        }
    }

    /// Record a read of `dep` during the current evaluation.
    pub fn add_dep(self: &Rc<Self>, dep: &Rc<Dependency>) {
        let id = dep.id();

        {
            let mut new_deps = self.new_deps.borrow_mut();
            if !new_deps.iter().any(|d| d.id() == id) {
                new_deps.push(Rc::clone(dep));
            }
        }

        let first_time = self.dep_ids.borrow_mut().insert(id);
        if first_time {
            dep.add_sub(self);
        }
    }

    /// The last value the getter produced (`Null` before the first run).
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Ids of the dependencies recorded by the last evaluation, in read order.
    pub fn dependency_ids(&self) -> Vec<DepId> {
        self.deps.borrow().iter().map(|d| d.id()).collect()
    }

    /// Number of dependencies recorded by the last evaluation.
    pub fn dependency_count(&self) -> usize {
        self.deps.borrow().len()
    }

    /// Ids of every dependency this subscriber is subscribed to.
    pub fn subscribed_ids(&self) -> HashSet<DepId> {
        self.dep_ids.borrow().clone()
    }

    /// Number of times the getter has been invoked.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("kind", &self.kind.get())
            .field("run_count", &self.run_count.get())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}
