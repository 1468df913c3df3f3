//! Dependency
//!
//! One `Dependency` exists per reactive cell. It keeps the ordered list of
//! subscribers that have read the cell and notifies them when the cell's
//! value changes.
//!
//! # Ownership
//!
//! A dependency refers to its subscribers weakly. Subscribers are owned by
//! whoever created them (an instance owns its render subscriber and its
//! computeds), and their getters usually capture the store that owns this
//! dependency, so strong references here would form a cycle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::trace;

use super::runtime::Runtime;
use super::subscriber::Subscriber;
use crate::error::Result;

/// Unique identifier for a dependency.
///
/// Ids increase monotonically and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(u64);

impl DepId {
    /// Generate a new unique dependency ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for DepId {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber list backing a single reactive cell.
#[derive(Debug)]
pub struct Dependency {
    id: DepId,
    runtime: Rc<Runtime>,
    /// Subscribers in subscription order. Most cells are read by one or two
    /// computations, so the list rarely spills to the heap.
    subs: RefCell<SmallVec<[Weak<Subscriber>; 4]>>,
}

impl Dependency {
    /// Create a dependency bound to `runtime`.
    pub fn new(runtime: Rc<Runtime>) -> Rc<Self> {
        Rc::new(Self {
            id: DepId::new(),
            runtime,
            subs: RefCell::new(SmallVec::new()),
        })
    }

    /// Get the dependency's unique ID.
    pub fn id(&self) -> DepId {
        self.id
    }

    /// Append a subscriber. Deduplication is the subscriber's job.
    pub fn add_sub(&self, subscriber: &Rc<Subscriber>) {
        self.subs.borrow_mut().push(Rc::downgrade(subscriber));
    }

    /// Register the tracker's active subscriber, if any, on this dependency.
    pub fn depend(self: &Rc<Self>) {
        if let Some(target) = self.runtime.tracker().current() {
            target.add_dep(self);
        }
    }

    /// Run `update()` on every live subscriber, in subscription order.
    ///
    /// The list is snapshotted first; subscribers added while the pass runs
    /// are not visited by it. The first error aborts the pass and is
    /// returned as-is.
    pub fn notify(&self) -> Result<()> {
        let _pass = self.runtime.enter_notify()?;

        let subs: SmallVec<[Rc<Subscriber>; 4]> = self
            .subs
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for sub in subs {
            trace!(dep = ?self.id, subscriber = ?sub.id(), depth = self.runtime.depth(), "notify");
            sub.update()?;
        }

        Ok(())
    }

    /// Number of subscribers still alive.
    pub fn subscriber_count(&self) -> usize {
        self.subs
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }
}
