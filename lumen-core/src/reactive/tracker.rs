//! Tracker
//!
//! The tracker records which subscriber is currently evaluating. When a
//! reactive cell is read, the cell asks the tracker for the active
//! subscriber and registers it as a dependent.
//!
//! # Single slot, save and restore
//!
//! There is exactly one slot. Nested evaluation happens when a render reads
//! a computed value whose cache is stale: the computed must run its own
//! getter in the middle of the render. Whoever installs a subscriber saves
//! the previous occupant and puts it back afterwards, so the outer
//! computation keeps collecting its own reads once the inner one returns.
//!
//! [`Tracker::enter`] returns a guard that performs the restore on drop.
//! Restoration therefore also happens when a getter returns an error or
//! panics; an error in a computed can never leave a stale subscriber in the
//! slot.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::subscriber::{Subscriber, SubscriberId};

/// The single active-subscriber slot.
#[derive(Debug, Default)]
pub struct Tracker {
    slot: RefCell<Option<Rc<Subscriber>>>,
}

impl Tracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `subscriber` as the active subscriber.
    ///
    /// The previous occupant is restored when the returned guard drops.
    pub fn enter(&self, subscriber: Rc<Subscriber>) -> TrackerGuard<'_> {
        let installed = subscriber.id();
        let saved = self.slot.replace(Some(subscriber));
        trace!(
            subscriber = ?installed,
            outer = ?saved.as_ref().map(|s| s.id()),
            "tracker enter"
        );
        TrackerGuard {
            tracker: self,
            installed,
            saved,
        }
    }

    /// The subscriber currently evaluating, if any.
    pub fn current(&self) -> Option<Rc<Subscriber>> {
        self.slot.borrow().clone()
    }

    /// Id of the subscriber currently evaluating, if any.
    pub fn current_id(&self) -> Option<SubscriberId> {
        self.slot.borrow().as_ref().map(|s| s.id())
    }

    /// Check whether a subscriber is currently evaluating.
    pub fn is_active(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

/// Restores the tracker's previous occupant when dropped.
pub struct TrackerGuard<'a> {
    tracker: &'a Tracker,
    installed: SubscriberId,
    saved: Option<Rc<Subscriber>>,
}

impl Drop for TrackerGuard<'_> {
    fn drop(&mut self) {
        let popped = self.tracker.slot.replace(self.saved.take());

        // Guards must unwind in LIFO order.
        if let Some(popped) = popped {
            debug_assert_eq!(
                popped.id(),
                self.installed,
                "Tracker mismatch: expected {:?}, got {:?}",
                self.installed,
                popped.id()
            );
        }
    }
}
