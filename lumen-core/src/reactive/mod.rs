//! Reactive Primitives
//!
//! This module implements the dependency-tracking engine: stores, computeds
//! and the subscribers that re-run when state changes.
//!
//! # Concepts
//!
//! ## Dependencies and Stores
//!
//! A [`Store`] turns each property of a plain state object into a reactive
//! cell backed by a [`Dependency`]. Reading a cell while a subscriber is
//! evaluating registers that subscriber on the cell. Writing a different
//! value notifies every registered subscriber before the write returns.
//!
//! ## Subscribers
//!
//! A [`Subscriber`] wraps a computation. Eager subscribers (renders) re-run
//! on every notification; lazy ones (computeds) only mark themselves dirty.
//!
//! ## Computeds
//!
//! A [`Computed`] caches a derived value and recomputes it on the first read
//! after one of its inputs changed.
//!
//! # Implementation Notes
//!
//! The [`Runtime`] owns a [`Tracker`], a single slot naming the subscriber
//! that is currently evaluating. Nested evaluation (a render reading a stale
//! computed) saves and restores that slot, so reads are always attributed to
//! the innermost running computation.
//!
//! Everything is synchronous and single-threaded. There is no scheduler: a
//! write re-runs affected renders immediately, and each write is one
//! complete re-render.

mod computed;
mod dependency;
mod runtime;
mod store;
mod subscriber;
mod tracker;

pub use computed::Computed;
pub use dependency::{DepId, Dependency};
pub use runtime::Runtime;
pub use store::Store;
pub use subscriber::{Subscriber, SubscriberId, SubscriberKind};
pub use tracker::{Tracker, TrackerGuard};
