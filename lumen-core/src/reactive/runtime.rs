//! Reactive Runtime
//!
//! The runtime is the shared context that every dependency, subscriber and
//! store of one instance points at. It owns:
//!
//! 1. The [`Tracker`], the single "currently evaluating subscriber" slot that
//!    attributes reads to computations.
//!
//! 2. The notification depth counter. Writes are delivered synchronously, so
//!    a write performed while a subscriber is re-running nests another
//!    notification pass on the stack. The runtime bounds that nesting and
//!    turns runaway recursion into [`Error::RecursionLimitExceeded`].
//!
//! # Threading
//!
//! Everything here is single-threaded: the runtime is shared through `Rc`
//! and mutated through `Cell`/`RefCell`. There is no global registry, so two
//! instances never observe each other's tracking state.

use std::cell::Cell;
use std::rc::Rc;

use tracing::warn;

use super::tracker::Tracker;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

/// Shared reactive context for one instance.
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    tracker: Tracker,
    /// Number of notification passes currently on the stack.
    depth: Cell<usize>,
}

impl Runtime {
    /// Create a runtime with the given configuration.
    pub fn new(config: RuntimeConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            tracker: Tracker::new(),
            depth: Cell::new(0),
        })
    }

    /// Create a runtime with the default configuration.
    pub fn with_defaults() -> Rc<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// The active-subscriber slot.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The configuration this runtime was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Current notification nesting depth (0 when idle).
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enter one notification pass.
    ///
    /// Fails without entering if the pass would exceed the configured bound.
    pub(crate) fn enter_notify(&self) -> Result<NotifyGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_update_depth {
            warn!(
                depth,
                limit = self.config.max_update_depth,
                "notification recursion limit exceeded"
            );
            return Err(Error::RecursionLimitExceeded { depth });
        }
        self.depth.set(depth);
        Ok(NotifyGuard { runtime: self })
    }
}

/// Leaves a notification pass when dropped, including on error unwinds.
pub(crate) struct NotifyGuard<'a> {
    runtime: &'a Runtime,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        let depth = self.runtime.depth.get();
        debug_assert!(depth > 0, "notification depth underflow");
        self.runtime.depth.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_tracks_nested_passes() {
        let runtime = Runtime::with_defaults();
        assert_eq!(runtime.depth(), 0);

        {
            let _outer = runtime.enter_notify().unwrap();
            assert_eq!(runtime.depth(), 1);
            {
                let _inner = runtime.enter_notify().unwrap();
                assert_eq!(runtime.depth(), 2);
            }
            assert_eq!(runtime.depth(), 1);
        }

        assert_eq!(runtime.depth(), 0);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let runtime = Runtime::new(RuntimeConfig::default().with_max_update_depth(2));

        let _a = runtime.enter_notify().unwrap();
        let _b = runtime.enter_notify().unwrap();
        let err = runtime.enter_notify().err().unwrap();

        assert!(matches!(err, Error::RecursionLimitExceeded { depth: 3 }));
        // A rejected pass does not count toward the depth.
        assert_eq!(runtime.depth(), 2);
    }

    #[test]
    fn tracker_starts_idle() {
        let runtime = Runtime::with_defaults();
        assert!(!runtime.tracker().is_active());
        assert!(runtime.tracker().current().is_none());
    }
}
