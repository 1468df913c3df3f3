//! Computed Values
//!
//! A computed is a cached value derived from other reactive state. It is
//! backed by a lazy [`Subscriber`].
//!
//! # How Computeds Work
//!
//! 1. Creating a computed runs nothing. It starts dirty.
//!
//! 2. Reading a dirty computed evaluates its function with the computed's
//!    subscriber installed in the tracker. The outer subscriber (for example
//!    a render in progress) is saved first and restored afterwards. The
//!    result is cached and the dirty flag cleared.
//!
//! 3. Reading a clean computed returns the cache without running anything.
//!
//! 4. When a cell the computed read is written, the computed is only marked
//!    dirty.
//!
//! 5. If the read happens inside another computation, that outer computation
//!    is subscribed to every cell the computed read. Writing one of those
//!    cells therefore re-runs the outer computation too, and its re-read
//!    finds the computed dirty.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::runtime::Runtime;
use super::subscriber::Subscriber;
use crate::error::Result;

/// A named, cached derived value.
pub struct Computed {
    name: String,
    watcher: Rc<Subscriber>,
}

impl Computed {
    /// Create a computed. The function runs on first read.
    pub fn new<F>(runtime: Rc<Runtime>, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn() -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            watcher: Subscriber::lazy(runtime, compute),
        }
    }

    /// The name this computed is exposed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the value, recomputing if dirty.
    pub fn value(&self) -> Result<Value> {
        if self.watcher.is_dirty() {
            self.watcher.evaluate()?;
        }
        if self.watcher.runtime().tracker().is_active() {
            self.watcher.depend();
        }
        Ok(self.watcher.value())
    }

    /// Whether the next read will recompute.
    pub fn is_dirty(&self) -> bool {
        self.watcher.is_dirty()
    }

    /// Number of times the function has run.
    pub fn evaluation_count(&self) -> usize {
        self.watcher.run_count()
    }

    /// The lazy subscriber backing this computed.
    pub fn subscriber(&self) -> &Rc<Subscriber> {
        &self.watcher
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("name", &self.name)
            .field("dirty", &self.is_dirty())
            .field("evaluation_count", &self.evaluation_count())
            .finish()
    }
}
