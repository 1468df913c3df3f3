//! Renderer Backend
//!
//! The interface between the reconciler and whatever actually displays the
//! tree. The reconciler never inspects host nodes; it only passes
//! [`HostHandle`]s back to the backend that issued them.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque reference to a materialized host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostHandle(u64);

impl HostHandle {
    /// Wrap a backend-specific raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for HostHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Operations the reconciler performs on the host tree.
///
/// `create_element`/`create_text` plus `set_attribute` together materialize a
/// node. Handles passed in are always ones the same backend returned
/// earlier; implementations should fail with
/// [`Error::UnknownHandle`](crate::Error::UnknownHandle) otherwise.
pub trait RendererBackend {
    /// Create a detached element node.
    fn create_element(&mut self, tag: &str) -> Result<HostHandle>;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Result<HostHandle>;

    /// Set an attribute on an element.
    fn set_attribute(&mut self, node: HostHandle, key: &str, value: &str) -> Result<()>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<()>;

    /// Insert `node` into `parent` directly before `reference`.
    fn insert_before(
        &mut self,
        parent: HostHandle,
        node: HostHandle,
        reference: HostHandle,
    ) -> Result<()>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<()>;

    /// Replace the text content of a node.
    fn set_text(&mut self, node: HostHandle, text: &str) -> Result<()>;

    /// The parent of a node, or `None` if it is detached.
    fn parent(&self, node: HostHandle) -> Result<Option<HostHandle>>;

    /// Lower-case tag name of an element, `None` for text nodes.
    fn tag_name(&self, node: HostHandle) -> Result<Option<String>>;
}

