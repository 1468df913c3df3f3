//! Virtual DOM
//!
//! This module describes rendered output as a tree of [`VNode`]s and
//! reconciles successive trees against a host presentation tree.
//!
//! # Overview
//!
//! A render function builds a fresh tree every time it runs. The reconciler
//! ([`patch()`]) compares it with the tree committed by the previous render
//! and issues the smallest set of [`RendererBackend`] calls it knows how to:
//!
//! - Nodes with the same tag are patched in place; the host handle of the
//!   old node is carried over to the new one.
//! - Nodes with different tags are rebuilt and swapped in at the same
//!   position.
//! - Text nodes only ever have their text replaced.
//!
//! # Limitations
//!
//! Only the first child of a child list is reconciled, and attributes are
//! written once when a host node is created and never diffed afterwards.
//! Renders that need reordering, insertion or removal of siblings, or
//! attribute updates on a live node, are not supported.

mod backend;
mod node;
mod patch;

pub use backend::{HostHandle, RendererBackend};
pub use node::{
    attrs, create_element, create_text_vnode, Attrs, Children, IntoText, VNode, VNodeKind,
};
pub use patch::{create_elm, patch, patch_vnode, same_vnode, update_children, PatchTarget};
