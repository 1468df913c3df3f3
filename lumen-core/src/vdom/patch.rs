//! Reconciler
//!
//! Compares two generations of a virtual tree and applies the difference to
//! the host tree through a [`RendererBackend`].
//!
//! # Algorithm
//!
//! 1. First render: the target is a raw host element that has never been
//!    diffed. The new tree is materialized and swapped in at the target's
//!    position.
//!
//! 2. Later renders: the target is the previously committed tree.
//!    - Same tag ([`same_vnode`]): patch in place. The new node inherits the
//!      old node's host handle; text nodes get their text replaced if it
//!      changed; elements recurse into their first child.
//!    - Different tag: materialize the new node and replace the old host
//!      subtree wholesale. Nothing below a tag mismatch is salvaged.
//!
//! Identity is decided by tag alone. There are no keys, and only index 0 of
//! a child list is reconciled.

use tracing::{debug, trace};

use super::backend::{HostHandle, RendererBackend};
use super::node::{VNode, VNodeKind};
use crate::error::{Error, Result};

/// What a new tree is diffed against.
#[derive(Debug, Clone, Copy)]
pub enum PatchTarget<'a> {
    /// A realized host node that has never been diffed (the mount point).
    Host(HostHandle),

    /// The tree committed by the previous render.
    Committed(&'a VNode),
}

/// Two nodes are "the same" when their tags match. Two text nodes always
/// match.
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    a.tag() == b.tag()
}

/// Diff `vnode` against `target` and return the host handle of the new root.
pub fn patch(
    backend: &mut dyn RendererBackend,
    target: PatchTarget<'_>,
    vnode: &VNode,
) -> Result<HostHandle> {
    match target {
        PatchTarget::Host(elm) => {
            let tag = backend.tag_name(elm)?.unwrap_or_default();
            let placeholder = VNode::empty_at(tag, elm);
            replace(backend, &placeholder, vnode)?;
        }
        PatchTarget::Committed(old) if same_vnode(old, vnode) => {
            patch_vnode(backend, old, vnode)?;
        }
        PatchTarget::Committed(old) => {
            debug!(old = ?old.tag(), new = ?vnode.tag(), "tag mismatch, replacing subtree");
            replace(backend, old, vnode)?;
        }
    }

    vnode
        .elm()
        .ok_or_else(|| Error::StructuralMismatch("patched node was not realized".into()))
}

/// Patch `new` in place over `old`, which must share its tag.
pub fn patch_vnode(backend: &mut dyn RendererBackend, old: &VNode, new: &VNode) -> Result<()> {
    let elm = committed_elm(old)?;
    new.set_elm(elm);

    match new.kind() {
        VNodeKind::Element {
            children: Some(children),
            ..
        } => {
            if let Some(old_children) = old.children() {
                update_children(backend, old_children, children)?;
            }
        }
        VNodeKind::Element { children: None, .. } => {}
        VNodeKind::Text(text) => {
            if old.text() != Some(text.as_str()) {
                trace!(node = ?elm, "text changed");
                backend.set_text(elm, text)?;
            }
        }
    }

    Ok(())
}

/// Reconcile two child lists.
///
/// Only the first child of each list is compared. Children past index 0 are
/// neither patched nor inserted nor removed, and nothing happens if either
/// list is empty.
pub fn update_children(
    backend: &mut dyn RendererBackend,
    old: &[VNode],
    new: &[VNode],
) -> Result<()> {
    let (Some(old_first), Some(new_first)) = (old.first(), new.first()) else {
        trace!(old = old.len(), new = new.len(), "empty child list, nothing to reconcile");
        return Ok(());
    };

    if same_vnode(old_first, new_first) {
        patch_vnode(backend, old_first, new_first)
    } else {
        patch(backend, PatchTarget::Committed(old_first), new_first).map(|_| ())
    }
}

/// Materialize `vnode` and its whole subtree as new host nodes.
///
/// Attributes are applied here and nowhere else.
pub fn create_elm(backend: &mut dyn RendererBackend, vnode: &VNode) -> Result<HostHandle> {
    let elm = match vnode.kind() {
        VNodeKind::Element {
            tag,
            attrs,
            children,
        } => {
            let elm = backend.create_element(tag)?;
            for (key, value) in attrs {
                backend.set_attribute(elm, key, value)?;
            }
            for child in children.iter().flatten() {
                let child_elm = create_elm(backend, child)?;
                backend.append_child(elm, child_elm)?;
            }
            elm
        }
        VNodeKind::Text(text) => backend.create_text(text)?,
    };

    vnode.set_elm(elm);
    Ok(elm)
}

/// Swap `old`'s host subtree for a freshly materialized `vnode`.
fn replace(backend: &mut dyn RendererBackend, old: &VNode, vnode: &VNode) -> Result<()> {
    let old_elm = committed_elm(old)?;
    let parent = backend.parent(old_elm)?.ok_or_else(|| {
        Error::StructuralMismatch(format!("host node {old_elm:?} has no parent to patch into"))
    })?;

    let new_elm = create_elm(backend, vnode)?;
    backend.insert_before(parent, new_elm, old_elm)?;
    backend.remove_child(parent, old_elm)?;

    debug!(old = ?old_elm, new = ?new_elm, parent = ?parent, "replaced host subtree");
    Ok(())
}

fn committed_elm(node: &VNode) -> Result<HostHandle> {
    node.elm().ok_or_else(|| {
        Error::StructuralMismatch("previous tree node was never realized".into())
    })
}
