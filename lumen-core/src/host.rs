//! In-Memory Host
//!
//! A [`RendererBackend`] that keeps a DOM-like tree in memory. It is the
//! host used by the tests and benchmarks, and it doubles as a reference for
//! what the reconciler expects from a real backend.
//!
//! Every mutation made through the backend interface is appended to an
//! operation log ([`HostOp`]), so callers can assert exactly which host
//! calls a patch made. Setup helpers such as
//! [`MemoryHost::create_placeholder`] are not logged.
//!
//! [`MemoryHost`] is a cheap, clonable handle: hand one clone to an
//! [`Instance`](crate::Instance) and keep another for inspection.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::vdom::{HostHandle, RendererBackend};

/// One mutation applied through the backend interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    /// An element node was created, detached.
    CreateElement {
        /// The new node.
        node: HostHandle,
        /// Lower-cased tag name.
        tag: String,
    },
    /// A text node was created, detached.
    CreateText {
        /// The new node.
        node: HostHandle,
        /// Initial text.
        text: String,
    },
    /// An attribute was written on an element.
    SetAttribute {
        /// Target element.
        node: HostHandle,
        /// Attribute name.
        key: String,
        /// Attribute value.
        value: String,
    },
    /// A node was appended as the last child of `parent`.
    AppendChild {
        /// New parent.
        parent: HostHandle,
        /// Appended node.
        child: HostHandle,
    },
    /// A node was inserted into `parent` before `reference`.
    InsertBefore {
        /// New parent.
        parent: HostHandle,
        /// Inserted node.
        node: HostHandle,
        /// Sibling the node now precedes.
        reference: HostHandle,
    },
    /// A node was detached from `parent`.
    RemoveChild {
        /// Former parent.
        parent: HostHandle,
        /// Detached node.
        child: HostHandle,
    },
    /// A node's text content was replaced.
    SetText {
        /// Target node.
        node: HostHandle,
        /// New text.
        text: String,
    },
}

#[derive(Debug)]
enum HostContent {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct HostNode {
    content: HostContent,
    parent: Option<HostHandle>,
    children: Vec<HostHandle>,
}

#[derive(Debug)]
struct HostTree {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
}

const DOCUMENT: HostHandle = HostHandle::new(0);

impl HostTree {
    fn new() -> Self {
        let body = HostNode {
            content: HostContent::Element {
                tag: "body".to_owned(),
                attrs: IndexMap::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            ops: Vec::new(),
        }
    }

    fn node(&self, handle: HostHandle) -> Result<&HostNode> {
        self.nodes
            .get(handle.raw() as usize)
            .ok_or(Error::UnknownHandle(handle))
    }

    fn node_mut(&mut self, handle: HostHandle) -> Result<&mut HostNode> {
        self.nodes
            .get_mut(handle.raw() as usize)
            .ok_or(Error::UnknownHandle(handle))
    }

    fn alloc(&mut self, content: HostContent) -> HostHandle {
        let handle = HostHandle::new(self.nodes.len() as u64);
        self.nodes.push(HostNode {
            content,
            parent: None,
            children: Vec::new(),
        });
        handle
    }

    fn ensure_element(&self, handle: HostHandle) -> Result<()> {
        match self.node(handle)?.content {
            HostContent::Element { .. } => Ok(()),
            HostContent::Text(_) => Err(Error::StructuralMismatch(format!(
                "host node {handle:?} is a text node and cannot have children"
            ))),
        }
    }

    /// Reject moves that would make a node its own ancestor.
    fn ensure_not_ancestor(&self, node: HostHandle, parent: HostHandle) -> Result<()> {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(Error::StructuralMismatch(format!(
                    "cannot insert {node:?} into its own subtree"
                )));
            }
            cursor = self.node(current)?.parent;
        }
        Ok(())
    }

    fn detach(&mut self, node: HostHandle) -> Result<()> {
        if let Some(parent) = self.node(node)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != node);
            self.node_mut(node)?.parent = None;
        }
        Ok(())
    }

    fn is_attached(&self, node: HostHandle) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == DOCUMENT {
                return true;
            }
            cursor = self.nodes.get(current.raw() as usize).and_then(|n| n.parent);
        }
        false
    }

    fn write_text(&self, handle: HostHandle, out: &mut String) {
        let Some(node) = self.nodes.get(handle.raw() as usize) else {
            return;
        };
        match &node.content {
            HostContent::Text(text) => out.push_str(text),
            HostContent::Element { .. } => {
                for child in &node.children {
                    self.write_text(*child, out);
                }
            }
        }
    }

    fn write_html(&self, handle: HostHandle, out: &mut String) {
        let Some(node) = self.nodes.get(handle.raw() as usize) else {
            return;
        };
        match &node.content {
            HostContent::Text(text) => out.push_str(&escape(text)),
            HostContent::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    let _ = write!(out, " {key}=\"{}\"", escape(value));
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn find_by_id(&self, from: HostHandle, id: &str) -> Option<HostHandle> {
        let node = self.nodes.get(from.raw() as usize)?;
        if let HostContent::Element { attrs, .. } = &node.content {
            if attrs.get("id").map(String::as_str) == Some(id) {
                return Some(from);
            }
        }
        node.children
            .iter()
            .find_map(|child| self.find_by_id(*child, id))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// DOM-like host tree kept in memory.
///
/// Handle 0 is the document root, a `body` element.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    tree: Rc<RefCell<HostTree>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Create an empty host with only the document root.
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(HostTree::new())),
        }
    }

    /// The document root.
    pub fn document(&self) -> HostHandle {
        DOCUMENT
    }

    /// Create an element with the given `id` attribute and append it to the
    /// document. Used to set up a mount point.
    pub fn create_placeholder(&self, tag: &str, id: &str) -> HostHandle {
        let mut tree = self.tree.borrow_mut();
        let mut attrs = IndexMap::new();
        attrs.insert("id".to_owned(), id.to_owned());
        let handle = tree.alloc(HostContent::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        });
        tree.nodes[handle.raw() as usize].parent = Some(DOCUMENT);
        tree.nodes[DOCUMENT.raw() as usize].children.push(handle);
        handle
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<HostHandle> {
        self.tree.borrow().find_by_id(DOCUMENT, id)
    }

    /// Tag of an element; `None` for text nodes and unknown handles.
    pub fn tag_of(&self, node: HostHandle) -> Option<String> {
        match &self.tree.borrow().node(node).ok()?.content {
            HostContent::Element { tag, .. } => Some(tag.clone()),
            HostContent::Text(_) => None,
        }
    }

    /// Concatenated text of a node and all its descendants.
    pub fn text_content(&self, node: HostHandle) -> String {
        let mut out = String::new();
        self.tree.borrow().write_text(node, &mut out);
        out
    }

    /// Children of a node, in order.
    pub fn child_nodes(&self, node: HostHandle) -> Vec<HostHandle> {
        self.tree
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Parent of a node; `None` when detached or unknown.
    pub fn parent_of(&self, node: HostHandle) -> Option<HostHandle> {
        self.tree.borrow().node(node).ok()?.parent
    }

    /// Value of an element attribute.
    pub fn attribute(&self, node: HostHandle, key: &str) -> Option<String> {
        match &self.tree.borrow().node(node).ok()?.content {
            HostContent::Element { attrs, .. } => attrs.get(key).cloned(),
            HostContent::Text(_) => None,
        }
    }

    /// Serialize a subtree as HTML.
    pub fn outer_html(&self, node: HostHandle) -> String {
        let mut out = String::new();
        self.tree.borrow().write_html(node, &mut out);
        out
    }

    /// Whether a node is reachable from the document root.
    pub fn is_attached(&self, node: HostHandle) -> bool {
        self.tree.borrow().is_attached(node)
    }

    /// Total nodes ever created, attached or not.
    pub fn node_count(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    /// Mutations logged since creation or the last [`clear_ops`](Self::clear_ops).
    pub fn ops(&self) -> Vec<HostOp> {
        self.tree.borrow().ops.clone()
    }

    /// Empty the operation log.
    pub fn clear_ops(&self) {
        self.tree.borrow_mut().ops.clear();
    }
}

impl RendererBackend for MemoryHost {
    fn create_element(&mut self, tag: &str) -> Result<HostHandle> {
        let mut tree = self.tree.borrow_mut();
        let tag = tag.to_ascii_lowercase();
        let node = tree.alloc(HostContent::Element {
            tag: tag.clone(),
            attrs: IndexMap::new(),
        });
        trace!(?node, %tag, "create element");
        tree.ops.push(HostOp::CreateElement { node, tag });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> Result<HostHandle> {
        let mut tree = self.tree.borrow_mut();
        let node = tree.alloc(HostContent::Text(text.to_owned()));
        tree.ops.push(HostOp::CreateText {
            node,
            text: text.to_owned(),
        });
        Ok(node)
    }

    fn set_attribute(&mut self, node: HostHandle, key: &str, value: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        match &mut tree.node_mut(node)?.content {
            HostContent::Element { attrs, .. } => {
                attrs.insert(key.to_owned(), value.to_owned());
            }
            HostContent::Text(_) => {
                return Err(Error::StructuralMismatch(format!(
                    "cannot set attribute {key:?} on text node {node:?}"
                )))
            }
        }
        tree.ops.push(HostOp::SetAttribute {
            node,
            key: key.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.node(child)?;
        tree.ensure_element(parent)?;
        tree.ensure_not_ancestor(child, parent)?;

        tree.detach(child)?;
        tree.node_mut(parent)?.children.push(child);
        tree.node_mut(child)?.parent = Some(parent);
        tree.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: HostHandle,
        node: HostHandle,
        reference: HostHandle,
    ) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.node(node)?;
        tree.ensure_element(parent)?;
        if tree.node(reference)?.parent != Some(parent) {
            return Err(Error::StructuralMismatch(format!(
                "reference {reference:?} is not a child of {parent:?}"
            )));
        }
        if node == reference {
            return Ok(());
        }
        tree.ensure_not_ancestor(node, parent)?;

        tree.detach(node)?;
        let siblings = &mut tree.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        tree.node_mut(node)?.parent = Some(parent);
        tree.ops.push(HostOp::InsertBefore {
            parent,
            node,
            reference,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.node(parent)?;
        if tree.node(child)?.parent != Some(parent) {
            return Err(Error::StructuralMismatch(format!(
                "{child:?} is not a child of {parent:?}"
            )));
        }
        tree.detach(child)?;
        tree.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }

    /// Text nodes have their text replaced. Elements lose all children and
    /// get a single new text child, like DOM `textContent`.
    fn set_text(&mut self, node: HostHandle, text: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let is_element = match &mut tree.node_mut(node)?.content {
            HostContent::Text(current) => {
                *current = text.to_owned();
                false
            }
            HostContent::Element { .. } => true,
        };

        if is_element {
            for child in std::mem::take(&mut tree.node_mut(node)?.children) {
                tree.node_mut(child)?.parent = None;
            }
            let text_node = tree.alloc(HostContent::Text(text.to_owned()));
            tree.node_mut(text_node)?.parent = Some(node);
            tree.node_mut(node)?.children.push(text_node);
        }

        tree.ops.push(HostOp::SetText {
            node,
            text: text.to_owned(),
        });
        Ok(())
    }

    fn parent(&self, node: HostHandle) -> Result<Option<HostHandle>> {
        Ok(self.tree.borrow().node(node)?.parent)
    }

    fn tag_name(&self, node: HostHandle) -> Result<Option<String>> {
        Ok(match &self.tree.borrow().node(node)?.content {
            HostContent::Element { tag, .. } => Some(tag.clone()),
            HostContent::Text(_) => None,
        })
    }
}
