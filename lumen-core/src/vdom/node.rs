//! Virtual Nodes
//!
//! A [`VNode`] describes one node of rendered output: either an element
//! (tag, attributes, optional children) or a text node. Trees are built
//! fresh by every render and never modified afterwards, except for the host
//! handle slot, which the reconciler fills in when the node is realized or
//! carries over from the previous generation.

use std::cell::Cell;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use super::backend::HostHandle;

/// Element attributes, in insertion order.
pub type Attrs = IndexMap<String, String>;

/// Build an [`Attrs`] map from key/value pairs.
pub fn attrs<I, K, V>(pairs: I) -> Attrs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// What a node is. A node is exactly one of the two.
#[derive(Debug, Clone, PartialEq)]
pub enum VNodeKind {
    /// An element with a tag name.
    Element {
        /// Tag name, e.g. `"div"`.
        tag: String,
        /// Attributes applied when the host node is created.
        attrs: Attrs,
        /// Child nodes; `None` when the element was built without any.
        children: Option<Vec<VNode>>,
    },

    /// A text leaf.
    Text(String),
}

/// One node of a virtual tree.
#[derive(Clone)]
pub struct VNode {
    kind: VNodeKind,
    elm: Cell<Option<HostHandle>>,
}

impl VNode {
    fn new(kind: VNodeKind) -> Self {
        Self {
            kind,
            elm: Cell::new(None),
        }
    }

    /// Placeholder node standing in for an existing host element that has
    /// never been diffed: the element's tag, no attributes, no children.
    pub fn empty_at(tag: impl Into<String>, elm: HostHandle) -> Self {
        let node = Self::new(VNodeKind::Element {
            tag: tag.into(),
            attrs: Attrs::new(),
            children: Some(Vec::new()),
        });
        node.set_elm(elm);
        node
    }

    /// The node's kind.
    pub fn kind(&self) -> &VNodeKind {
        &self.kind
    }

    /// Tag name for elements, `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element { tag, .. } => Some(tag.as_str()),
            VNodeKind::Text(_) => None,
        }
    }

    /// Text for text nodes, `None` for elements.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Text(text) => Some(text.as_str()),
            VNodeKind::Element { .. } => None,
        }
    }

    /// Attributes of an element; text nodes have none.
    pub fn attrs(&self) -> Option<&Attrs> {
        match &self.kind {
            VNodeKind::Element { attrs, .. } => Some(attrs),
            VNodeKind::Text(_) => None,
        }
    }

    /// Children of an element, if it was built with any.
    pub fn children(&self) -> Option<&[VNode]> {
        match &self.kind {
            VNodeKind::Element { children, .. } => children.as_deref(),
            VNodeKind::Text(_) => None,
        }
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, VNodeKind::Text(_))
    }

    /// The host node this node is realized as, if any.
    pub fn elm(&self) -> Option<HostHandle> {
        self.elm.get()
    }

    pub(crate) fn set_elm(&self, elm: HostHandle) {
        self.elm.set(Some(elm));
    }
}

/// Structural equality; host handles are ignored.
impl PartialEq for VNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VNodeKind::Element {
                tag,
                attrs,
                children,
            } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attrs", attrs)
                .field("children", children)
                .field("elm", &self.elm.get())
                .finish(),
            VNodeKind::Text(text) => f
                .debug_struct("Text")
                .field("text", text)
                .field("elm", &self.elm.get())
                .finish(),
        }
    }
}

/// Children argument to [`create_element`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Children {
    /// No children at all.
    #[default]
    None,

    /// A single string, normalized into one text child.
    Text(String),

    /// Already-built nodes, used as-is.
    Nodes(Vec<VNode>),
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.to_owned())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text)
    }
}

impl From<Value> for Children {
    fn from(value: Value) -> Self {
        Children::Text(value.into_text())
    }
}

impl From<&Value> for Children {
    fn from(value: &Value) -> Self {
        Children::Text(value.into_text())
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl From<VNode> for Children {
    fn from(node: VNode) -> Self {
        Children::Nodes(vec![node])
    }
}

/// Build an element node.
///
/// A text `children` argument becomes a single text child.
pub fn create_element(tag: impl Into<String>, attrs: Attrs, children: impl Into<Children>) -> VNode {
    let children = match children.into() {
        Children::None => None,
        Children::Text(text) => Some(vec![create_text_vnode(text)]),
        Children::Nodes(nodes) => Some(nodes),
    };

    VNode::new(VNodeKind::Element {
        tag: tag.into(),
        attrs,
        children,
    })
}

/// Build a text node.
pub fn create_text_vnode(value: impl IntoText) -> VNode {
    VNode::new(VNodeKind::Text(value.into_text()))
}

/// Conversion into the text shown by a text node.
///
/// Store values stringify the way a script host would print them: strings
/// without quotes, `null` as `"null"`, integral floats without a fraction,
/// arrays joined with commas and objects as `"[object Object]"`.
pub trait IntoText {
    /// The text to display.
    fn into_text(self) -> String;
}

impl IntoText for String {
    fn into_text(self) -> String {
        self
    }
}

impl IntoText for &str {
    fn into_text(self) -> String {
        self.to_owned()
    }
}

impl IntoText for &String {
    fn into_text(self) -> String {
        self.clone()
    }
}

impl IntoText for Value {
    fn into_text(self) -> String {
        match self {
            Value::String(text) => text,
            other => (&other).into_text(),
        }
    }
}

impl IntoText for &Value {
    fn into_text(self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => f.into_text(),
                _ => n.to_string(),
            },
            Value::String(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.into_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_owned(),
        }
    }
}

impl IntoText for f64 {
    fn into_text(self) -> String {
        if self.is_nan() {
            "NaN".to_owned()
        } else if self == f64::INFINITY {
            "Infinity".to_owned()
        } else if self == f64::NEG_INFINITY {
            "-Infinity".to_owned()
        } else if self == 0.0 {
            "0".to_owned()
        } else if self.fract() == 0.0 && self.abs() < 1e21 {
            format!("{self:.0}")
        } else {
            self.to_string()
        }
    }
}

macro_rules! display_text {
    ($($ty:ty),*) => {
        $(
            impl IntoText for $ty {
                fn into_text(self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_text!(bool, char, i32, i64, u32, u64, usize);
