//! Lumen Core
//!
//! This crate provides the runtime for the Lumen declarative UI library.
//! It implements:
//!
//! - Reactive state with automatic dependency tracking
//! - Lazy, cached computed values
//! - A virtual node tree and a reconciler that patches a host tree
//! - Component instances tying state, computeds and rendering together
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: stores, dependencies, subscribers and the tracker
//! - `vdom`: virtual nodes, the renderer backend interface, and patching
//! - `host`: an in-memory renderer backend
//! - `instance`: options, lifecycle hooks and the render loop
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{create_element, Attrs, Instance, MemoryHost, Options};
//! use serde_json::json;
//!
//! let host = MemoryHost::new();
//! let app = host.create_placeholder("div", "app");
//!
//! let vm = Instance::new(
//!     Options::new()
//!         .data(json!({"message": "hello"}))
//!         .el(app)
//!         .render(|vm| Ok(create_element("p", Attrs::new(), vm.get("message")?))),
//!     host.clone(),
//! )?;
//!
//! vm.set("message", "world")?;
//! assert_eq!(host.outer_html(vm.el()), "<p>world</p>");
//! # Ok::<(), lumen_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod host;
pub mod instance;
pub mod reactive;
pub mod vdom;

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use host::{HostOp, MemoryHost};
pub use instance::{Hook, Instance, Lifecycle, Options};
pub use vdom::{
    attrs, create_element, create_text_vnode, Attrs, Children, HostHandle, IntoText,
    RendererBackend, VNode, VNodeKind,
};
