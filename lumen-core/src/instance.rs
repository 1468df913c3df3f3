//! Instances
//!
//! An [`Instance`] connects the pieces: it wraps the caller's state in a
//! [`Store`], exposes computed definitions as lazy [`Computed`]s, and keeps
//! one eager [`Subscriber`] whose computation renders a fresh tree and
//! patches it into the host.
//!
//! # Lifecycle
//!
//! 1. `init` hook, before anything is wrapped.
//! 2. State becomes a store; computeds are wired up.
//! 3. `created` hook.
//! 4. Mount: the render subscriber runs once, rendering and committing the
//!    first tree over the `el` placeholder.
//! 5. `mounted` hook.
//!
//! From then on every accepted write to a cell the render read re-runs the
//! render synchronously. Each re-commit is followed by the `updated` hook.
//! There is no teardown.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::reactive::{Computed, Runtime, Store, Subscriber};
use crate::vdom::{patch, HostHandle, PatchTarget, RendererBackend, VNode};

type RenderFn = Box<dyn Fn(&Instance) -> Result<VNode>>;
type ComputedFn = Rc<dyn Fn(&Instance) -> Result<Value>>;
type HookFn = Box<dyn Fn()>;

/// Points in the lifecycle where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Before state is wrapped.
    Init,
    /// After state and computeds are set up, before the first render.
    Created,
    /// After the first commit.
    Mounted,
    /// After every later commit.
    Updated,
}

/// Whether the instance has committed a tree yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No tree committed; the mount point is still in place.
    Uninitialized,
    /// A tree has been committed to the host.
    Mounted,
}

/// Instance definition, built up with chained calls.
pub struct Options {
    data: Value,
    render: Option<RenderFn>,
    computed: IndexMap<String, ComputedFn>,
    hooks: HashMap<Hook, Vec<HookFn>>,
    el: Option<HostHandle>,
    config: RuntimeConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Empty options: `{}` state, no render, no mount point.
    pub fn new() -> Self {
        Self {
            data: Value::Object(Map::new()),
            render: None,
            computed: IndexMap::new(),
            hooks: HashMap::new(),
            el: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Initial state. Must be a JSON object.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// The render function. Required.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Instance) -> Result<VNode> + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }

    /// Add a computed value under `name`. A later definition with the same
    /// name replaces the earlier one.
    pub fn computed<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Instance) -> Result<Value> + 'static,
    {
        self.computed.insert(name.into(), Rc::new(compute));
        self
    }

    /// Register a lifecycle hook. Several hooks per point run in
    /// registration order.
    pub fn hook<F>(mut self, hook: Hook, f: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.hooks.entry(hook).or_default().push(Box::new(f));
        self
    }

    /// The host element the first render replaces. Required.
    pub fn el(mut self, el: HostHandle) -> Self {
        self.el = Some(el);
        self
    }

    /// Runtime tunables. Defaults to [`RuntimeConfig::default`].
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("data", &self.data)
            .field("has_render", &self.render.is_some())
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("el", &self.el)
            .field("config", &self.config)
            .finish()
    }
}

struct InstanceInner {
    runtime: Rc<Runtime>,
    store: Rc<Store>,
    computed: IndexMap<String, Computed>,
    render: RenderFn,
    hooks: HashMap<Hook, Vec<HookFn>>,
    backend: RefCell<Box<dyn RendererBackend>>,
    el: Cell<HostHandle>,
    vnode: RefCell<Option<VNode>>,
    watcher: RefCell<Option<Rc<Subscriber>>>,
    render_count: Cell<usize>,
}

/// A mounted component: state, computeds, and the render loop.
///
/// `Instance` is a cheap handle; clones refer to the same component.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

impl Instance {
    /// Create and mount an instance.
    ///
    /// Errors from the first render (or any computed it reads) are returned
    /// and nothing is committed.
    pub fn new<B>(options: Options, backend: B) -> Result<Self>
    where
        B: RendererBackend + 'static,
    {
        let Options {
            data,
            render,
            computed,
            hooks,
            el,
            config,
        } = options;

        let render =
            render.ok_or_else(|| Error::Configuration("options must define a render function".into()))?;
        let el = el.ok_or_else(|| Error::Configuration("options must define an el to mount on".into()))?;
        config.validate()?;

        run_hooks(&hooks, Hook::Init);

        let runtime = Runtime::new(config);
        let store = Rc::new(Store::new(Rc::clone(&runtime), data)?);
        if let Some(name) = computed.keys().find(|name| store.contains(name)) {
            return Err(Error::Configuration(format!(
                "computed {name:?} collides with a data property"
            )));
        }

        let inner = Rc::new_cyclic(|weak: &Weak<InstanceInner>| {
            let computed = computed
                .into_iter()
                .map(|(name, compute)| {
                    let weak = weak.clone();
                    let accessor = Computed::new(Rc::clone(&runtime), name.clone(), move || {
                        compute(&Instance::upgrade(&weak)?)
                    });
                    (name, accessor)
                })
                .collect();

            InstanceInner {
                runtime,
                store,
                computed,
                render,
                hooks,
                backend: RefCell::new(Box::new(backend)),
                el: Cell::new(el),
                vnode: RefCell::new(None),
                watcher: RefCell::new(None),
                render_count: Cell::new(0),
            }
        });

        let instance = Self { inner };
        instance.call_hook(Hook::Created);
        instance.mount()?;
        instance.call_hook(Hook::Mounted);
        Ok(instance)
    }

    fn upgrade(weak: &Weak<InstanceInner>) -> Result<Self> {
        weak.upgrade()
            .map(|inner| Self { inner })
            .ok_or_else(|| Error::msg("instance was dropped"))
    }

    fn mount(&self) -> Result<()> {
        let weak = Rc::downgrade(&self.inner);
        let watcher = Subscriber::eager(Rc::clone(&self.inner.runtime), move || {
            let instance = Self::upgrade(&weak)?;
            let tree = instance.render()?;
            instance.update(tree)?;
            Ok(Value::Null)
        })?;

        debug!(el = ?self.el(), watcher = ?watcher.id(), "mounted");
        *self.inner.watcher.borrow_mut() = Some(watcher);
        Ok(())
    }

    fn render(&self) -> Result<VNode> {
        let count = &self.inner.render_count;
        count.set(count.get() + 1);
        (self.inner.render)(self)
    }

    /// Diff `tree` against the committed tree (or the mount point on first
    /// commit) and make it the committed tree.
    ///
    /// On error the committed tree and `el` are left as they were.
    pub fn update(&self, tree: VNode) -> Result<()> {
        let first = self.inner.vnode.borrow().is_none();

        let root = {
            let mut backend = self.inner.backend.borrow_mut();
            let committed = self.inner.vnode.borrow();
            let target = match committed.as_ref() {
                Some(prev) => PatchTarget::Committed(prev),
                None => PatchTarget::Host(self.inner.el.get()),
            };
            patch(&mut **backend, target, &tree)?
        };

        self.inner.el.set(root);
        *self.inner.vnode.borrow_mut() = Some(tree);
        debug!(el = ?root, first, "committed tree");

        if !first {
            self.call_hook(Hook::Updated);
        }
        Ok(())
    }

    /// Read a property: a computed if `name` is one, otherwise the store.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.inner.computed.get(name) {
            Some(computed) => computed.value(),
            None => Ok(self.inner.store.get(name)),
        }
    }

    /// Write a property. Writes to computed names are ignored.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.inner.computed.contains_key(name) {
            debug!(property = name, "ignored write to computed");
            return Ok(());
        }
        self.inner.store.set(name, value)
    }

    /// Read a computed by name.
    pub fn computed(&self, name: &str) -> Result<Value> {
        self.inner
            .computed
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("no computed named {name:?}")))?
            .value()
    }

    /// The computed accessor registered under `name`.
    pub fn computed_accessor(&self, name: &str) -> Option<&Computed> {
        self.inner.computed.get(name)
    }

    /// Host handle of the committed root, or the mount point before the
    /// first commit.
    pub fn el(&self) -> HostHandle {
        self.inner.el.get()
    }

    /// A copy of the committed tree.
    pub fn vnode(&self) -> Option<VNode> {
        self.inner.vnode.borrow().clone()
    }

    /// How many times the render function has been called.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    /// [`Lifecycle::Mounted`] once a tree has been committed.
    pub fn state(&self) -> Lifecycle {
        if self.inner.vnode.borrow().is_some() {
            Lifecycle::Mounted
        } else {
            Lifecycle::Uninitialized
        }
    }

    /// The reactive store wrapping this instance's data.
    pub fn store(&self) -> &Rc<Store> {
        &self.inner.store
    }

    /// The runtime shared by the store, computeds and render subscriber.
    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.inner.runtime
    }

    /// The render subscriber, once mounted.
    pub fn watcher(&self) -> Option<Rc<Subscriber>> {
        self.inner.watcher.borrow().clone()
    }

    fn call_hook(&self, hook: Hook) {
        run_hooks(&self.inner.hooks, hook);
    }
}

fn run_hooks(hooks: &HashMap<Hook, Vec<HookFn>>, hook: Hook) {
    for f in hooks.get(&hook).into_iter().flatten() {
        f();
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("el", &self.el())
            .field("state", &self.state())
            .field("render_count", &self.render_count())
            .field("computed", &self.inner.computed.keys().collect::<Vec<_>>())
            .finish()
    }
}
