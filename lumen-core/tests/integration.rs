//! Integration Tests for Instances
//!
//! These tests mount instances on a `MemoryHost` and drive them through
//! writes, checking both the committed tree and the host mutations.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lumen_core::reactive::Subscriber;
use lumen_core::{
    attrs, create_element, create_text_vnode, Attrs, Error, Hook, HostOp, Instance, IntoText,
    MemoryHost, Options, RuntimeConfig,
};
use serde_json::json;

/// Counter-driven render: a single text node showing `count`.
#[test]
fn scenario_a_text_follows_count() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"count": 0}))
            .el(app)
            .render(|vm| Ok(create_text_vnode(vm.get("count")?))),
        host.clone(),
    )
    .unwrap();

    assert_eq!(host.text_content(vm.el()), "0");
    assert_eq!(vm.render_count(), 1);

    vm.set("count", 1).unwrap();
    assert_eq!(host.text_content(vm.el()), "1");
    assert_eq!(vm.render_count(), 2);

    // Same value again: no notification, no render.
    vm.set("count", 1).unwrap();
    assert_eq!(host.text_content(vm.el()), "1");
    assert_eq!(vm.render_count(), 2);
}

/// Toggling the root tag replaces the host subtree.
#[test]
fn scenario_b_tag_swap_replaces_root() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"isShow": true, "message": "hello"}))
            .el(app)
            .render(|vm| {
                let message = vm.get("message")?;
                let tag = if vm.get("isShow")? == json!(true) { "p" } else { "h1" };
                Ok(create_element(tag, Attrs::new(), message))
            }),
        host.clone(),
    )
    .unwrap();

    let p = vm.el();
    assert_eq!(host.tag_of(p).as_deref(), Some("p"));

    vm.set("isShow", false).unwrap();

    let h1 = vm.el();
    assert_ne!(h1, p);
    assert_eq!(host.tag_of(h1).as_deref(), Some("h1"));
    assert!(!host.is_attached(p));
    assert!(host.is_attached(h1));
    assert_eq!(host.child_nodes(host.document()), vec![h1]);
    assert_eq!(host.outer_html(h1), "<h1>hello</h1>");
}

/// A computed is evaluated once per invalidation, however often it is read.
#[test]
fn scenario_c_computed_evaluates_once_per_change() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");
    let evaluations = Rc::new(Cell::new(0));

    let vm = {
        let evaluations = Rc::clone(&evaluations);
        Instance::new(
            Options::new()
                .data(json!({"message": "hi"}))
                .el(app)
                .computed("msg", move |vm| {
                    evaluations.set(evaluations.get() + 1);
                    let message = vm.get("message")?;
                    Ok(json!(format!("{}!", message.into_text())))
                })
                .render(|_| Ok(create_element("div", Attrs::new(), ()))),
            host,
        )
        .unwrap()
    };

    assert_eq!(evaluations.get(), 0);
    assert_eq!(vm.get("msg").unwrap(), json!("hi!"));
    assert_eq!(vm.get("msg").unwrap(), json!("hi!"));
    assert_eq!(evaluations.get(), 1);

    vm.set("message", "bye").unwrap();
    assert_eq!(evaluations.get(), 1);

    assert_eq!(vm.get("msg").unwrap(), json!("bye!"));
    assert_eq!(vm.get("msg").unwrap(), json!("bye!"));
    assert_eq!(vm.computed("msg").unwrap(), json!("bye!"));
    assert_eq!(evaluations.get(), 2);
}

/// A render reading a computed re-renders when the computed's input changes.
#[test]
fn render_follows_computed_inputs() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"message": "hi"}))
            .el(app)
            .computed("msg", |vm| {
                let message = vm.get("message")?;
                Ok(json!(format!("{}!", message.into_text())))
            })
            .render(|vm| Ok(create_element("p", Attrs::new(), vm.get("msg")?))),
        host.clone(),
    )
    .unwrap();

    assert_eq!(host.outer_html(vm.el()), "<p>hi!</p>");

    vm.set("message", "bye").unwrap();

    assert_eq!(host.outer_html(vm.el()), "<p>bye!</p>");
    assert_eq!(vm.render_count(), 2);
    assert_eq!(vm.computed_accessor("msg").unwrap().evaluation_count(), 2);
}

/// String cells render as plain text, without JSON quoting.
#[test]
fn string_cell_renders_as_plain_text() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"message": "hi"}))
            .el(app)
            .render(|vm| {
                Ok(create_element(
                    "p",
                    Attrs::new(),
                    vec![create_text_vnode(vm.get("message")?)],
                ))
            }),
        host.clone(),
    )
    .unwrap();

    assert_eq!(host.text_content(vm.el()), "hi");
    assert_eq!(host.outer_html(vm.el()), "<p>hi</p>");

    vm.set("message", "bye").unwrap();
    assert_eq!(host.text_content(vm.el()), "bye");

    vm.set("message", json!(null)).unwrap();
    assert_eq!(host.text_content(vm.el()), "null");
}

/// Cells read only in a branch that was not taken are not subscribed.
#[test]
fn untaken_branch_is_not_a_dependency() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"flag": false, "a": "A", "b": "B"}))
            .el(app)
            .render(|vm| {
                let shown = if vm.get("flag")? == json!(true) {
                    vm.get("a")?
                } else {
                    vm.get("b")?
                };
                Ok(create_text_vnode(shown))
            }),
        host.clone(),
    )
    .unwrap();

    let store = vm.store();
    let watcher: Rc<Subscriber> = vm.watcher().unwrap();
    let a = store.dependency("a").unwrap().id();
    let b = store.dependency("b").unwrap().id();
    let flag = store.dependency("flag").unwrap().id();
    assert_eq!(watcher.dependency_ids(), vec![flag, b]);

    vm.set("a", "A2").unwrap();
    assert_eq!(vm.render_count(), 1);

    vm.set("flag", true).unwrap();
    assert_eq!(host.text_content(vm.el()), "A2");
    assert_eq!(watcher.dependency_ids(), vec![flag, a]);
}

/// A same-tag re-render touches only the changed text node.
#[test]
fn same_tag_rerender_only_sets_text() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"count": 0}))
            .el(app)
            .render(|vm| {
                let count = vm.get("count")?;
                Ok(create_element(
                    "div",
                    attrs([("class", "wrapper")]),
                    vec![create_element("span", Attrs::new(), count)],
                ))
            }),
        host.clone(),
    )
    .unwrap();

    let root = vm.el();
    let span = host.child_nodes(root)[0];
    let text = host.child_nodes(span)[0];
    host.clear_ops();

    vm.set("count", 7).unwrap();

    assert_eq!(vm.el(), root);
    assert_eq!(host.child_nodes(root), vec![span]);
    assert_eq!(
        host.ops(),
        vec![HostOp::SetText {
            node: text,
            text: "7".into()
        }]
    );
}

/// A render that keeps writing what it reads trips the recursion bound and
/// leaves the last committed tree in place.
#[test]
fn runaway_render_hits_recursion_limit() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"looping": false, "n": 0}))
            .el(app)
            .config(RuntimeConfig::default().with_max_update_depth(16))
            .render(|vm| {
                let n = vm.get("n")?.as_i64().unwrap_or_default();
                if vm.get("looping")? == json!(true) {
                    vm.set("n", n + 1)?;
                }
                Ok(create_element("p", Attrs::new(), n.to_string()))
            }),
        host.clone(),
    )
    .unwrap();

    let committed = vm.vnode();
    let el = vm.el();

    let err = vm.set("looping", true).unwrap_err();

    assert!(matches!(err, Error::RecursionLimitExceeded { depth: 17 }));
    assert_eq!(vm.vnode(), committed);
    assert_eq!(vm.el(), el);
    assert_eq!(host.outer_html(el), "<p>0</p>");
    assert_eq!(vm.runtime().depth(), 0);
}

/// A failing render propagates out of `set` and commits nothing.
#[test]
fn failing_render_keeps_previous_tree() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");

    let vm = Instance::new(
        Options::new()
            .data(json!({"fail": false, "text": "ok"}))
            .el(app)
            .render(|vm| {
                if vm.get("fail")? == json!(true) {
                    return Err(Error::msg("render failed"));
                }
                Ok(create_element("p", Attrs::new(), vm.get("text")?))
            }),
        host.clone(),
    )
    .unwrap();

    let committed = vm.vnode();
    host.clear_ops();

    let err = vm.set("fail", true).unwrap_err();

    assert!(matches!(err, Error::Callback(_)));
    assert_eq!(err.to_string(), "render failed");
    assert_eq!(vm.vnode(), committed);
    assert_eq!(host.outer_html(vm.el()), "<p>ok</p>");
    assert!(host.ops().is_empty());

    // Recovering re-renders normally.
    vm.set("fail", false).unwrap();
    vm.set("text", "back").unwrap();
    assert_eq!(host.outer_html(vm.el()), "<p>back</p>");
}

#[test]
fn non_object_data_is_rejected_after_init() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");
    let log = Rc::new(RefCell::new(Vec::new()));

    let options = {
        let init = Rc::clone(&log);
        let created = Rc::clone(&log);
        Options::new()
            .data(json!([1, 2, 3]))
            .el(app)
            .hook(Hook::Init, move || init.borrow_mut().push("init"))
            .hook(Hook::Created, move || created.borrow_mut().push("created"))
            .render(|_| Ok(create_element("p", Attrs::new(), ())))
    };

    let err = Instance::new(options, host.clone()).unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(*log.borrow(), ["init"]);
    assert!(host.is_attached(app));
}

#[test]
fn updated_hook_runs_after_each_rerender() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");
    let updates = Rc::new(Cell::new(0));

    let vm = {
        let updates = Rc::clone(&updates);
        Instance::new(
            Options::new()
                .data(json!({"count": 0}))
                .el(app)
                .hook(Hook::Updated, move || updates.set(updates.get() + 1))
                .render(|vm| Ok(create_text_vnode(vm.get("count")?))),
            host,
        )
        .unwrap()
    };

    assert_eq!(updates.get(), 0);
    vm.set("count", 1).unwrap();
    vm.set("count", 2).unwrap();
    vm.set("count", 2).unwrap();
    assert_eq!(updates.get(), 2);
}

#[test]
fn config_from_json_drives_the_runtime() {
    let host = MemoryHost::new();
    let app = host.create_placeholder("div", "app");
    let config = RuntimeConfig::from_json(r#"{"max_update_depth": 3}"#).unwrap();

    let vm = Instance::new(
        Options::new()
            .el(app)
            .config(config)
            .render(|_| Ok(create_element("p", Attrs::new(), ()))),
        host,
    )
    .unwrap();

    assert_eq!(vm.runtime().config().max_update_depth, 3);
}

#[test]
fn two_instances_track_independently() {
    let host = MemoryHost::new();
    let first = host.create_placeholder("div", "first");
    let second = host.create_placeholder("div", "second");

    let mount = |el| {
        Instance::new(
            Options::new()
                .data(json!({"count": 0}))
                .el(el)
                .render(|vm| Ok(create_text_vnode(vm.get("count")?))),
            host.clone(),
        )
        .unwrap()
    };
    let a = mount(first);
    let b = mount(second);

    a.set("count", 10).unwrap();

    assert_eq!(host.text_content(a.el()), "10");
    assert_eq!(host.text_content(b.el()), "0");
    assert_eq!(b.render_count(), 1);
    assert_eq!(host.text_content(host.document()), "100");
}
