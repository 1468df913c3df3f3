//! Reactive Store
//!
//! The store wraps a plain JSON object and turns each of its properties into
//! a reactive cell: a value paired with a [`Dependency`].
//!
//! # How the Store Works
//!
//! 1. At construction, every property of the initial object becomes a cell.
//!    The table is fixed from then on.
//!
//! 2. [`Store::get`] registers the tracker's active subscriber (if any) on
//!    the cell's dependency and returns a clone of the value.
//!
//! 3. [`Store::set`] compares the new value to the current one by value
//!    equality. An equal write is a no-op. Otherwise the value is replaced
//!    and every subscriber of the cell is notified before `set` returns.
//!
//! # Properties added later
//!
//! Names that were not present at construction are stored in a plain side
//! table. They can be read and written, but reads are never tracked and
//! writes never notify.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use super::dependency::Dependency;
use super::runtime::Runtime;
use crate::error::{Error, Result};

/// One reactive property.
#[derive(Debug)]
struct ReactiveCell {
    value: RefCell<Value>,
    dep: Rc<Dependency>,
}

/// Reactive wrapper over a plain state object.
#[derive(Debug)]
pub struct Store {
    runtime: Rc<Runtime>,
    cells: IndexMap<String, ReactiveCell>,
    untracked: RefCell<Map<String, Value>>,
}

impl Store {
    /// Wrap `state`, which must be a JSON object.
    pub fn new(runtime: Rc<Runtime>, state: Value) -> Result<Self> {
        let object = match state {
            Value::Object(object) => object,
            other => {
                return Err(Error::Configuration(format!(
                    "store state must be an object, got {}",
                    type_name(&other)
                )))
            }
        };

        let cells = object
            .into_iter()
            .map(|(name, value)| {
                let cell = ReactiveCell {
                    value: RefCell::new(value),
                    dep: Dependency::new(Rc::clone(&runtime)),
                };
                (name, cell)
            })
            .collect();

        Ok(Self {
            runtime,
            cells,
            untracked: RefCell::new(Map::new()),
        })
    }

    /// The runtime this store reports reads and writes to.
    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// Read a property, registering the active subscriber on it.
    ///
    /// Unknown names read as `Null`.
    pub fn get(&self, name: &str) -> Value {
        match self.cells.get(name) {
            Some(cell) => {
                cell.dep.depend();
                cell.value.borrow().clone()
            }
            None => self.read_untracked(name),
        }
    }

    /// Read a property without registering a dependency.
    pub fn get_untracked(&self, name: &str) -> Value {
        match self.cells.get(name) {
            Some(cell) => cell.value.borrow().clone(),
            None => self.read_untracked(name),
        }
    }

    /// Write a property.
    ///
    /// Returns any error raised by a subscriber re-run during notification.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();

        let Some(cell) = self.cells.get(name) else {
            self.untracked.borrow_mut().insert(name.to_owned(), value);
            return Ok(());
        };

        {
            let mut current = cell.value.borrow_mut();
            if *current == value {
                trace!(property = name, "write skipped: value unchanged");
                return Ok(());
            }
            *current = value;
        }

        trace!(property = name, dep = ?cell.dep.id(), "write accepted");
        cell.dep.notify()
    }

    /// Write a property using a function of its current value.
    pub fn update<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get_untracked(name));
        self.set(name, next)
    }

    /// Whether `name` is a reactive cell or a later-added property.
    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name) || self.untracked.borrow().contains_key(name)
    }

    /// Whether `name` was present at construction and is tracked.
    pub fn is_reactive(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    /// Names of the reactive cells.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// The dependency backing a reactive cell.
    pub fn dependency(&self, name: &str) -> Option<&Rc<Dependency>> {
        self.cells.get(name).map(|cell| &cell.dep)
    }

    /// Current values of every property, untracked.
    pub fn snapshot(&self) -> Value {
        let mut object: Map<String, Value> = self
            .cells
            .iter()
            .map(|(name, cell)| (name.clone(), cell.value.borrow().clone()))
            .collect();
        for (name, value) in self.untracked.borrow().iter() {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }

    fn read_untracked(&self, name: &str) -> Value {
        self.untracked
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subscriber;
    use serde_json::json;
    use std::cell::Cell;

    fn store(state: Value) -> Store {
        Store::new(Runtime::with_defaults(), state).unwrap()
    }

    /// Eager subscriber that reads `name` and counts its runs.
    fn watch(store: &Rc<Store>, name: &'static str) -> (Rc<Subscriber>, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let sub = {
            let store = Rc::clone(store);
            let runs = Rc::clone(&runs);
            Subscriber::eager(Rc::clone(store.runtime()), move || {
                runs.set(runs.get() + 1);
                Ok(store.get(name))
            })
            .unwrap()
        };
        (sub, runs)
    }

    #[test]
    fn store_get_and_set() {
        let store = store(json!({"count": 0}));
        assert_eq!(store.get("count"), json!(0));

        store.set("count", 42).unwrap();
        assert_eq!(store.get("count"), json!(42));
    }

    #[test]
    fn non_object_state_is_rejected() {
        for state in [json!(null), json!(1), json!("x"), json!([1, 2])] {
            let err = Store::new(Runtime::with_defaults(), state).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }
    }

    #[test]
    fn write_notifies_subscribers() {
        let store = Rc::new(store(json!({"count": 0})));
        let (sub, runs) = watch(&store, "count");
        assert_eq!(runs.get(), 1);

        store.set("count", 1).unwrap();
        assert_eq!(runs.get(), 2);
        assert_eq!(sub.value(), json!(1));
    }

    #[test]
    fn equal_write_does_not_notify() {
        let store = Rc::new(store(json!({"items": [1, 2, 3]})));
        let (_sub, runs) = watch(&store, "items");

        // A structurally equal but freshly built value is still "equal".
        store.set("items", json!([1, 2, 3])).unwrap();
        assert_eq!(runs.get(), 1);

        store.set("items", json!([1, 2])).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn properties_added_later_are_not_reactive() {
        let store = Rc::new(store(json!({"known": 1})));
        let (_sub, runs) = watch(&store, "late");

        store.set("late", "hello").unwrap();

        assert_eq!(store.get("late"), json!("hello"));
        assert!(store.contains("late"));
        assert!(!store.is_reactive("late"));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn unknown_property_reads_null() {
        let store = store(json!({}));
        assert_eq!(store.get("missing"), Value::Null);
        assert!(!store.contains("missing"));
    }

    #[test]
    fn get_untracked_does_not_subscribe() {
        let store = Rc::new(store(json!({"count": 0})));
        let sub = {
            let store = Rc::clone(&store);
            Subscriber::eager(Rc::clone(store.runtime()), move || Ok(store.get_untracked("count")))
                .unwrap()
        };

        assert_eq!(sub.dependency_count(), 0);
        assert_eq!(store.dependency("count").unwrap().subscriber_count(), 0);
    }

    #[test]
    fn update_applies_function() {
        let store = store(json!({"count": 10}));
        store
            .update("count", |v| json!(v.as_i64().unwrap_or(0) + 5))
            .unwrap();
        assert_eq!(store.get("count"), json!(15));
    }

    #[test]
    fn keys_and_snapshot_cover_every_property() {
        let store = store(json!({"b": 1, "a": 2}));
        store.set("c", 3).unwrap();

        let keys: Vec<_> = store.keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"a") && keys.contains(&"b"));
        assert_eq!(store.snapshot(), json!({"a": 2, "b": 1, "c": 3}));
    }
}
