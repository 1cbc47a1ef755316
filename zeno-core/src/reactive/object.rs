//! Trackable Objects
//!
//! [`Reactive<T>`] wraps a raw value and instruments access to it. Reads go
//! through [`Reactive::read`], which names the property being read so the
//! current effect can be recorded against it. Writes go through
//! [`Reactive::write`], which notifies every effect recorded for the named
//! property after the write completes.
//!
//! # Identity
//!
//! Wrapping takes ownership of the raw value, so a raw value is wrapped at
//! most once and has a single dependency map. Clones of a `Reactive` share
//! both the value and the map.
//!
//! # Notification
//!
//! Writes always notify, even when the new value equals the old one and even
//! when no effect is running. Reactivity is shallow: only the named
//! property is instrumented, not whatever structure lives below it.
//!
//! # Borrowing
//!
//! Closures passed to [`Reactive::read`] and friends run while the value is
//! borrowed. Triggers run user code synchronously, so a write cascade can
//! reach a value that an outer frame is still reading. On the borrowing
//! thread that conflict panics with the property's name; other threads wait
//! for the borrow to end.

use std::cell::{Ref as Borrowed, RefCell, RefMut};
use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde_json::{Map, Value};

use super::deps::DependencyMap;

/// A trackable wrapper around a raw value.
pub struct Reactive<T> {
    raw: Arc<ReentrantMutex<RefCell<T>>>,
    deps: Arc<DependencyMap>,
}

/// Label used in borrow panics for untracked access.
const UNTRACKED: &str = "<untracked>";

impl<T> Reactive<T> {
    /// Wrap `raw`.
    pub fn new(raw: T) -> Self {
        Self {
            raw: Arc::new(ReentrantMutex::new(RefCell::new(raw))),
            deps: Arc::new(DependencyMap::new()),
        }
    }

    /// Read through the wrapper, recording a dependency on `prop`.
    ///
    /// `f` runs while the value is borrowed. Writing to this object from
    /// inside `f`, directly or through an effect it triggers, panics.
    pub fn read<R>(&self, prop: &str, f: impl FnOnce(&T) -> R) -> R {
        self.deps.track(prop);
        self.borrow(prop, f)
    }

    /// Write through the wrapper, then notify dependents of `prop`.
    ///
    /// Panics if this thread is already borrowing the value.
    pub fn write<R>(&self, prop: &str, f: impl FnOnce(&mut T) -> R) -> R {
        let result = self.borrow_mut(prop, f);
        self.deps.trigger(prop);
        result
    }

    /// Read without recording a dependency.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.borrow(UNTRACKED, f)
    }

    /// Mutate without notifying anyone.
    pub fn peek_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.borrow_mut(UNTRACKED, f)
    }

    /// Notify dependents of `prop` without writing.
    pub fn trigger(&self, prop: &str) {
        self.deps.trigger(prop);
    }

    /// Whether both handles wrap the same raw value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
    }

    /// Number of effects currently recorded against `prop`.
    pub fn dependent_count(&self, prop: &str) -> usize {
        self.deps.dependent_count(prop)
    }

    fn borrow<R>(&self, prop: &str, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.raw.lock();
        let value = shared(&guard, prop);
        f(&value)
    }

    fn borrow_mut<R>(&self, prop: &str, f: impl FnOnce(&mut T) -> R) -> R {
        let guard = self.raw.lock();
        let mut value = exclusive(&guard, prop);
        f(&mut value)
    }
}

fn shared<'a, T>(guard: &'a ReentrantMutexGuard<'_, RefCell<T>>, prop: &str) -> Borrowed<'a, T> {
    match guard.try_borrow() {
        Ok(value) => value,
        Err(_) => panic!("reactive property `{prop}` read while its value is being written"),
    }
}

fn exclusive<'a, T>(guard: &'a ReentrantMutexGuard<'_, RefCell<T>>, prop: &str) -> RefMut<'a, T> {
    match guard.try_borrow_mut() {
        Ok(value) => value,
        Err(_) => panic!("reactive property `{prop}` written while its value is borrowed"),
    }
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            deps: Arc::clone(&self.deps),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.raw.lock();
        let result = match guard.try_borrow() {
            Ok(raw) => f.debug_struct("Reactive").field("raw", &*raw).finish(),
            Err(_) => f.write_str("Reactive(<borrowed>)"),
        };
        result
    }
}

/// Wrap `raw` in a trackable object.
pub fn reactive<T>(raw: T) -> Reactive<T> {
    Reactive::new(raw)
}

// ----------------------------------------------------------------------------
// Dynamic objects
// ----------------------------------------------------------------------------

/// A trackable JSON object whose keys are its properties.
pub type ReactiveObject = Reactive<Map<String, Value>>;

impl Reactive<Map<String, Value>> {
    /// Wrap a JSON value. Anything other than an object becomes an empty
    /// object.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::new(Map::new()),
        }
    }

    /// Tracked read of a single key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(key, |map| map.get(key).cloned())
    }

    /// Write a single key and notify its dependents.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.write(&key, |map| {
            map.insert(key.clone(), value);
        });
    }

    /// Shallow-merge `source` into this object, one tracked write per key.
    pub fn assign(&self, source: Map<String, Value>) {
        for (key, value) in source {
            self.set(key, value);
        }
    }

    /// Current keys, untracked.
    pub fn keys(&self) -> Vec<String> {
        self.peek(|map| map.keys().cloned().collect())
    }

    /// Snapshot every key, recording a dependency on each.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        for key in self.keys() {
            if let Some(value) = self.get(&key) {
                out.insert(key, value);
            }
        }
        Value::Object(out)
    }
}

impl From<Map<String, Value>> for ReactiveObject {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Progress {
        overall: u32,
        label: String,
    }

    #[test]
    fn write_reruns_readers_of_that_property_only() {
        let progress = reactive(Progress::default());

        let overall_reader = progress.clone();
        let overall_effect = Effect::new(move || {
            overall_reader.read("overall", |p| p.overall);
        });
        let label_reader = progress.clone();
        let label_effect = Effect::new(move || {
            label_reader.read("label", |p| p.label.len());
        });

        progress.write("overall", |p| p.overall = 50);

        assert_eq!(overall_effect.run_count(), 2);
        assert_eq!(label_effect.run_count(), 1);
        assert_eq!(progress.peek(|p| p.overall), 50);
    }

    #[test]
    fn equal_writes_still_notify() {
        let progress = reactive(Progress::default());
        let reader = progress.clone();
        let effect = Effect::new(move || {
            reader.read("overall", |p| p.overall);
        });

        progress.write("overall", |p| p.overall = 0);
        progress.write("overall", |p| p.overall = 0);

        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn reads_outside_effects_are_not_tracked() {
        let progress = reactive(Progress::default());
        progress.read("overall", |p| p.overall);
        assert_eq!(progress.dependent_count("overall"), 0);
    }

    #[test]
    fn clones_share_value_and_dependencies() {
        let first = reactive(Progress::default());
        let second = first.clone();
        let unrelated = reactive(Progress::default());

        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&unrelated));

        let reader = second.clone();
        let _effect = Effect::new(move || {
            reader.read("label", |p| p.label.clone());
        });
        assert_eq!(first.dependent_count("label"), 1);
    }

    #[test]
    fn object_assign_merges_shallowly() {
        let object = ReactiveObject::from_json(json!({ "overall": 0, "files": [] }));
        let reader = object.clone();
        let effect = Effect::new(move || {
            reader.get("overall");
        });

        let patch = json!({ "overall": 75, "extra": true });
        object.assign(patch.as_object().cloned().unwrap_or_default());

        assert_eq!(effect.run_count(), 2);
        assert_eq!(
            object.peek(|m| Value::Object(m.clone())),
            json!({ "overall": 75, "files": [], "extra": true })
        );
    }

    #[test]
    fn to_value_tracks_every_key() {
        let object = ReactiveObject::from_json(json!({ "a": 1, "b": 2 }));
        let reader = object.clone();
        let effect = Effect::new(move || {
            reader.to_value();
        });

        object.set("b", 3);
        assert_eq!(effect.run_count(), 2);
        assert_eq!(object.to_value(), json!({ "a": 1, "b": 3 }));
    }

    #[test]
    #[should_panic(expected = "reactive property `overall` written while its value is borrowed")]
    fn write_inside_own_read_panics() {
        let progress = reactive(Progress::default());
        progress.read("label", |_| progress.write("overall", |p| p.overall = 1));
    }

    #[test]
    fn nested_reads_share_the_borrow() {
        let progress = reactive(Progress::default());
        let total = progress.read("overall", |p| p.overall + progress.peek(|q| q.overall));
        assert_eq!(total, 0);
    }

    #[test]
    fn non_object_json_wraps_empty() {
        let object = ReactiveObject::from_json(json!([1, 2, 3]));
        assert!(object.keys().is_empty());
    }
}
