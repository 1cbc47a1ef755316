//! Reference cells: a trackable holder with a single `value` property.
//!
//! Replacing the value (via [`Ref::set`] or [`Ref::update`]) notifies every
//! reader. Mutating the held value in place through [`Ref::peek_mut`] does
//! not, because only the `value` slot is instrumented, not the structure it
//! points to.

use std::fmt;

use super::object::Reactive;

/// Name of the single property a reference cell exposes.
pub const VALUE_PROP: &str = "value";

/// A single-value reactive cell.
pub struct Ref<T> {
    holder: Reactive<T>,
}

impl<T> Ref<T> {
    pub fn new(initial: T) -> Self {
        Self {
            holder: Reactive::new(initial),
        }
    }

    /// Borrow the value, recording a dependency.
    ///
    /// `f` runs while the value is borrowed. A write to this cell made from
    /// inside `f`, including one made by an effect that `f` triggers, panics
    /// instead of blocking.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.holder.read(VALUE_PROP, f)
    }

    /// Replace the value and notify readers.
    pub fn set(&self, value: T) {
        self.holder.write(VALUE_PROP, |slot| *slot = value);
    }

    /// Modify the value and notify readers, as if a new value were assigned.
    ///
    /// Readers are notified after `f` returns and the borrow ends. Reading
    /// this cell from inside `f` panics.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.holder.write(VALUE_PROP, f)
    }

    /// Modify the held value in place without notifying anyone.
    pub fn peek_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.holder.peek_mut(f)
    }

    /// Borrow the value without recording a dependency.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.holder.peek(f)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.holder.ptr_eq(&other.holder)
    }

    pub fn dependent_count(&self) -> usize {
        self.holder.dependent_count(VALUE_PROP)
    }
}

impl<T: Clone> Ref<T> {
    /// Clone the value out, recording a dependency.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T {
        self.peek(T::clone)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            holder: self.holder.clone(),
        }
    }
}

impl<T: Default> Default for Ref<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.peek(|value| f.debug_tuple("Ref").field(value).finish())
    }
}

/// Create a reference cell holding `initial`.
pub fn make_ref<T>(initial: T) -> Ref<T> {
    Ref::new(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;

    #[test]
    fn ref_get_and_set() {
        let cell = make_ref(0);
        assert_eq!(cell.get(), 0);

        cell.set(42);
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn each_write_reruns_reader_once() {
        let cell = make_ref(1);
        let reader = cell.clone();
        let effect = Effect::new(move || {
            // Several reads in one run still register a single dependency.
            let _ = reader.get() + reader.get() + reader.get();
        });
        assert_eq!(cell.dependent_count(), 1);

        cell.set(2);
        cell.set(2);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn in_place_mutation_is_not_reactive() {
        let cell = make_ref(vec![1, 2, 3]);
        let reader = cell.clone();
        let effect = Effect::new(move || {
            reader.with(|items| items.len());
        });

        cell.peek_mut(|items| items.push(4));
        assert_eq!(effect.run_count(), 1);
        assert_eq!(cell.get_untracked(), vec![1, 2, 3, 4]);

        cell.set(vec![1, 2, 3, 4]);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn update_notifies_like_assignment() {
        let cell = make_ref(vec!["a".to_string()]);
        let reader = cell.clone();
        let effect = Effect::new(move || {
            reader.with(Vec::len);
        });

        let len = cell.update(|items| {
            items.push("b".to_string());
            items.len()
        });

        assert_eq!(len, 2);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    #[should_panic(expected = "reactive property `value` written while its value is borrowed")]
    fn cascade_writing_into_a_borrowed_cell_panics() {
        let (a, b) = (make_ref(0), make_ref(0));

        let (source, sink) = (a.clone(), b.clone());
        let _copy = Effect::new(move || source.with(|v| sink.set(*v)));
        let (watched, target) = (b.clone(), a.clone());
        let _write_back = Effect::new(move || {
            if watched.get() == 1 {
                target.set(2);
            }
        });

        a.set(1);
    }

    #[test]
    fn cascade_completes_when_value_is_copied_out() {
        let (a, b) = (make_ref(0), make_ref(0));

        let (source, sink) = (a.clone(), b.clone());
        let copy = Effect::new(move || {
            let value = source.get();
            sink.set(value);
        });
        let (watched, target) = (b.clone(), a.clone());
        let _write_back = Effect::new(move || {
            if watched.get() == 1 {
                target.set(2);
            }
        });

        a.set(1);

        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
        assert_eq!(copy.run_count(), 3);
    }

    #[test]
    fn ref_without_readers_accepts_writes() {
        let cell = make_ref("idle");
        cell.set("busy");
        assert_eq!(cell.get(), "busy");
        assert_eq!(cell.dependent_count(), 0);
    }
}
