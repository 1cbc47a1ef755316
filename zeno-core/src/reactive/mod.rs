//! Reactive Primitives
//!
//! This module implements Zeno's reactivity: trackable objects, reference
//! cells, and effects.
//!
//! # Concepts
//!
//! ## Trackable objects
//!
//! A [`Reactive<T>`] wraps a raw value. Each access names the property it
//! touches. Reading a property while an effect is running records that
//! effect against the property; writing the property re-runs every effect
//! recorded against it.
//!
//! ## Reference cells
//!
//! A [`Ref<T>`] is a trackable holder with a single `value` property. It is
//! the reactive scalar, and also the way to get whole-collection replacement
//! semantics: assigning a new collection notifies readers, mutating the held
//! collection in place does not.
//!
//! ## Effects
//!
//! An [`Effect`] runs once when created, as the thread's current effect, and
//! again synchronously whenever something it read is written.
//!
//! # Implementation Notes
//!
//! Re-execution is eager and unbatched. A single write can cascade through a
//! chain of nested effect runs before control returns to the writer. Nothing
//! stops an effect that writes what it reads from recursing, unless the
//! thread opted into a depth limit through [`ReactiveContext::configure`].

mod cell;
mod context;
mod deps;
mod effect;
mod object;

pub use cell::{make_ref, Ref, VALUE_PROP};
pub use context::ReactiveContext;
pub use effect::{effect, Effect, EffectId};
pub use object::{reactive, Reactive, ReactiveObject};
