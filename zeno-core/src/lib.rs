//! Zeno Core
//!
//! This crate provides the core runtime for the Zeno UI micro-framework.
//! It implements:
//!
//! - Fine-grained reactivity (trackable objects, reference cells, effects)
//! - Named singleton stores with optional durable persistence
//! - The conditional renderer's branch-selection policy
//! - The application's video catalog store
//!
//! # Architecture
//!
//! - `reactive`: dependency tracking and synchronous effect re-execution
//! - `store`: the store registry, persistence policy and storage backends
//! - `render`: choosing which markup branch to render into a target
//! - `stores`: domain stores built on the registry
//! - `config`, `error`: runtime configuration and error types
//!
//! # Example
//!
//! ```rust
//! use zeno_core::reactive::{make_ref, Effect};
//!
//! let count = make_ref(0);
//!
//! let reader = count.clone();
//! let effect = Effect::new(move || {
//!     println!("Count: {}", reader.get());
//! });
//!
//! // Runs the effect again, synchronously.
//! count.set(5);
//! assert_eq!(effect.run_count(), 2);
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod render;
pub mod store;
pub mod stores;

pub use config::{NestingPolicy, ReactiveConfig, StoreOptions};
pub use error::{RenderError, Result, StoreError};
pub use reactive::{
    effect, make_ref, reactive, Effect, Reactive, ReactiveContext, ReactiveObject, Ref,
};
pub use store::{MemoryStorage, PersistConfig, Storage, StoreRegistry, StoreState, UseStore};
