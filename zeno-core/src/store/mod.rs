//! Stores
//!
//! A store is a named, long-lived bundle of reactive state plus the
//! operations over it. Stores are defined through a [`StoreRegistry`], which
//! builds each one once, optionally restores it from durable [`Storage`],
//! and keeps that storage up to date as the state changes.

mod persist;
mod registry;
mod storage;

pub use persist::{restore_fields, serialize_fields, PersistConfig, PersistField, StoreState};
pub use registry::{StoreRegistry, UseStore, DEFAULT_KEY_PREFIX};
pub use storage::{FileStorage, MemoryStorage, Storage};
