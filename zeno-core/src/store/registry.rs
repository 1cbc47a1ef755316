//! Store Registry
//!
//! The registry maps store names to store instances. A store is built the
//! first time its name is defined and handed back unchanged on every later
//! definition; the later setup functions and options are ignored.
//!
//! # Persistence
//!
//! When a store's [`PersistConfig`] is enabled, definition does two extra
//! things, in order:
//!
//! 1. **Hydration.** The payload stored under `key_prefix + name` is parsed
//!    and each key that names a field of the fresh state is restored into it.
//!    Unparseable payloads are logged and ignored.
//!
//! 2. **Sync.** An effect serializes the selected fields and writes them back
//!    under the same key. It runs once immediately, then again on every write
//!    to a field it read, synchronously on the writer's thread.
//!
//! Registries are explicit objects. Tests build a fresh one over a fresh
//! [`MemoryStorage`](super::MemoryStorage) instead of resetting global state.

use std::any::{type_name, Any};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::persist::{restore_fields, serialize_fields, PersistConfig, StoreState};
use super::storage::Storage;
use crate::config::StoreOptions;
use crate::error::{Result, StoreError};
use crate::reactive::Effect;

/// Prefix prepended to a store's name to form its storage key.
pub const DEFAULT_KEY_PREFIX: &str = "zeno-store-";

/// Accessor for a defined store.
///
/// Every call to [`UseStore::get`], and every clone of the accessor, yields
/// the same live state.
pub struct UseStore<S> {
    name: Arc<str>,
    state: Arc<S>,
    sync: Option<Effect>,
}

impl<S> UseStore<S> {
    /// The store's shared state.
    pub fn get(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effect that keeps durable storage in sync, when persistence is on.
    pub fn sync_effect(&self) -> Option<&Effect> {
        self.sync.as_ref()
    }

    /// Whether both accessors refer to the same store instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl<S> Clone for UseStore<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
            sync: self.sync.clone(),
        }
    }
}

impl<S> Deref for UseStore<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S> fmt::Debug for UseStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseStore")
            .field("name", &self.name)
            .field("persisted", &self.sync.is_some())
            .finish()
    }
}

/// Process-wide (or test-wide) cache of named stores.
pub struct StoreRegistry {
    storage: Arc<dyn Storage>,
    key_prefix: String,
    stores: Mutex<IndexMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl StoreRegistry {
    /// Create an empty registry persisting to `storage`.
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            stores: Mutex::new(IndexMap::new()),
        }
    }

    /// Use a different storage key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// The storage key a store named `name` persists under.
    pub fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.lock().contains_key(name)
    }

    /// Names of defined stores, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.stores.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stores.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.lock().is_empty()
    }

    /// Define a store, or fetch it if `name` is already defined.
    ///
    /// On first definition `setup` runs exactly once; the state is then
    /// hydrated and synced as `options.persist` dictates. On later calls
    /// `setup` and `options` are ignored.
    ///
    /// Fails only when `name` was first defined with a state type other
    /// than `S`.
    pub fn define_store<S, F>(
        &self,
        name: &str,
        setup: F,
        options: StoreOptions,
    ) -> Result<UseStore<S>>
    where
        S: StoreState,
        F: FnOnce() -> S,
    {
        if let Some(existing) = self.lookup::<S>(name)? {
            debug!(store = name, "reusing defined store");
            return Ok(existing);
        }

        // The lock is not held while setup runs: setup may define other
        // stores.
        let state = Arc::new(setup());
        let key = self.storage_key(name);

        let persist = options.persist;
        let sync = if persist.is_enabled() {
            self.hydrate(name, &key, state.as_ref());
            Some(self.sync_effect(name, key, Arc::clone(&state), persist))
        } else {
            None
        };

        let store = UseStore {
            name: Arc::from(name),
            state,
            sync,
        };

        let entry = Arc::clone(
            self.stores
                .lock()
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(store.clone()) as Arc<dyn Any + Send + Sync>),
        );
        debug!(store = name, persisted = store.sync.is_some(), "defined store");
        downcast(name, entry)
    }

    fn lookup<S: StoreState>(&self, name: &str) -> Result<Option<UseStore<S>>> {
        let entry = self.stores.lock().get(name).cloned();
        entry.map(|entry| downcast(name, entry)).transpose()
    }

    fn hydrate<S: StoreState>(&self, name: &str, key: &str, state: &S) {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return,
            Err(err) => {
                warn!(store = name, error = %err, "failed to read stored data; using defaults");
                return;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(stored)) => restore_fields(name, &state.fields(), stored),
            Ok(_) => debug!(store = name, "stored data is not an object; nothing to restore"),
            Err(err) => {
                warn!(store = name, error = %err, "failed to parse stored data; using defaults")
            }
        }
    }

    fn sync_effect<S: StoreState>(
        &self,
        name: &str,
        key: String,
        state: Arc<S>,
        persist: PersistConfig,
    ) -> Effect {
        let storage = Arc::clone(&self.storage);
        let name = name.to_owned();
        Effect::new(move || {
            let written = serialize_fields(&state.fields(), &persist)
                .map_err(StoreError::from)
                .and_then(|raw| storage.set(&key, &raw));
            if let Err(err) = written {
                error!(store = %name, error = %err, "failed to persist store state");
            }
        })
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("key_prefix", &self.key_prefix)
            .field("stores", &self.names())
            .finish()
    }
}

fn downcast<S: StoreState>(name: &str, entry: Arc<dyn Any + Send + Sync>) -> Result<UseStore<S>> {
    entry
        .downcast_ref::<UseStore<S>>()
        .cloned()
        .ok_or_else(|| StoreError::TypeMismatch {
            name: name.to_owned(),
            requested: type_name::<S>(),
        })
}
