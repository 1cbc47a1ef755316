//! Per-object dependency map.
//!
//! Maps a property name to the set of effects that read it during a tracked
//! run. Each trackable object owns exactly one map.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::effect::{Effect, EffectId};

#[derive(Default)]
pub(crate) struct DependencyMap {
    props: Mutex<HashMap<String, IndexMap<EffectId, Effect>>>,
}

impl DependencyMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the current effect, if any, as depending on `prop`.
    pub(crate) fn track(&self, prop: &str) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };

        self.props
            .lock()
            .entry(prop.to_owned())
            .or_default()
            .insert(effect.id(), effect);
    }

    /// Invoke every effect that depends on `prop`, in registration order.
    ///
    /// The set is snapshotted first so effects are free to read and write
    /// this object again.
    pub(crate) fn trigger(&self, prop: &str) {
        let effects: Vec<Effect> = {
            let props = self.props.lock();
            match props.get(prop) {
                Some(deps) => deps.values().cloned().collect(),
                None => return,
            }
        };

        for effect in effects {
            effect.notify();
        }
    }

    pub(crate) fn dependent_count(&self, prop: &str) -> usize {
        self.props.lock().get(prop).map_or(0, IndexMap::len)
    }
}
