//! Runtime configuration.
//!
//! Both types deserialize from JSON (or any serde format) and have defaults
//! that reproduce the framework's reference behavior.

use serde::{Deserialize, Serialize};

use crate::store::PersistConfig;

/// What happens to the current-effect register when a nested effect run
/// finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingPolicy {
    /// Leave no effect current. Reads made by the outer effect after the
    /// nested run are untracked.
    #[default]
    Clear,

    /// Put the outer effect back.
    Restore,
}

/// Per-thread settings for the reactive core.
///
/// # Example
///
/// ```
/// use zeno_core::config::{NestingPolicy, ReactiveConfig};
///
/// let config: ReactiveConfig =
///     serde_json::from_str(r#"{ "nesting": "restore", "max_trigger_depth": 64 }"#).unwrap();
/// assert_eq!(config.nesting, NestingPolicy::Restore);
/// assert_eq!(config.max_trigger_depth, Some(64));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    pub nesting: NestingPolicy,

    /// Maximum number of nested triggered re-runs. `None` leaves recursion
    /// unguarded.
    pub max_trigger_depth: Option<usize>,
}

/// Options accepted by [`StoreRegistry::define_store`](crate::store::StoreRegistry::define_store).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub persist: PersistConfig,
}

impl StoreOptions {
    /// Options with the given persistence policy.
    pub fn persist(persist: PersistConfig) -> Self {
        Self { persist }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = ReactiveConfig::default();
        assert_eq!(config.nesting, NestingPolicy::Clear);
        assert_eq!(config.max_trigger_depth, None);
        assert_eq!(StoreOptions::default().persist, PersistConfig::None);
    }

    #[test]
    fn store_options_deserialize() {
        let options: StoreOptions = serde_json::from_str(r#"{ "persist": true }"#).unwrap();
        assert_eq!(options.persist, PersistConfig::All);

        let options: StoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.persist, PersistConfig::None);

        let options: StoreOptions =
            serde_json::from_str(r#"{ "persist": { "omit": ["draft"] } }"#).unwrap();
        assert_eq!(options.persist, PersistConfig::Omit(vec!["draft".into()]));
    }
}
