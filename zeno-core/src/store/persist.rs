//! Persistence policy and field (de)serialization.
//!
//! A store's persisted payload is a flat JSON object mapping field name to
//! value. Reference cells contribute their held value; reactive objects
//! contribute their keys. Restoring replaces a cell's value and shallow-merges
//! into an object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::reactive::{ReactiveObject, Ref};

/// Which store fields are written to durable storage.
///
/// Deserializes from `true`, `false`, `{"pick": [...]}` or `{"omit": [...]}`.
/// When both lists are present, `pick` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPersist", into = "RawPersist")]
pub enum PersistConfig {
    /// Persist nothing.
    #[default]
    None,

    /// Persist every field.
    All,

    /// Persist only the listed fields.
    Pick(Vec<String>),

    /// Persist every field except the listed ones.
    Omit(Vec<String>),
}

impl PersistConfig {
    pub fn pick<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PersistConfig::Pick(fields.into_iter().map(Into::into).collect())
    }

    pub fn omit<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PersistConfig::Omit(fields.into_iter().map(Into::into).collect())
    }

    /// Whether the store hydrates from and syncs to storage at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, PersistConfig::None)
    }

    /// Whether `field` belongs in the persisted payload.
    pub fn should_persist(&self, field: &str) -> bool {
        match self {
            PersistConfig::None => false,
            PersistConfig::All => true,
            PersistConfig::Pick(fields) => fields.iter().any(|f| f == field),
            PersistConfig::Omit(fields) => !fields.iter().any(|f| f == field),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPersist {
    Flag(bool),
    Filter {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pick: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        omit: Option<Vec<String>>,
    },
}

impl From<RawPersist> for PersistConfig {
    fn from(raw: RawPersist) -> Self {
        match raw {
            RawPersist::Flag(true) => PersistConfig::All,
            RawPersist::Flag(false) => PersistConfig::None,
            RawPersist::Filter {
                pick: Some(pick), ..
            } => PersistConfig::Pick(pick),
            RawPersist::Filter {
                omit: Some(omit), ..
            } => PersistConfig::Omit(omit),
            // An empty filter object still enables persistence, with nothing
            // selected.
            RawPersist::Filter { .. } => PersistConfig::Pick(Vec::new()),
        }
    }
}

impl From<PersistConfig> for RawPersist {
    fn from(config: PersistConfig) -> Self {
        match config {
            PersistConfig::None => RawPersist::Flag(false),
            PersistConfig::All => RawPersist::Flag(true),
            PersistConfig::Pick(pick) => RawPersist::Filter {
                pick: Some(pick),
                omit: None,
            },
            PersistConfig::Omit(omit) => RawPersist::Filter {
                pick: None,
                omit: Some(omit),
            },
        }
    }
}

/// A store field that can be written to and restored from JSON.
pub trait PersistField: Send + Sync {
    /// Current value as JSON. Reads are tracked.
    fn snapshot(&self) -> serde_json::Result<Value>;

    /// Load a previously persisted value.
    fn restore(&self, stored: Value) -> serde_json::Result<()>;
}

impl<T> PersistField for Ref<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn snapshot(&self) -> serde_json::Result<Value> {
        self.with(|value| serde_json::to_value(value))
    }

    fn restore(&self, stored: Value) -> serde_json::Result<()> {
        let value = serde_json::from_value(stored)?;
        self.set(value);
        Ok(())
    }
}

impl PersistField for ReactiveObject {
    fn snapshot(&self) -> serde_json::Result<Value> {
        Ok(self.to_value())
    }

    fn restore(&self, stored: Value) -> serde_json::Result<()> {
        // Merging a non-object is a no-op.
        if let Value::Object(fields) = stored {
            self.assign(fields);
        }
        Ok(())
    }
}

/// State produced by a store's setup function.
///
/// `fields` lists the data fields in declaration order under the names they
/// are persisted as. Operations are ordinary methods and never persisted.
pub trait StoreState: Send + Sync + 'static {
    fn fields(&self) -> Vec<(&'static str, &dyn PersistField)>;
}

/// Encode the fields selected by `config` as a flat JSON object.
pub fn serialize_fields(
    fields: &[(&'static str, &dyn PersistField)],
    config: &PersistConfig,
) -> serde_json::Result<String> {
    let mut data = Map::new();
    for (name, field) in fields {
        if config.should_persist(name) {
            data.insert((*name).to_owned(), field.snapshot()?);
        }
    }
    serde_json::to_string(&Value::Object(data))
}

/// Restore every stored key that names one of `fields`.
///
/// Unknown keys are ignored. A value that does not fit its field is logged
/// and skipped.
pub fn restore_fields(
    store: &str,
    fields: &[(&'static str, &dyn PersistField)],
    stored: Map<String, Value>,
) {
    for (key, value) in stored {
        let Some((name, field)) = fields.iter().find(|(name, _)| *name == key) else {
            continue;
        };
        if let Err(err) = field.restore(value) {
            warn!(
                store,
                field = *name,
                error = %err,
                "ignoring persisted value that does not fit field"
            );
        }
    }
}
