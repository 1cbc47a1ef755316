//! Error types for zeno-core

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the store layer
///
/// Failures to parse previously persisted state are not among them: those
/// are logged and the store falls back to its setup defaults.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage backend failed to read or write a key
    #[error("storage error for key `{key}`: {source}")]
    Storage {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Store state could not be encoded
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A store name is already bound to a different state type
    #[error("store `{name}` is already registered with a different state type than `{requested}`")]
    TypeMismatch {
        name: String,
        requested: &'static str,
    },
}

impl StoreError {
    pub(crate) fn storage(key: &str, source: io::Error) -> Self {
        StoreError::Storage {
            key: key.to_owned(),
            source,
        }
    }
}

/// Reasons the renderer refuses to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("render target is missing")]
    MissingTarget,

    #[error("no render options were given")]
    NoOptions,
}
